//! Maintenance request entity model
//!
//! This module contains the SeaORM entity model for the maintenance_requests
//! table. A request is open while `completed_date` is null and closed once it
//! is set.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Maintenance request filed against an asset
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_requests")]
pub struct Model {
    /// Unique identifier for the request (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Timestamp when the request was filed
    pub created_date: DateTimeWithTimeZone,

    /// Timestamp when the request was closed (null while open)
    pub completed_date: Option<DateTimeWithTimeZone>,

    /// Short summary of the problem
    pub subject: String,

    /// Description of the problem as reported
    pub request_detail: String,

    /// Progress notes from staff
    pub status_detail: Option<String>,

    /// Description of the fix applied
    pub fix_detail: Option<String>,

    /// Labour spent on the request
    pub hours_spent: Option<f64>,

    /// Asset the request is filed against
    pub asset_id: Uuid,

    /// Tenant occupying the asset when the request was filed, if any
    pub tenant_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Returns true once a completion date has been recorded
    pub fn is_closed(&self) -> bool {
        self.completed_date.is_some()
    }
}
