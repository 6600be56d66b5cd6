//! Tenant entity model
//!
//! This module contains the SeaORM entity model for the tenants table.
//! Every tenant is bound to exactly one user account from the identity
//! provider through `user_id`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

/// Tenant entity representing a renter with a user account
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// User account identity issued by the identity provider (unique)
    #[sea_orm(unique)]
    pub user_id: Uuid,

    /// Display name for the tenant
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::occupancy::Entity")]
    Occupancy,
    #[sea_orm(has_many = "super::maintenance_request::Entity")]
    MaintenanceRequest,
}

impl Related<super::occupancy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Occupancy.def()
    }
}

impl Related<super::maintenance_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
