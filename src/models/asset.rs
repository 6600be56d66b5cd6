//! Asset entity model
//!
//! This module contains the SeaORM entity model for the assets table.
//! An asset is a rentable unit that can receive maintenance requests.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

/// Asset entity representing a rentable unit
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    /// Unique identifier for the asset (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name of the asset
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::appliance::Entity")]
    Appliance,
    #[sea_orm(has_many = "super::occupancy::Entity")]
    Occupancy,
    #[sea_orm(has_many = "super::maintenance_request::Entity")]
    MaintenanceRequest,
}

impl Related<super::appliance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appliance.def()
    }
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
