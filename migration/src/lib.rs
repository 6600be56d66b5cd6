//! Database migrations for the Rental Management service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_10_01_000001_create_assets;
mod m2026_10_01_000002_create_tenants;
mod m2026_10_01_000003_create_occupancies;
mod m2026_10_01_000004_create_appliances;
mod m2026_10_01_000005_create_maintenance_requests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_01_000001_create_assets::Migration),
            Box::new(m2026_10_01_000002_create_tenants::Migration),
            Box::new(m2026_10_01_000003_create_occupancies::Migration),
            Box::new(m2026_10_01_000004_create_appliances::Migration),
            Box::new(m2026_10_01_000005_create_maintenance_requests::Migration),
        ]
    }
}
