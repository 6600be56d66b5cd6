//! # Repository Layer
//!
//! Typed data access over the SeaORM entities. Every repository borrows a
//! connection generic over [`sea_orm::ConnectionTrait`], so the same code runs
//! against the pool or inside a request's transaction.

pub mod appliance;
pub mod asset;
pub mod maintenance_request;
pub mod occupancy;
pub mod tenant;

pub use appliance::ApplianceRepository;
pub use asset::AssetRepository;
pub use maintenance_request::{AssetRequestCount, MaintenanceRequestRepository, NewMaintenanceRequest};
pub use occupancy::OccupancyRepository;
pub use tenant::TenantRepository;
