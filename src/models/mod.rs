//! # Data Models
//!
//! This module contains all the data models used throughout the Rental
//! Management service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod appliance;
pub mod asset;
pub mod maintenance_request;
pub mod occupancy;
pub mod tenant;

pub use appliance::Entity as Appliance;
pub use asset::Entity as Asset;
pub use maintenance_request::Entity as MaintenanceRequest;
pub use occupancy::Entity as Occupancy;
pub use tenant::Entity as Tenant;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "rental-management".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
