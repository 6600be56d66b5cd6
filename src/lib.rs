//! # Rental Management Library
//!
//! Maintenance request workflow for rental properties: role-gated listing,
//! filing, editing, closing and deleting of requests over assets, tenants,
//! occupancies and appliances, served as JSON view models over HTTP.

pub mod antiforgery;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod roles;
pub mod server;
pub mod telemetry;
pub mod workflow;
pub use migration;
