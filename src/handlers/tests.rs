//! # Tests for Handlers
//!
//! This module contains unit tests for API handlers.

use std::sync::Arc;

use crate::antiforgery::AntiforgeryKey;
use crate::config::AppConfig;
use crate::handlers::{healthz, root};
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};

async fn state() -> AppState {
    AppState {
        config: Arc::new(AppConfig::default()),
        db: crate::repositories::test_support::setup_db().await,
        antiforgery: AntiforgeryKey::new(vec![7u8; 32]).unwrap(),
    }
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "rental-management");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_service_info_default() {
    let default_info = ServiceInfo::default();
    let Json(handler_info) = root().await;

    assert_eq!(default_info.service, handler_info.service);
    assert_eq!(default_info.version, handler_info.version);
}

#[tokio::test]
async fn test_healthz_reports_database_up() {
    let Json(health) = healthz(State(state().await)).await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.database, "up");
}

#[tokio::test]
async fn test_healthz_reports_unreachable_database() {
    let state = AppState {
        db: sea_orm::DatabaseConnection::default(),
        ..state().await
    };

    let err = healthz(State(state)).await.unwrap_err();
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
}
