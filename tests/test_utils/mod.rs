//! Test utilities for database and HTTP testing.
//!
//! Sets up in-memory SQLite databases with migrations applied, inserts
//! fixture rows, and builds authenticated requests against the router.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use rental_management::{
    antiforgery::{ANTIFORGERY_FIELD, AntiforgeryKey},
    auth::{USER_ID_HEADER, USER_ROLES_HEADER},
    config::AppConfig,
    models::{appliance, asset, maintenance_request, occupancy, tenant},
    server::{AppState, create_app},
};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::Value;
use uuid::Uuid;

pub const GATEWAY_TOKEN: &str = "test-gateway-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        gateway_tokens: vec![GATEWAY_TOKEN.to_string()],
        antiforgery_secret: Some(vec![9u8; 32]),
        ..Default::default()
    }
}

/// Router plus the handles tests need to inspect state
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub antiforgery: AntiforgeryKey,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let config = test_config();
        let db = setup_test_db().await?;
        let antiforgery = AntiforgeryKey::from_config(&config)?;
        let router = create_app(AppState {
            config: Arc::new(config),
            db: db.clone(),
            antiforgery: antiforgery.clone(),
        });
        Ok(Self {
            router,
            db,
            antiforgery,
        })
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Form-encoded POST carrying a valid anti-forgery token for `user`
    pub fn form_post(&self, uri: &str, user: &TestUser, fields: &[(&str, &str)]) -> Request<Body> {
        let token = self.antiforgery.issue(user.user_id);
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in fields {
            serializer.append_pair(name, value);
        }
        serializer.append_pair(ANTIFORGERY_FIELD, &token);

        user.request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serializer.finish()))
            .unwrap()
    }
}

/// Signed-in user as forwarded by the front end
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: Uuid,
    pub roles: String,
}

impl TestUser {
    pub fn new(roles: &str) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            roles: roles.to_string(),
        }
    }

    pub fn with_id(user_id: Uuid, roles: &str) -> Self {
        Self {
            user_id,
            roles: roles.to_string(),
        }
    }

    pub fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", GATEWAY_TOKEN))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .header(USER_ROLES_HEADER, &self.roles)
    }

    pub fn get(&self, uri: &str) -> Request<Body> {
        self.request("GET", uri).body(Body::empty()).unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn create_asset(db: &DatabaseConnection, name: &str) -> Result<asset::Model> {
    Ok(asset::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await?)
}

/// Creates a tenant profile linked to `user_id`
pub async fn create_tenant(
    db: &DatabaseConnection,
    user_id: Uuid,
    name: &str,
) -> Result<tenant::Model> {
    Ok(tenant::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await?)
}

pub async fn create_occupancy(
    db: &DatabaseConnection,
    asset_id: Uuid,
    tenant_id: Uuid,
) -> Result<occupancy::Model> {
    Ok(occupancy::ActiveModel {
        id: Set(Uuid::new_v4()),
        asset_id: Set(asset_id),
        tenant_id: Set(tenant_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?)
}

pub async fn create_appliance(
    db: &DatabaseConnection,
    asset_id: Uuid,
    name: &str,
) -> Result<appliance::Model> {
    Ok(appliance::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        asset_id: Set(asset_id),
    }
    .insert(db)
    .await?)
}

/// Inserts an open request filed `days_ago` days in the past
pub async fn create_request(
    db: &DatabaseConnection,
    asset_id: Uuid,
    subject: &str,
    days_ago: i64,
) -> Result<maintenance_request::Model> {
    Ok(maintenance_request::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_date: Set((Utc::now() - Duration::days(days_ago)).into()),
        completed_date: Set(None),
        subject: Set(subject.to_string()),
        request_detail: Set("Reported by phone".to_string()),
        status_detail: Set(None),
        fix_detail: Set(None),
        hours_spent: Set(None),
        asset_id: Set(asset_id),
        tenant_id: Set(None),
    }
    .insert(db)
    .await?)
}
