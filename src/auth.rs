//! # Authentication and Authorization
//!
//! The identity provider sits in front of this service. The front end
//! authenticates itself with a bearer token and forwards the signed-in user's
//! account id and role names as headers. This module validates both and
//! exposes the resulting [`Caller`] to handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, forbidden, unauthorized, validation_error};
use crate::roles::{Action, Role};
use crate::server::AppState;

/// Header carrying the signed-in user's account id
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the signed-in user's role names, comma-separated
pub const USER_ROLES_HEADER: &str = "X-User-Roles";

/// Authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// User account id from the identity provider
    pub user_id: Uuid,
    /// Most privileged recognized role held by the user
    pub role: Role,
}

impl Caller {
    /// Fails with 403 unless the caller's role allows `action`
    pub fn require(&self, action: Action) -> Result<(), ApiError> {
        if self.role.allows(action) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                role = %self.role,
                ?action,
                "Caller lacks capability"
            );
            Err(forbidden(Some("Your role does not permit this action")))
        }
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Authentication middleware that validates the gateway token and identity headers
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let token = extract_bearer_token(headers)?;
    validate_token(&config, token)?;

    let user_id = extract_user_id(headers)?;
    let role = extract_role(headers)?;
    tracing::debug!(user_id = %user_id, role = %role, "Authenticated caller");

    let mut request = request;
    request.extensions_mut().insert(Caller { user_id, role });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .gateway_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let header_value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ USER_ID_HEADER: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid user header",
                serde_json::json!({ USER_ID_HEADER: "Header must be valid UTF-8" }),
            )
        })?;

    header_value.trim().parse::<Uuid>().map_err(|_| {
        validation_error(
            "Invalid user ID",
            serde_json::json!({ USER_ID_HEADER: "Must be a valid UUID" }),
        )
    })
}

fn extract_role(headers: &HeaderMap) -> Result<Role, ApiError> {
    let names = headers
        .get(USER_ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    Role::highest(names.split(',')).ok_or_else(|| {
        tracing::warn!(roles = %names, "Caller holds no recognized role");
        forbidden(Some("Caller holds no recognized role"))
    })
}

/// OpenAPI header parameters forwarded by the front end
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct IdentityHeaders {
    /// User account id (UUID) of the signed-in user
    #[serde(rename = "X-User-Id")]
    #[param(rename = "X-User-Id", value_type = String)]
    pub user_id: String,
    /// Comma-separated role names (Admin, Manager, Staff, Tenant)
    #[serde(rename = "X-User-Roles")]
    #[param(rename = "X-User-Roles", value_type = String)]
    pub roles: String,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Caller authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn create_test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            gateway_tokens: vec!["test-token-123".to_string()],
            ..Default::default()
        })
    }

    async fn run_middleware(config: Arc<AppConfig>, request: Request<Body>) -> Response {
        async fn handler(caller: Caller) -> String {
            caller.role.to_string()
        }

        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn_with_state(
                Arc::clone(&config),
                auth_middleware,
            ))
            .oneshot(request)
            .await
            .unwrap()
    }

    fn authed(roles: &str) -> axum::http::request::Builder {
        Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer test-token-123")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLES_HEADER, roles)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLES_HEADER, "Tenant")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dGVzdDoxMjM=")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLES_HEADER, "Tenant")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer wrong-token")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLES_HEADER, "Tenant")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_user_header_returns_400() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer test-token-123")
            .header(USER_ROLES_HEADER, "Tenant")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_user_uuid_returns_400() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer test-token-123")
            .header(USER_ID_HEADER, "not-a-uuid")
            .header(USER_ROLES_HEADER, "Tenant")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unrecognized_role_returns_403() {
        let request = authed("Guest,Visitor").body(Body::empty()).unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_roles_header_returns_403() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer test-token-123")
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_request_passes_through_with_highest_role() {
        let request = authed("Tenant, Manager").body(Body::empty()).unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Manager");
    }

    #[tokio::test]
    async fn multiple_tokens_supported() {
        let config = Arc::new(AppConfig {
            gateway_tokens: vec![
                "token-one".to_string(),
                "token-two".to_string(),
                "token-three".to_string(),
            ],
            ..Default::default()
        });

        for candidate in ["token-one", "token-two", "token-three"] {
            let request = Request::builder()
                .uri("/test")
                .header("Authorization", format!("Bearer {}", candidate))
                .header(USER_ID_HEADER, Uuid::new_v4().to_string())
                .header(USER_ROLES_HEADER, "Staff")
                .body(Body::empty())
                .unwrap();

            let response = run_middleware(Arc::clone(&config), request).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn require_checks_capability_table() {
        let tenant = Caller {
            user_id: Uuid::new_v4(),
            role: Role::Tenant,
        };
        let staff = Caller {
            user_id: Uuid::new_v4(),
            role: Role::Staff,
        };

        assert!(tenant.require(Action::ViewOrderDetails).is_ok());
        let err = staff.require(Action::ViewOrderDetails).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
