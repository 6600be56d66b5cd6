//! # Anti-forgery Tokens
//!
//! Every state-changing form post must echo a token that was handed out on
//! the matching form page. The token is an HMAC-SHA256 of the caller's user
//! id under a server secret, so it cannot be minted by a third-party site and
//! needs no server-side storage. Comparison is constant-time.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::auth::Caller;
use crate::config::{AppConfig, MIN_ANTIFORGERY_SECRET_LEN};
use crate::error::{ApiError, unauthorized};

type HmacSha256 = Hmac<Sha256>;

/// Header a client may use to send the token
pub const ANTIFORGERY_HEADER: &str = "X-CSRF-Token";

/// Form field a browser form uses to send the token
pub const ANTIFORGERY_FIELD: &str = "__RequestVerificationToken";

/// Upper bound on form bodies buffered for token extraction
const MAX_FORM_BODY_BYTES: usize = 64 * 1024;

/// Errors from anti-forgery token handling
#[derive(Debug, Error)]
pub enum AntiforgeryError {
    #[error("anti-forgery secret is not configured")]
    NotConfigured,
    #[error("anti-forgery secret must be at least {MIN_ANTIFORGERY_SECRET_LEN} bytes, got {length}")]
    SecretTooShort { length: usize },
    #[error("anti-forgery token is missing")]
    MissingToken,
    #[error("anti-forgery token is invalid")]
    InvalidToken,
}

impl From<AntiforgeryError> for ApiError {
    fn from(error: AntiforgeryError) -> Self {
        match error {
            AntiforgeryError::NotConfigured | AntiforgeryError::SecretTooShort { .. } => {
                tracing::error!(%error, "Anti-forgery key unavailable");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An internal error occurred",
                )
            }
            AntiforgeryError::MissingToken | AntiforgeryError::InvalidToken => ApiError::new(
                StatusCode::BAD_REQUEST,
                "ANTIFORGERY_FAILED",
                error.to_string().as_str(),
            ),
        }
    }
}

/// Secret key for deriving anti-forgery tokens, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SecretBytes(Vec<u8>);

/// Shared handle to the anti-forgery signing key
#[derive(Clone)]
pub struct AntiforgeryKey {
    secret: Arc<SecretBytes>,
}

impl std::fmt::Debug for AntiforgeryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AntiforgeryKey").finish_non_exhaustive()
    }
}

impl AntiforgeryKey {
    /// Create a key from raw secret bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, AntiforgeryError> {
        if bytes.len() < MIN_ANTIFORGERY_SECRET_LEN {
            return Err(AntiforgeryError::SecretTooShort {
                length: bytes.len(),
            });
        }
        Ok(Self {
            secret: Arc::new(SecretBytes(bytes)),
        })
    }

    /// Create a key from the configured secret
    pub fn from_config(config: &AppConfig) -> Result<Self, AntiforgeryError> {
        let bytes = config
            .antiforgery_secret
            .clone()
            .ok_or(AntiforgeryError::NotConfigured)?;
        Self::new(bytes)
    }

    fn mac_for(&self, user_id: Uuid) -> HmacSha256 {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.secret.0)
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any length"));
        mac.update(b"antiforgery|");
        mac.update(user_id.as_bytes());
        mac
    }

    /// Issue the token for a user
    pub fn issue(&self, user_id: Uuid) -> String {
        hex::encode(self.mac_for(user_id).finalize().into_bytes())
    }

    /// Verify a token presented by a user
    pub fn verify(&self, user_id: Uuid, provided: &str) -> Result<(), AntiforgeryError> {
        let provided_bytes =
            hex::decode(provided.trim()).map_err(|_| AntiforgeryError::InvalidToken)?;

        // verify_slice compares in constant time
        self.mac_for(user_id)
            .verify_slice(&provided_bytes)
            .map_err(|_| AntiforgeryError::InvalidToken)
    }
}

/// Middleware enforcing anti-forgery tokens on POST requests.
///
/// Must run after [`crate::auth::auth_middleware`] so the caller is known.
/// The token is read from the `X-CSRF-Token` header, or from the
/// `__RequestVerificationToken` field of a form-encoded body.
pub async fn antiforgery_middleware(
    State(key): State<AntiforgeryKey>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() != Method::POST {
        return Ok(next.run(request).await);
    }

    let caller = request
        .extensions()
        .get::<Caller>()
        .copied()
        .ok_or_else(|| unauthorized(Some("Caller authentication required")))?;

    let header_token = request
        .headers()
        .get(ANTIFORGERY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let (request, token) = match header_token {
        Some(token) => (request, Some(token)),
        None if is_form_encoded(&request) => {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, MAX_FORM_BODY_BYTES)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Failed to buffer form body");
                    ApiError::new(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "PAYLOAD_TOO_LARGE",
                        "Form body too large",
                    )
                })?;
            let token = url::form_urlencoded::parse(&bytes)
                .find(|(name, _)| name == ANTIFORGERY_FIELD)
                .map(|(_, value)| value.into_owned());
            (Request::from_parts(parts, Body::from(bytes)), token)
        }
        None => (request, None),
    };

    let token = token.ok_or(AntiforgeryError::MissingToken).inspect_err(|_| {
        tracing::warn!(user_id = %caller.user_id, "Form post without anti-forgery token");
    })?;
    key.verify(caller.user_id, &token).inspect_err(|_| {
        tracing::warn!(user_id = %caller.user_id, "Form post with invalid anti-forgery token");
    })?;

    Ok(next.run(request).await)
}

fn is_form_encoded(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}
