//! # View Responses
//!
//! Pages are rendered as a JSON envelope naming the view and carrying its
//! model, plus an optional one-shot flash message and field errors. Redirects
//! are `303 See Other` with a `Location` header and the flash in the body.

use axum::{
    Json,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::workflow::{FieldErrors, Page, Redirect, SubmitOutcome};

/// Rendered page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageEnvelope<M> {
    /// Name of the view template
    #[schema(example = "maintenance_requests/index")]
    pub view: String,
    /// View model
    pub model: M,
    /// One-shot notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
    /// Field errors keyed by input name
    #[serde(skip_serializing_if = "FieldErrors::is_empty", default)]
    pub errors: FieldErrors,
    /// Token to echo back when submitting this page's form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_forgery_token: Option<String>,
}

/// Page response with its HTTP status
pub struct PageResponse<M> {
    status: StatusCode,
    envelope: PageEnvelope<M>,
}

impl<M> PageResponse<M> {
    /// 200 response for a page
    pub fn ok(page: Page<M>) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: PageEnvelope {
                view: page.view.to_string(),
                model: page.model,
                flash: page.flash,
                errors: page.errors,
                anti_forgery_token: None,
            },
        }
    }

    /// Redisplayed form: 422 when it carries errors
    pub fn redisplay(page: Page<M>) -> Self {
        let status = if page.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        Self {
            status,
            ..Self::ok(page)
        }
    }

    /// Attach the token a form page must echo back
    pub fn with_token(mut self, token: String) -> Self {
        self.envelope.anti_forgery_token = Some(token);
        self
    }
}

impl<M: Serialize> IntoResponse for PageResponse<M> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let location = self.location.clone();
        (StatusCode::SEE_OTHER, [(LOCATION, location)], Json(self)).into_response()
    }
}

/// Maps a form submission outcome; redisplayed forms carry a fresh token
pub fn submit_response<F: Serialize>(outcome: SubmitOutcome<F>, token: String) -> Response {
    match outcome {
        SubmitOutcome::Redirect(redirect) => redirect.into_response(),
        SubmitOutcome::Redisplay(page) => PageResponse::redisplay(page)
            .with_token(token)
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn page_envelope_omits_empty_parts() {
        let response = PageResponse::ok(Page::new("home/index", json!({ "a": 1 }))).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "view": "home/index", "model": { "a": 1 } })
        );
    }

    #[tokio::test]
    async fn redisplay_with_errors_is_unprocessable() {
        let mut errors = FieldErrors::new();
        errors.add("subject", "This field is required");
        let page = Page::new("x/create", json!({})).with_errors(errors);

        let response = submit_response(SubmitOutcome::Redisplay(page), "tok".to_string());

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["subject"][0], "This field is required");
        assert_eq!(body["anti_forgery_token"], "tok");
    }

    #[tokio::test]
    async fn redirect_is_see_other_with_location_and_flash() {
        let response = Redirect::to("/somewhere").with_flash("Done").into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/somewhere");
        assert_eq!(
            body_json(response).await,
            json!({ "location": "/somewhere", "flash": "Done" })
        );
    }
}
