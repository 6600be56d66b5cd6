//! # Order Details Handler

use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Caller, IdentityHeaders};
use crate::error::ApiError;
use crate::handlers::views::{PageEnvelope, PageResponse};
use crate::roles::Action;
use crate::workflow::Page;

pub const ORDER_DETAILS_VIEW: &str = "order_details/index";

/// Model of the order details page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailsModel {
    #[schema(example = "Order Details Page.")]
    pub message: String,
}

/// Tenant-only order details page
#[utoipa::path(
    get,
    path = "/order-details",
    params(IdentityHeaders),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order details page", body = PageEnvelope<OrderDetailsModel>),
        (status = 403, description = "Caller is not a tenant", body = ApiError)
    ),
    tag = "order-details"
)]
pub async fn order_details(caller: Caller) -> Result<Response, ApiError> {
    caller.require(Action::ViewOrderDetails)?;

    let page = Page::new(
        ORDER_DETAILS_VIEW,
        OrderDetailsModel {
            message: "Order Details Page.".to_string(),
        },
    );
    Ok(PageResponse::ok(page).into_response())
}
