//! # Maintenance Request Handlers
//!
//! Each handler checks the caller's capability, runs the workflow inside one
//! transaction and maps the outcome to a page or a redirect. The transaction
//! is committed only once the workflow reports success; any early return drops
//! it and rolls back.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{Caller, IdentityHeaders};
use crate::db::begin_unit_of_work;
use crate::error::{ApiError, bad_request};
use crate::handlers::views::{PageEnvelope, PageResponse, submit_response};
use crate::roles::Action;
use crate::server::AppState;
use crate::workflow::Redirect;
use crate::workflow::maintenance::{
    CreateFormModel, CreateRequestForm, EditRequestForm, IndexModel, MaintenanceRequestWorkflow,
    RequestView,
};

fn parse_request_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse::<Uuid>()
        .map_err(|_| bad_request("Maintenance request id must be a valid UUID"))
}

/// List all maintenance requests with the per-asset tally
#[utoipa::path(
    get,
    path = "/maintenance-requests",
    params(IdentityHeaders),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Index page", body = PageEnvelope<IndexModel>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "No recognized role", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "maintenance-requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Response, ApiError> {
    caller.require(Action::ListRequests)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let page = MaintenanceRequestWorkflow::new(&txn, caller).list().await?;
    txn.commit().await?;

    Ok(PageResponse::ok(page).into_response())
}

/// Show one maintenance request
#[utoipa::path(
    get,
    path = "/maintenance-requests/{id}",
    params(
        ("id" = String, Path, description = "Maintenance request id (UUID)"),
        IdentityHeaders
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Details page", body = PageEnvelope<RequestView>),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "No such request", body = ApiError)
    ),
    tag = "maintenance-requests"
)]
pub async fn request_details(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    caller.require(Action::ViewRequest)?;
    let id = parse_request_id(&id)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let page = MaintenanceRequestWorkflow::new(&txn, caller)
        .details(id)
        .await?;
    txn.commit().await?;

    Ok(PageResponse::ok(page).into_response())
}

/// Show the create form
#[utoipa::path(
    get,
    path = "/maintenance-requests/create",
    params(IdentityHeaders),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Create page; tenants without occupancy get an `occupancy` error", body = PageEnvelope<CreateFormModel>),
        (status = 403, description = "No recognized role", body = ApiError)
    ),
    tag = "maintenance-requests"
)]
pub async fn create_form(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Response, ApiError> {
    caller.require(Action::CreateRequest)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let page = MaintenanceRequestWorkflow::new(&txn, caller)
        .create_form()
        .await?;
    txn.commit().await?;

    Ok(PageResponse::ok(page)
        .with_token(state.antiforgery.issue(caller.user_id))
        .into_response())
}

/// File a new maintenance request
#[utoipa::path(
    post,
    path = "/maintenance-requests/create",
    params(IdentityHeaders),
    security(("bearer_auth" = [])),
    request_body(content = CreateRequestForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Filed; continue at the list", body = Redirect),
        (status = 400, description = "Anti-forgery token missing or invalid", body = ApiError),
        (status = 422, description = "Invalid submission, redisplayed", body = PageEnvelope<CreateFormModel>)
    ),
    tag = "maintenance-requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    caller: Caller,
    Form(form): Form<CreateRequestForm>,
) -> Result<Response, ApiError> {
    caller.require(Action::CreateRequest)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let outcome = MaintenanceRequestWorkflow::new(&txn, caller)
        .create(form)
        .await?;
    if outcome.is_redirect() {
        txn.commit().await?;
    }

    Ok(submit_response(
        outcome,
        state.antiforgery.issue(caller.user_id),
    ))
}

/// Show the edit form
#[utoipa::path(
    get,
    path = "/maintenance-requests/{id}/edit",
    params(
        ("id" = String, Path, description = "Maintenance request id (UUID)"),
        IdentityHeaders
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Edit page", body = PageEnvelope<RequestView>),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "No such request", body = ApiError)
    ),
    tag = "maintenance-requests"
)]
pub async fn edit_form(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    caller.require(Action::EditRequest)?;
    let id = parse_request_id(&id)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let page = MaintenanceRequestWorkflow::new(&txn, caller)
        .edit_form(id)
        .await?;
    txn.commit().await?;

    Ok(PageResponse::ok(page)
        .with_token(state.antiforgery.issue(caller.user_id))
        .into_response())
}

/// Save or close a maintenance request
#[utoipa::path(
    post,
    path = "/maintenance-requests/{id}/edit",
    params(
        ("id" = String, Path, description = "Maintenance request id (UUID)"),
        IdentityHeaders
    ),
    security(("bearer_auth" = [])),
    request_body(content = EditRequestForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Saved (back to edit), closed (to list) or completion date required (back to edit)", body = Redirect),
        (status = 200, description = "No submit intent, redisplayed", body = PageEnvelope<EditRequestForm>),
        (status = 400, description = "Invalid id, id mismatch or anti-forgery failure", body = ApiError),
        (status = 404, description = "No such request", body = ApiError),
        (status = 422, description = "Invalid submission, redisplayed", body = PageEnvelope<EditRequestForm>)
    ),
    tag = "maintenance-requests"
)]
pub async fn edit_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Form(form): Form<EditRequestForm>,
) -> Result<Response, ApiError> {
    caller.require(Action::EditRequest)?;
    let id = parse_request_id(&id)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let outcome = MaintenanceRequestWorkflow::new(&txn, caller)
        .edit(id, form)
        .await?;
    if outcome.is_redirect() {
        txn.commit().await?;
    }

    Ok(submit_response(
        outcome,
        state.antiforgery.issue(caller.user_id),
    ))
}

/// Show the delete confirmation
#[utoipa::path(
    get,
    path = "/maintenance-requests/{id}/delete",
    params(
        ("id" = String, Path, description = "Maintenance request id (UUID)"),
        IdentityHeaders
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Delete confirmation page", body = PageEnvelope<RequestView>),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "No such request", body = ApiError)
    ),
    tag = "maintenance-requests"
)]
pub async fn delete_form(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    caller.require(Action::DeleteRequest)?;
    let id = parse_request_id(&id)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let page = MaintenanceRequestWorkflow::new(&txn, caller)
        .delete_form(id)
        .await?;
    txn.commit().await?;

    Ok(PageResponse::ok(page)
        .with_token(state.antiforgery.issue(caller.user_id))
        .into_response())
}

/// Delete a maintenance request
#[utoipa::path(
    post,
    path = "/maintenance-requests/{id}/delete",
    params(
        ("id" = String, Path, description = "Maintenance request id (UUID)"),
        IdentityHeaders
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 303, description = "Deleted; continue at the list", body = Redirect),
        (status = 400, description = "Invalid id or anti-forgery failure", body = ApiError),
        (status = 404, description = "No such request", body = ApiError)
    ),
    tag = "maintenance-requests"
)]
pub async fn delete_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    caller.require(Action::DeleteRequest)?;
    let id = parse_request_id(&id)?;

    let txn = begin_unit_of_work(&state.db).await?;
    let redirect = MaintenanceRequestWorkflow::new(&txn, caller)
        .delete(id)
        .await?;
    txn.commit().await?;

    Ok(redirect.into_response())
}
