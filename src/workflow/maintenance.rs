//! # Maintenance Request Workflow
//!
//! Listing, filing, editing, closing and deleting maintenance requests.
//!
//! Tenants file requests against the asset they occupy; whatever asset they
//! submit is ignored. Staff, managers and admins pick the asset explicitly and
//! the request is attached to whoever occupies it, if anyone.
//!
//! A request is open until a completion date is recorded. The edit form has
//! two submit intents: *save* persists every bound field and returns to the
//! edit form, *close* persists only when a completion date was supplied.

use chrono::{DateTime, FixedOffset, NaiveDate};
use sea_orm::{ConnectionTrait, DatabaseTransaction, IntoActiveModel, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{FieldErrors, Page, Redirect, SubmitOutcome, WorkflowError};
use crate::auth::Caller;
use crate::error::RepositoryError;
use crate::models::maintenance_request::Model as RequestModel;
use crate::models::occupancy::Model as OccupancyModel;
use crate::repositories::{
    ApplianceRepository, AssetRepository, MaintenanceRequestRepository, NewMaintenanceRequest,
    OccupancyRepository, TenantRepository,
};
use crate::roles::CreateScope;

pub const INDEX_VIEW: &str = "maintenance_requests/index";
pub const DETAILS_VIEW: &str = "maintenance_requests/details";
pub const CREATE_VIEW: &str = "maintenance_requests/create";
pub const EDIT_VIEW: &str = "maintenance_requests/edit";
pub const DELETE_VIEW: &str = "maintenance_requests/delete";

pub const LIST_PATH: &str = "/maintenance-requests";

pub const SAVED_MESSAGE: &str = "All Changes Have Been Saved!";
pub const COMPLETION_DATE_REQUIRED_MESSAGE: &str = "Please Enter a Completion Date to Close Request";
pub const SAVE_FAILED_MESSAGE: &str =
    "Unable to save changes. Try again, and if the problem persists contact your system administrator.";
pub const NO_OCCUPANCY_MESSAGE: &str = "No active occupancy found for tenant";

/// Error key for problems not tied to a single input
pub const FORM_ERROR_KEY: &str = "form";

const ENTITY: &str = "Maintenance request";
const SUBJECT_MAX_LEN: usize = 200;
const REQUEST_DETAIL_MAX_LEN: usize = 4000;

pub fn edit_path(id: Uuid) -> String {
    format!("{LIST_PATH}/{id}/edit")
}

/// Maintenance request as shown on details, edit and delete pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RequestView {
    pub id: Uuid,
    pub created_date: DateTime<FixedOffset>,
    pub completed_date: Option<DateTime<FixedOffset>>,
    pub subject: String,
    pub request_detail: String,
    pub status_detail: Option<String>,
    pub fix_detail: Option<String>,
    pub hours_spent: Option<f64>,
    pub asset_id: Uuid,
    pub tenant_id: Option<Uuid>,
    /// `Open` or `Closed`
    pub status: String,
}

impl From<RequestModel> for RequestView {
    fn from(model: RequestModel) -> Self {
        let status = if model.is_closed() { "Closed" } else { "Open" }.to_string();
        Self {
            id: model.id,
            created_date: model.created_date,
            completed_date: model.completed_date,
            subject: model.subject,
            request_detail: model.request_detail,
            status_detail: model.status_detail,
            fix_detail: model.fix_detail,
            hours_spent: model.hours_spent,
            asset_id: model.asset_id,
            tenant_id: model.tenant_id,
            status,
        }
    }
}

/// Number of requests per asset name, as displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetRequestTally {
    pub asset_name: String,
    pub count: String,
}

/// Model of the index page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IndexModel {
    /// Every request, newest first
    pub requests: Vec<RequestView>,
    /// Requests per asset name, ordered by asset name descending
    pub requests_per_asset: Vec<AssetRequestTally>,
}

/// Entry of a select list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectOption {
    pub value: Uuid,
    pub text: String,
}

/// Fields submitted by the create form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateRequestForm {
    pub subject: String,
    pub request_detail: String,
    /// Bound asset reference; never trusted for placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// Asset chosen from the select list by staff
    #[serde(rename = "selectAsset", skip_serializing_if = "Option::is_none")]
    pub select_asset: Option<String>,
}

/// Model of the create page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateFormModel {
    /// Every asset
    pub assets: Vec<SelectOption>,
    /// Appliances in the tenant's occupied asset; absent for staff or without occupancy
    pub appliances: Option<Vec<SelectOption>>,
    pub form: CreateRequestForm,
}

/// Fields submitted by the edit form. Empty strings mean absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EditRequestForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub created_date: String,
    pub completed_date: String,
    pub subject: String,
    pub request_detail: String,
    pub status_detail: String,
    pub fix_detail: String,
    pub hours_spent: String,
    #[serde(rename = "saveBtn", skip_serializing)]
    pub save_btn: Option<String>,
    #[serde(rename = "closeBtn", skip_serializing)]
    pub close_btn: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitIntent {
    Save,
    Close,
    Unspecified,
}

impl EditRequestForm {
    fn intent(&self) -> SubmitIntent {
        if self.save_btn.is_some() {
            SubmitIntent::Save
        } else if self.close_btn.is_some() {
            SubmitIntent::Close
        } else {
            SubmitIntent::Unspecified
        }
    }
}

impl From<RequestModel> for EditRequestForm {
    fn from(model: RequestModel) -> Self {
        Self {
            id: Some(model.id.to_string()),
            created_date: model.created_date.to_rfc3339(),
            completed_date: model
                .completed_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            subject: model.subject,
            request_detail: model.request_detail,
            status_detail: model.status_detail.unwrap_or_default(),
            fix_detail: model.fix_detail.unwrap_or_default(),
            hours_spent: model
                .hours_spent
                .map(|h| h.to_string())
                .unwrap_or_default(),
            save_btn: None,
            close_btn: None,
        }
    }
}

#[derive(Debug)]
struct ValidEdit {
    created_date: DateTime<FixedOffset>,
    completed_date: Option<DateTime<FixedOffset>>,
    subject: String,
    request_detail: String,
    status_detail: Option<String>,
    fix_detail: Option<String>,
    hours_spent: Option<f64>,
}

/// Maintenance request operations for one caller inside one unit of work.
///
/// Writes run in a nested transaction (a savepoint when `C` is already a
/// transaction), so a rejected write leaves the unit of work usable for
/// redisplaying the form.
pub struct MaintenanceRequestWorkflow<'a, C> {
    db: &'a C,
    caller: Caller,
}

impl<'a, C: ConnectionTrait + TransactionTrait> MaintenanceRequestWorkflow<'a, C> {
    pub fn new(db: &'a C, caller: Caller) -> Self {
        Self { db, caller }
    }

    /// Index page: every request newest first, plus the per-asset tally
    pub async fn list(&self) -> Result<Page<IndexModel>, WorkflowError> {
        let repo = MaintenanceRequestRepository::new(self.db);

        let requests_per_asset: Vec<AssetRequestTally> = repo
            .count_by_asset_name()
            .await?
            .into_iter()
            .map(|row| {
                tracing::debug!(
                    asset_name = %row.asset_name,
                    requests = row.request_count,
                    "Requests per asset"
                );
                AssetRequestTally {
                    asset_name: row.asset_name,
                    count: row.request_count.to_string(),
                }
            })
            .collect();

        let requests = repo
            .list_newest_first()
            .await?
            .into_iter()
            .map(RequestView::from)
            .collect();

        Ok(Page::new(
            INDEX_VIEW,
            IndexModel {
                requests,
                requests_per_asset,
            },
        ))
    }

    pub async fn details(&self, id: Uuid) -> Result<Page<RequestView>, WorkflowError> {
        Ok(Page::new(DETAILS_VIEW, self.fetch(id).await?.into()))
    }

    /// Empty create form with asset options, and appliance options for tenants
    pub async fn create_form(&self) -> Result<Page<CreateFormModel>, WorkflowError> {
        self.create_page(CreateRequestForm::default(), FieldErrors::new())
            .await
    }

    /// Files a new request placed according to the caller's role
    pub async fn create(
        &self,
        form: CreateRequestForm,
    ) -> Result<SubmitOutcome<CreateFormModel>, WorkflowError> {
        let mut errors = FieldErrors::new();
        let subject = validate_required(&mut errors, "subject", &form.subject, SUBJECT_MAX_LEN);
        let request_detail = validate_required(
            &mut errors,
            "request_detail",
            &form.request_detail,
            REQUEST_DETAIL_MAX_LEN,
        );

        let placement = match self.caller.role.create_scope() {
            CreateScope::OwnOccupancy => self
                .tenant_occupancy()
                .await?
                .map(|occupancy| (occupancy.asset_id, Some(occupancy.tenant_id)))
                .or_else(|| {
                    errors.add("occupancy", NO_OCCUPANCY_MESSAGE);
                    None
                }),
            CreateScope::AnyAsset => match self
                .selected_asset(form.select_asset.as_deref(), &mut errors)
                .await?
            {
                Some(asset_id) => {
                    let tenant_id = OccupancyRepository::new(self.db)
                        .first_for_asset(asset_id)
                        .await?
                        .map(|occupancy| occupancy.tenant_id);
                    Some((asset_id, tenant_id))
                }
                None => None,
            },
        };

        let (Some(subject), Some(request_detail), Some((asset_id, tenant_id)), true) =
            (subject, request_detail, placement, errors.is_empty())
        else {
            return self.redisplay_create(form, errors).await;
        };

        let new_request = NewMaintenanceRequest {
            subject,
            request_detail,
            asset_id,
            tenant_id,
        };
        let created = match self.db.begin().await {
            Ok(savepoint) => {
                let result = MaintenanceRequestRepository::new(&savepoint)
                    .create(new_request)
                    .await;
                finish_savepoint(savepoint, result).await
            }
            Err(err) => Err(RepositoryError::database_error(err)),
        };

        match created {
            Ok(request) => {
                tracing::info!(
                    request_id = %request.id,
                    asset_id = %request.asset_id,
                    tenant_id = ?request.tenant_id,
                    role = %self.caller.role,
                    "Maintenance request filed"
                );
                Ok(SubmitOutcome::Redirect(Redirect::to(LIST_PATH)))
            }
            Err(RepositoryError::Database(err)) => {
                tracing::error!(error = %err, "Failed to file maintenance request");
                let mut errors = FieldErrors::new();
                errors.add(FORM_ERROR_KEY, SAVE_FAILED_MESSAGE);
                self.redisplay_create(form, errors).await
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn edit_form(&self, id: Uuid) -> Result<Page<RequestView>, WorkflowError> {
        Ok(Page::new(EDIT_VIEW, self.fetch(id).await?.into()))
    }

    /// Applies the edit form according to the submit intent
    pub async fn edit(
        &self,
        id: Uuid,
        form: EditRequestForm,
    ) -> Result<SubmitOutcome<EditRequestForm>, WorkflowError> {
        let mut errors = FieldErrors::new();
        // A blank form id means the path id
        if let Some(raw) = form.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            match raw.parse::<Uuid>() {
                Ok(form_id) if form_id != id => {
                    return Err(WorkflowError::IdMismatch {
                        path: id,
                        form: form_id,
                    });
                }
                Ok(_) => {}
                Err(_) => errors.add("id", "Must be a valid identifier"),
            }
        }

        let existing = self.fetch(id).await?;

        let valid = validate_edit(&form, &mut errors);
        let valid = match valid {
            Some(valid) if errors.is_empty() => valid,
            _ => return Ok(redisplay_edit(form, errors)),
        };

        match form.intent() {
            SubmitIntent::Save => {
                if let Some(outcome) = self.apply_edit(existing, valid, &form).await? {
                    return Ok(outcome);
                }
                tracing::info!(request_id = %id, "Maintenance request saved");
                Ok(SubmitOutcome::Redirect(
                    Redirect::to(edit_path(id)).with_flash(SAVED_MESSAGE),
                ))
            }
            SubmitIntent::Close if valid.completed_date.is_none() => Ok(SubmitOutcome::Redirect(
                Redirect::to(edit_path(id)).with_flash(COMPLETION_DATE_REQUIRED_MESSAGE),
            )),
            SubmitIntent::Close => {
                if let Some(outcome) = self.apply_edit(existing, valid, &form).await? {
                    return Ok(outcome);
                }
                tracing::info!(request_id = %id, "Maintenance request closed");
                Ok(SubmitOutcome::Redirect(Redirect::to(LIST_PATH)))
            }
            SubmitIntent::Unspecified => Ok(redisplay_edit(form, FieldErrors::new())),
        }
    }

    pub async fn delete_form(&self, id: Uuid) -> Result<Page<RequestView>, WorkflowError> {
        Ok(Page::new(DELETE_VIEW, self.fetch(id).await?.into()))
    }

    /// Physically removes a request
    pub async fn delete(&self, id: Uuid) -> Result<Redirect, WorkflowError> {
        let existing = self.fetch(id).await?;

        match MaintenanceRequestRepository::new(self.db).delete(existing).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound(_)) => {
                return Err(WorkflowError::NotFound { entity: ENTITY, id });
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(request_id = %id, role = %self.caller.role, "Maintenance request deleted");
        Ok(Redirect::to(LIST_PATH))
    }

    async fn fetch(&self, id: Uuid) -> Result<RequestModel, WorkflowError> {
        MaintenanceRequestRepository::new(self.db)
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound { entity: ENTITY, id })
    }

    /// Overwrites the bound fields; `Some` is a redisplay after a failed write
    async fn apply_edit(
        &self,
        existing: RequestModel,
        valid: ValidEdit,
        form: &EditRequestForm,
    ) -> Result<Option<SubmitOutcome<EditRequestForm>>, WorkflowError> {
        let id = existing.id;
        let mut active = existing.into_active_model();
        active.created_date = Set(valid.created_date);
        active.completed_date = Set(valid.completed_date);
        active.subject = Set(valid.subject);
        active.request_detail = Set(valid.request_detail);
        active.status_detail = Set(valid.status_detail);
        active.fix_detail = Set(valid.fix_detail);
        active.hours_spent = Set(valid.hours_spent);

        let updated = match self.db.begin().await {
            Ok(savepoint) => {
                let result = MaintenanceRequestRepository::new(&savepoint)
                    .update(active)
                    .await;
                finish_savepoint(savepoint, result).await
            }
            Err(err) => Err(RepositoryError::database_error(err)),
        };

        match updated {
            Ok(_) => Ok(None),
            Err(RepositoryError::Database(err)) => {
                tracing::error!(request_id = %id, error = %err, "Failed to update maintenance request");
                let mut errors = FieldErrors::new();
                errors.add(FORM_ERROR_KEY, SAVE_FAILED_MESSAGE);
                Ok(Some(redisplay_edit(form.clone(), errors)))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// The caller's first occupancy, when the caller has a tenant profile and one exists
    async fn tenant_occupancy(&self) -> Result<Option<OccupancyModel>, WorkflowError> {
        let Some(tenant) = TenantRepository::new(self.db)
            .find_by_user_id(self.caller.user_id)
            .await?
        else {
            tracing::warn!(user_id = %self.caller.user_id, "Tenant caller has no tenant profile");
            return Ok(None);
        };

        let occupancy = OccupancyRepository::new(self.db)
            .first_for_tenant(tenant.id)
            .await?;
        if occupancy.is_none() {
            tracing::warn!(tenant_id = %tenant.id, "Tenant has no occupancy");
        }
        Ok(occupancy)
    }

    async fn selected_asset(
        &self,
        raw: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Result<Option<Uuid>, WorkflowError> {
        let Some(asset_id) = raw.map(str::trim).and_then(|s| s.parse::<Uuid>().ok()) else {
            errors.add("selectAsset", "Select an asset");
            return Ok(None);
        };

        match AssetRepository::new(self.db).find_by_id(asset_id).await? {
            Some(asset) => Ok(Some(asset.id)),
            None => {
                errors.add("selectAsset", "Selected asset does not exist");
                Ok(None)
            }
        }
    }

    async fn create_page(
        &self,
        form: CreateRequestForm,
        mut errors: FieldErrors,
    ) -> Result<Page<CreateFormModel>, WorkflowError> {
        let assets = AssetRepository::new(self.db)
            .list_all()
            .await?
            .into_iter()
            .map(|asset| SelectOption {
                value: asset.id,
                text: asset.name,
            })
            .collect();

        let appliances = match self.caller.role.create_scope() {
            CreateScope::AnyAsset => None,
            CreateScope::OwnOccupancy => match self.tenant_occupancy().await? {
                Some(occupancy) => Some(
                    ApplianceRepository::new(self.db)
                        .list_for_asset(occupancy.asset_id)
                        .await?
                        .into_iter()
                        .map(|appliance| SelectOption {
                            value: appliance.id,
                            text: appliance.name,
                        })
                        .collect(),
                ),
                None => {
                    if errors.get("occupancy").is_none() {
                        errors.add("occupancy", NO_OCCUPANCY_MESSAGE);
                    }
                    None
                }
            },
        };

        Ok(Page::new(
            CREATE_VIEW,
            CreateFormModel {
                assets,
                appliances,
                form,
            },
        )
        .with_errors(errors))
    }

    async fn redisplay_create(
        &self,
        form: CreateRequestForm,
        errors: FieldErrors,
    ) -> Result<SubmitOutcome<CreateFormModel>, WorkflowError> {
        Ok(SubmitOutcome::Redisplay(self.create_page(form, errors).await?))
    }
}

/// Releases the savepoint on success, rolls it back on failure
async fn finish_savepoint<T>(
    savepoint: DatabaseTransaction,
    result: Result<T, RepositoryError>,
) -> Result<T, RepositoryError> {
    match result {
        Ok(value) => {
            savepoint
                .commit()
                .await
                .map_err(RepositoryError::database_error)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = savepoint.rollback().await {
                tracing::warn!(error = %rollback_err, "Failed to roll back savepoint");
            }
            Err(err)
        }
    }
}

fn redisplay_edit(form: EditRequestForm, errors: FieldErrors) -> SubmitOutcome<EditRequestForm> {
    SubmitOutcome::Redisplay(Page::new(EDIT_VIEW, form).with_errors(errors))
}

fn validate_required(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max_len: usize,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field is required");
        None
    } else if trimmed.chars().count() > max_len {
        errors.add(field, format!("Must be at most {max_len} characters"));
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

fn validate_edit(form: &EditRequestForm, errors: &mut FieldErrors) -> Option<ValidEdit> {
    let subject = validate_required(errors, "subject", &form.subject, SUBJECT_MAX_LEN);
    let request_detail = validate_required(
        errors,
        "request_detail",
        &form.request_detail,
        REQUEST_DETAIL_MAX_LEN,
    );

    let created_date = if form.created_date.trim().is_empty() {
        errors.add("created_date", "This field is required");
        None
    } else {
        let parsed = parse_date(&form.created_date);
        if parsed.is_none() {
            errors.add("created_date", "Must be a valid date");
        }
        parsed
    };

    let completed_date = if form.completed_date.trim().is_empty() {
        Ok(None)
    } else {
        match parse_date(&form.completed_date) {
            Some(date) => Ok(Some(date)),
            None => {
                errors.add("completed_date", "Must be a valid date");
                Err(())
            }
        }
    };

    if let (Some(created), Ok(Some(completed))) = (created_date, completed_date) {
        if completed < created {
            errors.add("completed_date", "Must not be before the created date");
        }
    }

    let hours_spent = if form.hours_spent.trim().is_empty() {
        Ok(None)
    } else {
        match form.hours_spent.trim().parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours >= 0.0 => Ok(Some(hours)),
            Ok(_) => {
                errors.add("hours_spent", "Must not be negative");
                Err(())
            }
            Err(_) => {
                errors.add("hours_spent", "Must be a number");
                Err(())
            }
        }
    };

    Some(ValidEdit {
        created_date: created_date?,
        completed_date: completed_date.ok()?,
        subject: subject?,
        request_detail: request_detail?,
        status_detail: optional_text(&form.status_detail),
        fix_detail: optional_text(&form.fix_detail),
        hours_spent: hours_spent.ok()?,
    })
}
