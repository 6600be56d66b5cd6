//! # Workflows
//!
//! Role-aware business operations. A workflow takes an explicit unit of work
//! and the authenticated caller, and returns an outcome describing the page to
//! render or the redirect to follow. It never touches HTTP types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;

pub mod maintenance;

pub use maintenance::MaintenanceRequestWorkflow;

/// Errors that abort a workflow operation
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("path id {path} does not match form id {form}")]
    IdMismatch { path: Uuid, form: Uuid },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Field name to error messages, rendered next to form inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// A view to render together with its model
#[derive(Debug, Clone, PartialEq)]
pub struct Page<M> {
    pub view: &'static str,
    pub model: M,
    pub flash: Option<String>,
    pub errors: FieldErrors,
}

impl<M> Page<M> {
    pub fn new(view: &'static str, model: M) -> Self {
        Self {
            view,
            model,
            flash: None,
            errors: FieldErrors::new(),
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

/// Instruction to continue at another page, optionally carrying a one-shot message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Redirect {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: None,
        }
    }

    pub fn with_flash(mut self, message: impl Into<String>) -> Self {
        self.flash = Some(message.into());
        self
    }
}

/// Result of a form submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<F> {
    /// Changes were handled; follow the redirect
    Redirect(Redirect),
    /// Show the submitted form again; nothing was persisted
    Redisplay(Page<F>),
}

impl<F> SubmitOutcome<F> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, SubmitOutcome::Redirect(_))
    }
}
