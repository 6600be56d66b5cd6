//! # Roles and Capabilities
//!
//! Closed set of caller roles and the table of actions each role may perform.
//! Handlers ask [`Role::allows`] instead of testing role membership inline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Caller role, ordered from least to most privileged
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum Role {
    Tenant,
    Staff,
    Manager,
    Admin,
}

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListRequests,
    ViewRequest,
    CreateRequest,
    EditRequest,
    DeleteRequest,
    ViewOrderDetails,
}

/// How a role attaches a new maintenance request to an asset and tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateScope {
    /// Asset and tenant come from the caller's own occupancy; any submitted asset is ignored
    OwnOccupancy,
    /// Asset is chosen explicitly; tenant is whoever occupies it, if anyone
    AnyAsset,
}

const REQUEST_ACTIONS: &[Action] = &[
    Action::ListRequests,
    Action::ViewRequest,
    Action::CreateRequest,
    Action::EditRequest,
    Action::DeleteRequest,
];

const TENANT_ACTIONS: &[Action] = &[
    Action::ListRequests,
    Action::ViewRequest,
    Action::CreateRequest,
    Action::EditRequest,
    Action::DeleteRequest,
    Action::ViewOrderDetails,
];

const CAPABILITIES: &[(Role, &[Action], CreateScope)] = &[
    (Role::Admin, REQUEST_ACTIONS, CreateScope::AnyAsset),
    (Role::Manager, REQUEST_ACTIONS, CreateScope::AnyAsset),
    (Role::Staff, REQUEST_ACTIONS, CreateScope::AnyAsset),
    (Role::Tenant, TENANT_ACTIONS, CreateScope::OwnOccupancy),
];

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Staff, Role::Tenant];

    /// Returns whether this role may perform `action`
    pub fn allows(self, action: Action) -> bool {
        CAPABILITIES
            .iter()
            .find(|(role, _, _)| *role == self)
            .is_some_and(|(_, actions, _)| actions.contains(&action))
    }

    /// Returns how requests created by this role are bound to asset and tenant
    pub fn create_scope(self) -> CreateScope {
        CAPABILITIES
            .iter()
            .find(|(role, _, _)| *role == self)
            .map(|(_, _, scope)| *scope)
            .unwrap_or(CreateScope::OwnOccupancy)
    }

    /// Picks the most privileged recognized role from a list of role names.
    ///
    /// Unrecognized names are ignored; `None` means the caller holds no role
    /// this service knows about.
    pub fn highest<'a, I>(names: I) -> Option<Role>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| name.parse::<Role>().ok())
            .max()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Staff => "Staff",
            Role::Tenant => "Tenant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRole(trimmed.to_string()))
    }
}
