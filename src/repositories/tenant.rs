//! # Tenant Repository
//!
//! Resolves the tenant profile belonging to a signed-in user account.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::tenant::{self, Entity as Tenant, Model as TenantModel};

/// Repository for Tenant lookups
pub struct TenantRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TenantRepository<'a, C> {
    /// Create a new TenantRepository over the given connection or transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Get the tenant profile linked to a user account
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        Tenant::find()
            .filter(tenant::Column::UserId.eq(user_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
