//! # Asset Repository

use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::asset::{self, Entity as Asset, Model as AssetModel};

/// Repository for Asset lookups
pub struct AssetRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AssetRepository<'a, C> {
    /// Create a new AssetRepository over the given connection or transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Get asset by ID
    pub async fn find_by_id(&self, asset_id: Uuid) -> Result<Option<AssetModel>, RepositoryError> {
        Asset::find_by_id(asset_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List every asset ordered by name
    pub async fn list_all(&self) -> Result<Vec<AssetModel>, RepositoryError> {
        Asset::find()
            .order_by_asc(asset::Column::Name)
            .order_by_asc(asset::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
