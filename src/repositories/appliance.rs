//! # Appliance Repository

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::appliance::{self, Entity as Appliance, Model as ApplianceModel};

/// Repository for Appliance lookups
pub struct ApplianceRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ApplianceRepository<'a, C> {
    /// Create a new ApplianceRepository over the given connection or transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// List the appliances installed in an asset
    pub async fn list_for_asset(
        &self,
        asset_id: Uuid,
    ) -> Result<Vec<ApplianceModel>, RepositoryError> {
        Appliance::find()
            .filter(appliance::Column::AssetId.eq(asset_id))
            .order_by_asc(appliance::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
