//! # Occupancy Repository
//!
//! An asset may carry several occupancy rows and so may a tenant. Lookups
//! return the first match ordered by `created_at`, then `id`.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::occupancy::{self, Entity as Occupancy, Model as OccupancyModel};

/// Repository for Occupancy lookups
pub struct OccupancyRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> OccupancyRepository<'a, C> {
    /// Create a new OccupancyRepository over the given connection or transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// First occupancy held by a tenant
    pub async fn first_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<OccupancyModel>, RepositoryError> {
        first_match(Occupancy::find().filter(occupancy::Column::TenantId.eq(tenant_id)))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// First occupancy recorded against an asset
    pub async fn first_for_asset(
        &self,
        asset_id: Uuid,
    ) -> Result<Option<OccupancyModel>, RepositoryError> {
        first_match(Occupancy::find().filter(occupancy::Column::AssetId.eq(asset_id)))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

fn first_match(query: Select<Occupancy>) -> Select<Occupancy> {
    query
        .order_by_asc(occupancy::Column::CreatedAt)
        .order_by_asc(occupancy::Column::Id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::*;

    #[tokio::test]
    async fn earliest_occupancy_wins_for_tenant() {
        let db = setup_db().await;
        let first_asset = insert_asset(&db, "Unit A").await;
        let later_asset = insert_asset(&db, "Unit B").await;
        let tenant = insert_tenant(&db, "Ada").await;
        insert_occupancy(&db, later_asset.id, tenant.id, 5).await;
        insert_occupancy(&db, first_asset.id, tenant.id, 60).await;

        let found = OccupancyRepository::new(&db)
            .first_for_tenant(tenant.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.asset_id, first_asset.id);
    }

    #[tokio::test]
    async fn earliest_occupancy_wins_for_asset() {
        let db = setup_db().await;
        let asset = insert_asset(&db, "Unit A").await;
        let first = insert_tenant(&db, "Ada").await;
        let second = insert_tenant(&db, "Grace").await;
        insert_occupancy(&db, asset.id, second.id, 1).await;
        insert_occupancy(&db, asset.id, first.id, 30).await;

        let found = OccupancyRepository::new(&db)
            .first_for_asset(asset.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.tenant_id, first.id);
    }

    #[tokio::test]
    async fn unoccupied_returns_none() {
        let db = setup_db().await;
        let asset = insert_asset(&db, "Vacant").await;
        let repo = OccupancyRepository::new(&db);

        assert!(repo.first_for_asset(asset.id).await.unwrap().is_none());
        assert!(repo.first_for_tenant(Uuid::new_v4()).await.unwrap().is_none());
    }
}
