//! # Maintenance Request Repository
//!
//! CRUD for maintenance requests plus the per-asset request count shown on
//! the index page.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, FromQueryResult, ModelTrait, QueryOrder,
    QuerySelect, RelationTrait, Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::asset;
use crate::models::maintenance_request::{
    self, ActiveModel as RequestActiveModel, Entity as MaintenanceRequest, Model as RequestModel,
};

/// Data for filing a new maintenance request
#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub subject: String,
    pub request_detail: String,
    pub asset_id: Uuid,
    pub tenant_id: Option<Uuid>,
}

/// Number of requests filed against assets sharing one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct AssetRequestCount {
    pub asset_name: String,
    pub request_count: i64,
}

/// Repository for MaintenanceRequest database operations
pub struct MaintenanceRequestRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> MaintenanceRequestRepository<'a, C> {
    /// Create a new MaintenanceRequestRepository over the given connection or transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// List every request, newest first
    pub async fn list_newest_first(&self) -> Result<Vec<RequestModel>, RepositoryError> {
        MaintenanceRequest::find()
            .order_by_desc(maintenance_request::Column::CreatedDate)
            .order_by_desc(maintenance_request::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get request by ID
    pub async fn find_by_id(
        &self,
        request_id: Uuid,
    ) -> Result<Option<RequestModel>, RepositoryError> {
        MaintenanceRequest::find_by_id(request_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// File a new open request stamped with the current time
    pub async fn create(
        &self,
        request: NewMaintenanceRequest,
    ) -> Result<RequestModel, RepositoryError> {
        let model = RequestActiveModel {
            id: Set(Uuid::new_v4()),
            created_date: Set(Utc::now().into()),
            completed_date: Set(None),
            subject: Set(request.subject),
            request_detail: Set(request.request_detail),
            status_detail: Set(None),
            fix_detail: Set(None),
            hours_spent: Set(None),
            asset_id: Set(request.asset_id),
            tenant_id: Set(request.tenant_id),
        };

        model
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Persist changed columns of an existing request
    pub async fn update(&self, request: RequestActiveModel) -> Result<RequestModel, RepositoryError> {
        request
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Physically delete a request
    pub async fn delete(&self, request: RequestModel) -> Result<(), RepositoryError> {
        let id = request.id;
        let result = request
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Maintenance request {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Request count per asset name, ordered by asset name descending
    pub async fn count_by_asset_name(&self) -> Result<Vec<AssetRequestCount>, RepositoryError> {
        MaintenanceRequest::find()
            .select_only()
            .column_as(asset::Column::Name, "asset_name")
            .column_as(
                Expr::col((MaintenanceRequest, maintenance_request::Column::Id)).count(),
                "request_count",
            )
            .join(
                sea_orm::JoinType::InnerJoin,
                maintenance_request::Relation::Asset.def(),
            )
            .group_by(asset::Column::Name)
            .order_by_desc(asset::Column::Name)
            .into_model::<AssetRequestCount>()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
