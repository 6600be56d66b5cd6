//! Migration to create the maintenance_requests table.
//!
//! A request always points at an asset; the tenant link is optional because
//! staff may file against an unoccupied asset. A null `completed_date` marks
//! the request as open.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaintenanceRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaintenanceRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRequests::CreatedDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRequests::CompletedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(MaintenanceRequests::Subject).text().not_null())
                    .col(
                        ColumnDef::new(MaintenanceRequests::RequestDetail)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MaintenanceRequests::StatusDetail).text().null())
                    .col(ColumnDef::new(MaintenanceRequests::FixDetail).text().null())
                    .col(ColumnDef::new(MaintenanceRequests::HoursSpent).double().null())
                    .col(ColumnDef::new(MaintenanceRequests::AssetId).uuid().not_null())
                    .col(ColumnDef::new(MaintenanceRequests::TenantId).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_requests_asset_id")
                            .from(MaintenanceRequests::Table, MaintenanceRequests::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_requests_tenant_id")
                            .from(MaintenanceRequests::Table, MaintenanceRequests::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index listing is ordered newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_maintenance_requests_created_date")
                    .table(MaintenanceRequests::Table)
                    .col(MaintenanceRequests::CreatedDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_maintenance_requests_asset_id")
                    .table(MaintenanceRequests::Table)
                    .col(MaintenanceRequests::AssetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_maintenance_requests_created_date")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_maintenance_requests_asset_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(MaintenanceRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MaintenanceRequests {
    Table,
    Id,
    CreatedDate,
    CompletedDate,
    Subject,
    RequestDetail,
    StatusDetail,
    FixDetail,
    HoursSpent,
    AssetId,
    TenantId,
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
