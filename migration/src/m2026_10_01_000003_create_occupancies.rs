//! Migration to create the occupancies table.
//!
//! An occupancy links one tenant to the asset they occupy.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Occupancies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Occupancies::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Occupancies::AssetId).uuid().not_null())
                    .col(ColumnDef::new(Occupancies::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(Occupancies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_occupancies_asset_id")
                            .from(Occupancies::Table, Occupancies::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_occupancies_tenant_id")
                            .from(Occupancies::Table, Occupancies::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Occupancy is resolved from both directions
        manager
            .create_index(
                Index::create()
                    .name("idx_occupancies_tenant_id")
                    .table(Occupancies::Table)
                    .col(Occupancies::TenantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_occupancies_asset_id")
                    .table(Occupancies::Table)
                    .col(Occupancies::AssetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_occupancies_tenant_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_occupancies_asset_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Occupancies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Occupancies {
    Table,
    Id,
    AssetId,
    TenantId,
    CreatedAt,
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
