//! Migration to create the appliances table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appliances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appliances::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appliances::Name).text().not_null())
                    .col(ColumnDef::new(Appliances::AssetId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appliances_asset_id")
                            .from(Appliances::Table, Appliances::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appliances_asset_id")
                    .table(Appliances::Table)
                    .col(Appliances::AssetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_appliances_asset_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Appliances::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Appliances {
    Table,
    Id,
    Name,
    AssetId,
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
}
