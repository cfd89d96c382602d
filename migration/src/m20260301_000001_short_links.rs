use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShortLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortLinks::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::ShortCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::OriginalUrl)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLinks::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Uniqueness of short_code is enforced here, at the store level.
        // Concurrent creators racing on the same code get a conflict, not
        // a silent overwrite.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_code")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::ShortCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_short_links_expires_at")
                    .table(ShortLinks::Table)
                    .col(ShortLinks::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_short_links_expires_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_short_links_code").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ShortLinks {
    #[sea_orm(iden = "short_links")]
    Table,
    Id,
    ShortCode,
    OriginalUrl,
    CreatedAt,
    ExpiresAt,
}
