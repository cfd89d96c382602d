//! Click ledger table
//!
//! Append-only record of resolutions. Rows are owned by exactly one short
//! link: deleting a link cascades to its events (explicit retention policy,
//! not an accident of the schema).

use sea_orm_migration::prelude::*;

use super::m20260301_000001_short_links::ShortLinks;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::LinkId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Addr).string_len(45).null())
                    .col(ColumnDef::new(ClickEvents::Agent).text().null())
                    .col(ColumnDef::new(ClickEvents::Referer).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_click_events_link_id")
                            .from(ClickEvents::Table, ClickEvents::LinkId)
                            .to(ShortLinks::Table, ShortLinks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Single-link count queries
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_link_id")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::LinkId)
                    .to_owned(),
            )
            .await?;

        // Windowed count queries (clicks since a timestamp)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_link_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::LinkId)
                    .col(ClickEvents::ClickedAt)
                    .to_owned(),
            )
            .await?;

        // Retention sweep scans by age
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_clicked_at")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::ClickedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_click_events_clicked_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_click_events_link_time").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_click_events_link_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvents {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    LinkId,
    ClickedAt,
    Addr,
    Agent,
    Referer,
}
