use crate::entities::{entity_records, prelude::*, sync_logs};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(EntityRecords)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One local record per remote post; NULL remote ids do not collide.
        manager
            .create_index(
                Index::create()
                    .name("idx_entity_records_type_remote_id")
                    .table(EntityRecords)
                    .col(entity_records::Column::EntityType)
                    .col(entity_records::Column::RemoteId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entity_records_type_status")
                    .table(EntityRecords)
                    .col(entity_records::Column::EntityType)
                    .col(entity_records::Column::SyncStatus)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SyncLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_logs_completed_at")
                    .table(SyncLogs)
                    .col(sync_logs::Column::CompletedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EntityRecords).to_owned())
            .await
    }
}
