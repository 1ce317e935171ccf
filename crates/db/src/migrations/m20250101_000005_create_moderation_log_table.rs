//! Create `moderation_log` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_account_table::UserAccount;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModerationLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ModerationLog::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(ModerationLog::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(ModerationLog::ActionType).string_len(64).not_null())
                    .col(ColumnDef::new(ModerationLog::Module).string_len(32).not_null())
                    .col(ColumnDef::new(ModerationLog::Description).text().not_null())
                    .col(ColumnDef::new(ModerationLog::RelatedId).string_len(32))
                    .col(ColumnDef::new(ModerationLog::RelatedType).string_len(32))
                    .col(ColumnDef::new(ModerationLog::Metadata).json_binary())
                    .col(ColumnDef::new(ModerationLog::IpAddress).string_len(64))
                    .col(ColumnDef::new(ModerationLog::UserAgent).text())
                    .col(
                        ColumnDef::new(ModerationLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_moderation_log_actor")
                            .from(ModerationLog::Table, ModerationLog::ActorId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_moderation_log_module_created")
                    .table(ModerationLog::Table)
                    .col(ModerationLog::Module)
                    .col(ModerationLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_moderation_log_actor")
                    .table(ModerationLog::Table)
                    .col(ModerationLog::ActorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModerationLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ModerationLog {
    Table,
    Id,
    ActorId,
    ActionType,
    Module,
    Description,
    RelatedId,
    RelatedType,
    Metadata,
    IpAddress,
    UserAgent,
    CreatedAt,
}
