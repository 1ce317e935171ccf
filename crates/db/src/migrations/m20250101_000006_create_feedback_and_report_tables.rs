//! Create `community_feedback` and `user_report` tables migration.

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
                    .table(CommunityFeedback::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CommunityFeedback::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(CommunityFeedback::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CommunityFeedback::FeedbackType)
                            .string_len(16)
                            .not_null()
                            .default("platform"),
                    )
                    .col(
                        ColumnDef::new(CommunityFeedback::Rating)
                            .integer()
                            .not_null()
                            .check(
                                Expr::col(CommunityFeedback::Rating)
                                    .gte(1)
                                    .and(Expr::col(CommunityFeedback::Rating).lte(5)),
                            ),
                    )
                    .col(ColumnDef::new(CommunityFeedback::Subject).string_len(255).not_null())
                    .col(ColumnDef::new(CommunityFeedback::Message).text().not_null())
                    .col(
                        ColumnDef::new(CommunityFeedback::Status)
                            .string_len(16)
                            .not_null()
                            .default("new"),
                    )
                    .col(
                        ColumnDef::new(CommunityFeedback::Priority)
                            .string_len(16)
                            .not_null()
                            .default("medium"),
                    )
                    .col(ColumnDef::new(CommunityFeedback::Response).text())
                    .col(ColumnDef::new(CommunityFeedback::RespondedBy).string_len(32))
                    .col(ColumnDef::new(CommunityFeedback::RespondedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CommunityFeedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CommunityFeedback::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_feedback_author")
                            .from(CommunityFeedback::Table, CommunityFeedback::UserId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_community_feedback_responder")
                            .from(CommunityFeedback::Table, CommunityFeedback::RespondedBy)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserReport::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserReport::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(UserReport::ReporterId).string_len(32).not_null())
                    .col(ColumnDef::new(UserReport::ReportedUserId).string_len(32))
                    .col(ColumnDef::new(UserReport::ReportedPostId).string_len(32))
                    .col(
                        ColumnDef::new(UserReport::ReportType)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(UserReport::Category).string_len(16).not_null())
                    .col(ColumnDef::new(UserReport::Description).text().not_null())
                    .col(
                        ColumnDef::new(UserReport::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(UserReport::Priority)
                            .string_len(16)
                            .not_null()
                            .default("medium"),
                    )
                    .col(ColumnDef::new(UserReport::ResolvedBy).string_len(32))
                    .col(ColumnDef::new(UserReport::ResolutionNote).text())
                    .col(
                        ColumnDef::new(UserReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(UserReport::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_report_reporter")
                            .from(UserReport::Table, UserReport::ReporterId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_report_reported_user")
                            .from(UserReport::Table, UserReport::ReportedUserId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_report_resolver")
                            .from(UserReport::Table, UserReport::ResolvedBy)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: triage queue
        manager
            .create_index(
                Index::create()
                    .name("idx_user_report_status")
                    .table(UserReport::Table)
                    .col(UserReport::Status)
                    .col(UserReport::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserReport::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommunityFeedback::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommunityFeedback {
    Table,
    Id,
    UserId,
    FeedbackType,
    Rating,
    Subject,
    Message,
    Status,
    Priority,
    Response,
    RespondedBy,
    RespondedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserReport {
    Table,
    Id,
    ReporterId,
    ReportedUserId,
    ReportedPostId,
    ReportType,
    Category,
    Description,
    Status,
    Priority,
    ResolvedBy,
    ResolutionNote,
    CreatedAt,
    UpdatedAt,
}
