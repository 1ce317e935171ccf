//! Create `announcement` and post engagement tables migration.

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
                    .table(Announcement::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Announcement::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Announcement::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Announcement::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Announcement::Content).text().not_null())
                    .col(
                        ColumnDef::new(Announcement::Type)
                            .string_len(16)
                            .not_null()
                            .default("announcement"),
                    )
                    .col(
                        ColumnDef::new(Announcement::Priority)
                            .string_len(16)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(Announcement::Status)
                            .string_len(16)
                            .not_null()
                            .default("published"),
                    )
                    .col(ColumnDef::new(Announcement::IsPinned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Announcement::Images).json_binary())
                    .col(ColumnDef::new(Announcement::Attachments).json_binary())
                    .col(ColumnDef::new(Announcement::LikesCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Announcement::SharesCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Announcement::CommentsCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Announcement::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Announcement::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_announcement_user")
                            .from(Announcement::Table, Announcement::UserId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: feed ordering (pinned first, newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_announcement_feed")
                    .table(Announcement::Table)
                    .col(Announcement::Status)
                    .col(Announcement::IsPinned)
                    .col(Announcement::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_announcement_type")
                    .table(Announcement::Table)
                    .col(Announcement::Type)
                    .to_owned(),
            )
            .await?;

        // Likes and saves are one per user per post
        for table in [Engagement::PostLike, Engagement::PostSave] {
            create_engagement_table(manager, table, None).await?;
        }
        create_engagement_table(manager, Engagement::PostComment, Some(Engagement::Comment))
            .await?;
        create_engagement_table(manager, Engagement::PostShare, Some(Engagement::ShareMessage))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Engagement::PostShare,
            Engagement::PostComment,
            Engagement::PostSave,
            Engagement::PostLike,
        ] {
            manager.drop_table(Table::drop().table(table).to_owned()).await?;
        }
        manager
            .drop_table(Table::drop().table(Announcement::Table).to_owned())
            .await
    }
}

/// Engagement tables share their shape; comments and shares add one text column.
async fn create_engagement_table(
    manager: &SchemaManager<'_>,
    table: Engagement,
    text_column: Option<Engagement>,
) -> Result<(), DbErr> {
    let name = table.to_string();

    let mut create = Table::create();
    create
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Engagement::Id).string_len(32).not_null().primary_key())
        .col(ColumnDef::new(Engagement::PostId).string_len(32).not_null())
        .col(
            ColumnDef::new(Engagement::PostType)
                .string_len(16)
                .not_null()
                .default("announcement"),
        )
        .col(ColumnDef::new(Engagement::UserId).string_len(32).not_null());

    match text_column {
        Some(Engagement::Comment) => {
            create.col(ColumnDef::new(Engagement::Comment).text().not_null());
        }
        Some(col) => {
            create.col(ColumnDef::new(col).text());
        }
        None => {}
    }

    create
        .col(
            ColumnDef::new(Engagement::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_user"))
                .from(table, Engagement::UserId)
                .to(UserAccount::Table, UserAccount::Id)
                .on_delete(ForeignKeyAction::Cascade),
        );

    manager.create_table(create.to_owned()).await?;

    let mut index = Index::create();
    index
        .name(format!("idx_{name}_post"))
        .table(table)
        .col(Engagement::PostId)
        .col(Engagement::PostType)
        .col(Engagement::UserId);
    if text_column.is_none() {
        index.unique();
    }
    manager.create_index(index.to_owned()).await
}

#[derive(Iden)]
enum Announcement {
    Table,
    Id,
    UserId,
    Title,
    Content,
    Type,
    Priority,
    Status,
    IsPinned,
    Images,
    Attachments,
    LikesCount,
    SharesCount,
    CommentsCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
enum Engagement {
    PostLike,
    PostSave,
    PostComment,
    PostShare,
    Id,
    PostId,
    PostType,
    UserId,
    Comment,
    ShareMessage,
    CreatedAt,
}
