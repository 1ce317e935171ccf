//! Create `user_account` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserAccount::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserAccount::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(UserAccount::FullName).string_len(256).not_null())
                    .col(ColumnDef::new(UserAccount::Email).string_len(320).not_null().unique_key())
                    .col(ColumnDef::new(UserAccount::PhoneNumber).string_len(32))
                    .col(ColumnDef::new(UserAccount::Address).text())
                    .col(
                        ColumnDef::new(UserAccount::Role)
                            .string_len(16)
                            .not_null()
                            .default("resident"),
                    )
                    .col(
                        ColumnDef::new(UserAccount::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(UserAccount::ProfileImg).string_len(1024))
                    .col(ColumnDef::new(UserAccount::PasswordHash).string_len(256))
                    .col(ColumnDef::new(UserAccount::Token).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(UserAccount::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(UserAccount::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: role (resident directory, dashboards)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_account_role")
                    .table(UserAccount::Table)
                    .col(UserAccount::Role)
                    .to_owned(),
            )
            .await?;

        // Expression index backing the normalized address match
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_user_account_address_norm \
                 ON user_account (LOWER(TRIM(address)))",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserAccount::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UserAccount {
    Table,
    Id,
    FullName,
    Email,
    PhoneNumber,
    Address,
    Role,
    Status,
    ProfileImg,
    PasswordHash,
    Token,
    CreatedAt,
    UpdatedAt,
}
