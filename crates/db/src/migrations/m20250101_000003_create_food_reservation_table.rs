//! Create `food_reservation` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_account_table::UserAccount;
use super::m20250101_000002_create_food_donation_table::FoodDonation;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FoodReservation::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FoodReservation::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(FoodReservation::DonationId).string_len(32).not_null())
                    .col(ColumnDef::new(FoodReservation::RequesterId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(FoodReservation::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(FoodReservation::Message).text())
                    .col(ColumnDef::new(FoodReservation::ContactInfo).string_len(256))
                    .col(ColumnDef::new(FoodReservation::AdminNotes).text())
                    .col(
                        ColumnDef::new(FoodReservation::ReservedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(FoodReservation::RespondedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(FoodReservation::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(FoodReservation::UpdatedBy).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_food_reservation_donation")
                            .from(FoodReservation::Table, FoodReservation::DonationId)
                            .to(FoodDonation::Table, FoodDonation::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_food_reservation_requester")
                            .from(FoodReservation::Table, FoodReservation::RequesterId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one request per resident per donation
        manager
            .create_index(
                Index::create()
                    .name("idx_food_reservation_unique")
                    .table(FoodReservation::Table)
                    .col(FoodReservation::DonationId)
                    .col(FoodReservation::RequesterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_food_reservation_status")
                    .table(FoodReservation::Table)
                    .col(FoodReservation::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_food_reservation_reserved_at")
                    .table(FoodReservation::Table)
                    .col(FoodReservation::ReservedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FoodReservation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FoodReservation {
    Table,
    Id,
    DonationId,
    RequesterId,
    Status,
    Message,
    ContactInfo,
    AdminNotes,
    ReservedAt,
    RespondedAt,
    UpdatedAt,
    UpdatedBy,
}
