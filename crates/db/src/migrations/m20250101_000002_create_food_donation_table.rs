//! Create `food_donation` table migration.

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
                    .table(FoodDonation::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FoodDonation::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(FoodDonation::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(FoodDonation::Title).string_len(256).not_null())
                    .col(ColumnDef::new(FoodDonation::Description).text())
                    .col(ColumnDef::new(FoodDonation::FoodType).string_len(64).not_null())
                    .col(ColumnDef::new(FoodDonation::Quantity).string_len(128).not_null())
                    .col(ColumnDef::new(FoodDonation::ExpirationDate).date())
                    .col(ColumnDef::new(FoodDonation::LocationAddress).text())
                    .col(ColumnDef::new(FoodDonation::LocationLat).double())
                    .col(ColumnDef::new(FoodDonation::LocationLng).double())
                    .col(ColumnDef::new(FoodDonation::PickupTimeStart).time())
                    .col(ColumnDef::new(FoodDonation::PickupTimeEnd).time())
                    .col(ColumnDef::new(FoodDonation::ContactMethod).string_len(32))
                    .col(ColumnDef::new(FoodDonation::ContactInfo).string_len(256))
                    .col(
                        ColumnDef::new(FoodDonation::Images)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(FoodDonation::DietaryInfo).text())
                    .col(ColumnDef::new(FoodDonation::Allergens).text())
                    .col(ColumnDef::new(FoodDonation::StorageInstructions).text())
                    .col(
                        ColumnDef::new(FoodDonation::ApprovalStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(FoodDonation::Status)
                            .string_len(16)
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(FoodDonation::ViewsCount).integer().not_null().default(0))
                    .col(ColumnDef::new(FoodDonation::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(FoodDonation::ApprovedBy).string_len(32))
                    .col(ColumnDef::new(FoodDonation::RejectionReason).text())
                    .col(ColumnDef::new(FoodDonation::AssignedToUserId).string_len(32))
                    .col(ColumnDef::new(FoodDonation::AssignedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(FoodDonation::AssignedBy).string_len(32))
                    .col(ColumnDef::new(FoodDonation::AssignmentNotes).text())
                    .col(
                        ColumnDef::new(FoodDonation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(FoodDonation::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_food_donation_user")
                            .from(FoodDonation::Table, FoodDonation::UserId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_food_donation_approved_by")
                            .from(FoodDonation::Table, FoodDonation::ApprovedBy)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_food_donation_assigned_to")
                            .from(FoodDonation::Table, FoodDonation::AssignedToUserId)
                            .to(UserAccount::Table, UserAccount::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_food_donation_user_id", FoodDonation::UserId),
            ("idx_food_donation_approval_status", FoodDonation::ApprovalStatus),
            ("idx_food_donation_status", FoodDonation::Status),
            ("idx_food_donation_expiration_date", FoodDonation::ExpirationDate),
            ("idx_food_donation_created_at", FoodDonation::CreatedAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(FoodDonation::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FoodDonation::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
pub enum FoodDonation {
    Table,
    Id,
    UserId,
    Title,
    Description,
    FoodType,
    Quantity,
    ExpirationDate,
    LocationAddress,
    LocationLat,
    LocationLng,
    PickupTimeStart,
    PickupTimeEnd,
    ContactMethod,
    ContactInfo,
    Images,
    DietaryInfo,
    Allergens,
    StorageInstructions,
    ApprovalStatus,
    Status,
    ViewsCount,
    ApprovedAt,
    ApprovedBy,
    RejectionReason,
    AssignedToUserId,
    AssignedAt,
    AssignedBy,
    AssignmentNotes,
    CreatedAt,
    UpdatedAt,
}
