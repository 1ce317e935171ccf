//! Database migrations.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_account_table;
mod m20250101_000002_create_food_donation_table;
mod m20250101_000003_create_food_reservation_table;
mod m20250101_000004_create_announcement_tables;
mod m20250101_000005_create_moderation_log_table;
mod m20250101_000006_create_feedback_and_report_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_account_table::Migration),
            Box::new(m20250101_000002_create_food_donation_table::Migration),
            Box::new(m20250101_000003_create_food_reservation_table::Migration),
            Box::new(m20250101_000004_create_announcement_tables::Migration),
            Box::new(m20250101_000005_create_moderation_log_table::Migration),
            Box::new(m20250101_000006_create_feedback_and_report_tables::Migration),
        ]
    }
}
