//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `foodify_test`)
//!   `TEST_DB_PASSWORD` (default: `foodify_test`)
//!   `TEST_DB_NAME` (default: `foodify_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use foodify_db::{
    entities::{
        food_reservation::ReservationStatus,
        user_account::{AccountStatus, UserRole},
    },
    repositories::{
        FoodReservationRepository, ReportRange, ReportRepository, ReportType,
        UserAccountRepository,
    },
    test_utils::{TestDatabase, TestDbConfig},
};
use sea_orm::{ActiveModelTrait, Database, Set};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection_and_migrations() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_resident_address_match_ignores_case_and_whitespace() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let conn = Arc::new(Database::connect(&db.config.database_url()).await.unwrap());

    db.insert_user("Rosa", UserRole::Resident, Some("  12 Mango St ")).await.unwrap();
    db.insert_user("Ravi", UserRole::Resident, Some("12 MANGO ST")).await.unwrap();
    db.insert_user("Rita", UserRole::Resident, Some("14 Mango St")).await.unwrap();
    db.insert_user("Olga", UserRole::TeamOfficer, Some("12 Mango St")).await.unwrap();

    let repo = UserAccountRepository::new(conn);
    let residents = repo
        .find_residents_at_address("12 mango st", None, None)
        .await
        .unwrap();
    assert_eq!(residents.len(), 2);

    let approved = repo
        .find_residents_at_address("12 mango st", Some("ravi"), Some(AccountStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].full_name, "Ravi");

    assert_eq!(repo.count_residents_at_address(" 12 Mango St").await.unwrap(), 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_bulk_update_counts_rows_and_sets_responded_at() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let conn = Arc::new(Database::connect(&db.config.database_url()).await.unwrap());

    let donor = db.insert_user("Dana", UserRole::Resident, None).await.unwrap();
    let requester = db.insert_user("Remy", UserRole::Resident, None).await.unwrap();
    let officer = db.insert_user("Olga", UserRole::TeamOfficer, None).await.unwrap();
    let donation = db.insert_pending_donation(&donor.id, "Rice").await.unwrap();

    let request = foodify_db::entities::food_reservation::ActiveModel {
        id: Set("q1".to_string()),
        donation_id: Set(donation.id.clone()),
        requester_id: Set(requester.id.clone()),
        status: Set(ReservationStatus::Pending),
        message: Set(None),
        contact_info: Set(None),
        admin_notes: Set(None),
        reserved_at: Set(Utc::now().into()),
        responded_at: Set(None),
        updated_at: Set(None),
        updated_by: Set(None),
    }
    .insert(db.connection())
    .await
    .unwrap();

    let repo = FoodReservationRepository::new(conn);
    let affected = repo
        .bulk_update_status(
            &[request.id.clone(), "missing".to_string()],
            ReservationStatus::Approved,
            &officer.id,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let updated = repo.find_by_id(&request.id).await.unwrap().unwrap();
    assert_eq!(updated.status, ReservationStatus::Approved);
    assert!(updated.responded_at.is_some());
    assert_eq!(updated.updated_by.as_deref(), Some(officer.id.as_str()));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_donation_report_keeps_column_order() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    let conn = Arc::new(Database::connect(&db.config.database_url()).await.unwrap());

    let donor = db.insert_user("Dana", UserRole::Resident, None).await.unwrap();
    db.insert_pending_donation(&donor.id, "Rice").await.unwrap();

    let repo = ReportRepository::new(conn);
    let rows = repo
        .rows(ReportType::Donations, ReportRange::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let columns: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(
        columns,
        [
            "id",
            "title",
            "food_type",
            "status",
            "approval_status",
            "views_count",
            "location_address",
            "created_at",
            "donor_name",
            "donor_email",
        ]
    );

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
