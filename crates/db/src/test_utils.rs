//! Test utilities for database operations.
//!
//! Helpers for connecting to a throwaway `PostgreSQL` database, migrating it
//! and seeding the rows the panel works on.

use chrono::Utc;
use foodify_common::IdGenerator;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use serde_json::json;
use tracing::info;

use crate::entities::{
    food_donation::{self, ApprovalStatus, DonationStatus},
    user_account::{self, AccountStatus, UserRole},
};

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "foodify_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "foodify_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "foodify_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for the maintenance database (for creating test databases).
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the default test database and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        use sea_orm_migration::MigratorTrait;

        let conn = Database::connect(&config.database_url()).await?;
        crate::migrations::Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self { conn, config })
    }

    /// Create and migrate a uniquely named database (for parallel tests).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = IdGenerator::new().generate();
        config.database = format!("foodify_test_{}", &suffix[suffix.len() - 8..]);

        let postgres_conn = Database::connect(&config.postgres_url()).await?;
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        info!(database = %config.database, "Created unique test database");

        Self::with_config(config).await
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Truncate every table except the migration ledger.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        for row in tables {
            if let Ok(table_name) = row.try_get::<String>("", "tablename") {
                if table_name == "seaql_migrations" {
                    continue;
                }

                let truncate = format!("TRUNCATE TABLE \"{table_name}\" CASCADE");
                self.conn
                    .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
                    .await?;
            }
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop a database made by [`Self::create_unique`].
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let postgres_conn = Database::connect(&self.config.postgres_url()).await?;

        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            self.config.database
        );
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
            .ok();

        let drop_db = format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database);
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, drop_db))
            .await?;
        postgres_conn.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }

    /// Insert an approved account.
    pub async fn insert_user(
        &self,
        full_name: &str,
        role: UserRole,
        address: Option<&str>,
    ) -> Result<user_account::Model, DbErr> {
        let id = IdGenerator::new().generate();
        user_account::ActiveModel {
            id: Set(id.clone()),
            full_name: Set(full_name.to_string()),
            email: Set(format!("{id}@example.org")),
            phone_number: Set(None),
            address: Set(address.map(String::from)),
            role: Set(role),
            status: Set(AccountStatus::Approved),
            profile_img: Set(None),
            password_hash: Set(None),
            token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a donation awaiting review.
    pub async fn insert_pending_donation(
        &self,
        donor_id: &str,
        title: &str,
    ) -> Result<food_donation::Model, DbErr> {
        food_donation::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            user_id: Set(donor_id.to_string()),
            title: Set(title.to_string()),
            description: Set(None),
            food_type: Set("produce".to_string()),
            quantity: Set("1 box".to_string()),
            expiration_date: Set(None),
            location_address: Set(None),
            location_lat: Set(None),
            location_lng: Set(None),
            pickup_time_start: Set(None),
            pickup_time_end: Set(None),
            contact_method: Set(None),
            contact_info: Set(None),
            images: Set(json!([])),
            dietary_info: Set(None),
            allergens: Set(None),
            storage_instructions: Set(None),
            approval_status: Set(ApprovalStatus::Pending),
            status: Set(DonationStatus::Available),
            views_count: Set(0),
            approved_at: Set(None),
            approved_by: Set(None),
            rejection_reason: Set(None),
            assigned_to_user_id: Set(None),
            assigned_at: Set(None),
            assigned_by: Set(None),
            assignment_notes: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.conn)
        .await
    }
}
