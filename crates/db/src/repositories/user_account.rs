//! User account repository.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseBackend, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Statement,
};
use serde::Serialize;

use super::{contains_ci, same_address};
use crate::entities::{
    user_account::{self, AccountStatus, UserRole},
    UserAccount,
};

const ADDRESS_COLUMN: &str = "\"user_account\".\"address\"";

/// Residents grouped by normalized address.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct AddressCount {
    /// `LOWER(TRIM(address))`
    pub address: String,
    pub residents: i64,
}

/// Repository for user account operations.
#[derive(Clone)]
pub struct UserAccountRepository {
    db: Arc<DatabaseConnection>,
}

impl UserAccountRepository {
    /// Create a new user account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user_account::Model>> {
        UserAccount::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user_account::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    /// Find users by IDs. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user_account::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        UserAccount::find()
            .filter(user_account::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user_account::Model>> {
        UserAccount::find()
            .filter(email_equals_ci(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an approved user by session token. A token outlives a later
    /// status change, so accounts no longer approved never resolve.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user_account::Model>> {
        UserAccount::find()
            .filter(user_account::Column::Token.eq(token))
            .filter(user_account::Column::Status.eq(AccountStatus::Approved))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user_account::ActiveModel) -> AppResult<user_account::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Residents whose normalized address equals `address`, newest first.
    pub async fn find_residents_at_address(
        &self,
        address: &str,
        search: Option<&str>,
        status: Option<AccountStatus>,
    ) -> AppResult<Vec<user_account::Model>> {
        let mut query = UserAccount::find()
            .filter(user_account::Column::Role.eq(UserRole::Resident))
            .filter(same_address(ADDRESS_COLUMN, address));

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci((UserAccount, user_account::Column::FullName), search))
                    .add(contains_ci((UserAccount, user_account::Column::Email), search))
                    .add(contains_ci((UserAccount, user_account::Column::PhoneNumber), search)),
            );
        }

        if let Some(status) = status {
            query = query.filter(user_account::Column::Status.eq(status));
        }

        query
            .order_by_desc(user_account::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count residents at `address`, ignoring search and status.
    pub async fn count_residents_at_address(&self, address: &str) -> AppResult<u64> {
        UserAccount::find()
            .filter(user_account::Column::Role.eq(UserRole::Resident))
            .filter(same_address(ADDRESS_COLUMN, address))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every distinct normalized resident address with its resident count.
    pub async fn resident_address_counts(&self) -> AppResult<Vec<AddressCount>> {
        AddressCount::find_by_statement(Statement::from_string(
            DatabaseBackend::Postgres,
            r"
            SELECT LOWER(TRIM(address)) AS address, COUNT(*) AS residents
            FROM user_account
            WHERE role = 'resident' AND address IS NOT NULL AND TRIM(address) <> ''
            GROUP BY LOWER(TRIM(address))
            ORDER BY residents DESC, address
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn email_equals_ci(email: &str) -> sea_orm::sea_query::SimpleExpr {
    use sea_orm::sea_query::{Expr, Func};
    Expr::expr(Func::lower(Expr::col((UserAccount, user_account::Column::Email))))
        .eq(email.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn create_test_user(id: &str, name: &str, role: UserRole) -> user_account::Model {
        user_account::Model {
            id: id.to_string(),
            full_name: name.to_string(),
            email: format!("{id}@example.org"),
            phone_number: None,
            address: Some("12 Mango St".to_string()),
            role,
            status: AccountStatus::Approved,
            profile_img: None,
            password_hash: None,
            token: Some(format!("tok-{id}")),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_token_returns_user() {
        let officer = create_test_user("o1", "Olive Officer", UserRole::TeamOfficer);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[officer.clone()]])
                .into_connection(),
        );

        let repo = UserAccountRepository::new(Arc::clone(&db));
        let found = repo.find_by_token("tok-o1").await.unwrap().unwrap();

        assert_eq!(found.id, "o1");
        assert!(found.is_officer());
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        let (_, predicate) = sql.split_once("WHERE").unwrap();
        assert!(predicate.contains("token"));
        assert!(predicate.contains("status"));
        assert!(sql.contains("approved"));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_account::Model>::new()])
                .into_connection(),
        );

        let repo = UserAccountRepository::new(db);
        let err = repo.get_by_id("missing").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserAccountRepository::new(db);
        let users = repo.find_by_ids(&[]).await.unwrap();

        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_find_residents_at_address_filters_role_and_address() {
        let r1 = create_test_user("r1", "Rosa Resident", UserRole::Resident);

        let mock = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[r1]])
            .into_connection();
        let db = Arc::new(mock);

        let repo = UserAccountRepository::new(Arc::clone(&db));
        let residents = repo
            .find_residents_at_address(" 12 MANGO st ", Some("rosa"), None)
            .await
            .unwrap();
        assert_eq!(residents.len(), 1);
        drop(repo);

        let db = Arc::try_unwrap(db).ok().unwrap();
        let log = db.into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("LOWER(TRIM(\\\"user_account\\\".\\\"address\\\"))"));
        assert!(sql.contains("resident"));
    }

    #[tokio::test]
    async fn test_count_residents_at_address() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(4)),
                }]])
                .into_connection(),
        );

        let repo = UserAccountRepository::new(db);
        assert_eq!(repo.count_residents_at_address("12 Mango St").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_resident_address_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "address" => Value::String(Some(Box::new("12 mango st".to_string()))),
                        "residents" => Value::BigInt(Some(3)),
                    },
                    maplit::btreemap! {
                        "address" => Value::String(Some(Box::new("12 mango st.".to_string()))),
                        "residents" => Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let repo = UserAccountRepository::new(db);
        let counts = repo.resident_address_counts().await.unwrap();

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].residents, 3);
        assert_eq!(counts[1].address, "12 mango st.");
    }
}
