//! Officer sign-in and session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use foodify_common::{AppError, AppResult, IdGenerator};
use foodify_db::{
    entities::user_account::{self, AccountStatus},
    repositories::UserAccountRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Message for callers without officer rights.
pub const OFFICER_REQUIRED: &str = "Access denied. Team officer login required.";

/// Sign-in form.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Service for officer sessions.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserAccountRepository,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(user_repo: UserAccountRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Check credentials and issue a fresh session token.
    pub async fn signin(&self, input: SigninInput) -> AppResult<(user_account::Model, String)> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(input.email.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::Unauthorized);
        };
        if !verify_password(&input.password, hash)? {
            return Err(AppError::Unauthorized);
        }

        if !user.is_officer() {
            return Err(AppError::Forbidden(OFFICER_REQUIRED.to_string()));
        }
        if user.status != AccountStatus::Approved {
            return Err(AppError::Forbidden(
                "Your account has not been approved yet.".to_string(),
            ));
        }

        let token = self.id_gen.generate_token();
        let mut active: user_account::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "Officer signed in");
        Ok((user, token))
    }

    /// Invalidate the caller's token.
    pub async fn signout(&self, user: &user_account::Model) -> AppResult<()> {
        let mut active: user_account::ActiveModel = user.clone().into();
        active.token = Set(None);
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "Signed out");
        Ok(())
    }

    /// Resolve a session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Option<user_account::Model>> {
        if token.is_empty() {
            return Ok(None);
        }
        self.user_repo.find_by_token(token).await
    }
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use foodify_db::entities::user_account::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(role: UserRole, status: AccountStatus, password: &str) -> user_account::Model {
        user_account::Model {
            id: "u1".to_string(),
            full_name: "Olive Officer".to_string(),
            email: "olive@example.org".to_string(),
            phone_number: None,
            address: None,
            role,
            status,
            profile_img: None,
            password_hash: Some(hash_password(password).unwrap()),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn input(password: &str) -> SigninInput {
        SigninInput {
            email: "olive@example.org".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_signin_issues_token() {
        let officer = user(UserRole::TeamOfficer, AccountStatus::Approved, "secret123");
        let mut signed_in = officer.clone();
        signed_in.token = Some("tok".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[officer]])
                .append_query_results([[signed_in]])
                .into_connection(),
        );
        let service = AuthService::new(UserAccountRepository::new(db));

        let (user, token) = service.signin(input("secret123")).await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(token.len(), 32);
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let officer = user(UserRole::TeamOfficer, AccountStatus::Approved, "secret123");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[officer]])
                .into_connection(),
        );
        let service = AuthService::new(UserAccountRepository::new(db));

        let err = service.signin(input("nope")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_signin_rejects_residents() {
        let resident = user(UserRole::Resident, AccountStatus::Approved, "secret123");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[resident]])
                .into_connection(),
        );
        let service = AuthService::new(UserAccountRepository::new(db));

        let err = service.signin(input("secret123")).await.unwrap_err();
        assert_eq!(err.message(), OFFICER_REQUIRED);
    }

    #[tokio::test]
    async fn test_signin_rejects_unapproved_officer() {
        let officer = user(UserRole::Admin, AccountStatus::Pending, "secret123");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[officer]])
                .into_connection(),
        );
        let service = AuthService::new(UserAccountRepository::new(db));

        let err = service.signin(input("secret123")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_token_of_unapproved_account_does_not_resolve() {
        // The status predicate filters the row out
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_account::Model>::new()])
                .into_connection(),
        );
        let service = AuthService::new(UserAccountRepository::new(Arc::clone(&db)));

        let resolved = service.authenticate_by_token("tok").await.unwrap();
        assert!(resolved.is_none());
        drop(service);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("status"));
        assert!(sql.contains("approved"));
    }

    #[tokio::test]
    async fn test_empty_token_skips_lookup() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AuthService::new(UserAccountRepository::new(db));

        assert!(service.authenticate_by_token("").await.unwrap().is_none());
    }
}
