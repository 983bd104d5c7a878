//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use civica_common::{AppError, AppResult, IdGenerator};
use civica_db::{
    entities::{reward_account, user},
    repositories::{RewardAccountRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    reward_repo: RewardAccountRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 128))]
    pub name: Option<String>,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, reward_repo: RewardAccountRepository) -> Self {
        Self {
            user_repo,
            reward_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new citizen account.
    ///
    /// Creates the user row and its reward account in one go, so the
    /// lifecycle engine can always assume the ledger exists.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        // Check if username is taken
        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        // Hash password
        let password_hash = hash_password(&input.password)?;

        // Generate token and user ID
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email),
            password: Set(Some(password_hash)),
            token: Set(Some(token)),
            name: Set(input.name),
            is_official: Set(false),
            is_admin: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(user_model).await?;

        let account_model = reward_account::ActiveModel {
            user_id: Set(user_id),
            points: Set(0),
            spam_count: Set(0),
            contributions: Set(0),
            frozen: Set(false),
            freeze_until: Set(None),
            updated_at: Set(chrono::Utc::now().into()),
        };

        self.reward_repo.create(account_model).await?;

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, input: LoginInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_hash = user.password.clone().ok_or(AppError::Unauthorized)?;
        if !verify_password(&input.password, &password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Log in and return the user's access token, minting one if missing.
    pub async fn login(&self, input: LoginInput) -> AppResult<(user::Model, String)> {
        let user = self.authenticate(input).await?;

        if let Some(token) = user.token.clone() {
            return Ok((user, token));
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        Ok((user, token))
    }

    /// Get a user's reward account.
    pub async fn reward_account(&self, user_id: &str) -> AppResult<reward_account::Model> {
        self.reward_repo.get_by_user_id(user_id).await
    }
}

/// Hash a password with argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a password against an argon2 hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{username}@example.com"),
            password: None,
            token: Some("test_token".to_string()),
            name: None,
            is_official: false,
            is_admin: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> UserService {
        UserService::new(
            UserRepository::new(Arc::clone(&db)),
            RewardAccountRepository::new(db),
        )
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            username: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();

        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let user = create_test_user("user1", "citizen");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.authenticate_by_token("test_token").await.unwrap();

        assert_eq!(result.id, "user1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.authenticate_by_token("unknown").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
