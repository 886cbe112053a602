//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use afrec_common::{AppError, AppResult, IdGenerator};
use afrec_db::{
    entities::{password_reset, user, user_profile},
    repositories::{PasswordResetRepository, UserProfileRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::notifier::StatusChangeNotifier;

/// Password reset tokens expire after 24 hours.
const RESET_TOKEN_TTL_HOURS: i64 = 24;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    reset_repo: PasswordResetRepository,
    notifier: StatusChangeNotifier,
    id_gen: IdGenerator,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 256))]
    pub name: Option<String>,

    pub country: Option<user::Country>,
}

/// Input for updating a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(max = 256))]
    pub name: Option<String>,

    /// None = unchanged, Some(None) = clear the country.
    pub country: Option<Option<user::Country>>,
}

/// Input for changing a password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        reset_repo: PasswordResetRepository,
        notifier: StatusChangeNotifier,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            reset_repo,
            notifier,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    ///
    /// First save of the record: triggers the "created" notification path
    /// (welcome email with onboarding attachments + administrator event).
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();
        let now = Utc::now();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email),
            name: Set(input.name),
            country: Set(input.country),
            token: Set(Some(token)),
            is_staff: Set(false),
            is_superuser: Set(false),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(Some(password_hash)),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        self.profile_repo.create(profile_model).await?;

        self.notifier.user_registered(&user).await?;

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        let profile = self.profile_repo.get_by_user_id(&user.id).await?;
        let hash = profile.password.as_deref().ok_or(AppError::Unauthorized)?;

        if !verify_password(password, hash) {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        Ok(user)
    }

    /// Update profile attributes.
    pub async fn update(&self, user_id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(country) = input.country {
            active.country = Set(country);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Change the password, verifying the current one first.
    pub async fn change_password(
        &self,
        user_id: &str,
        input: ChangePasswordInput,
    ) -> AppResult<()> {
        input.validate()?;

        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        let hash = profile.password.as_deref().ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.current_password, hash) {
            return Err(AppError::Unauthorized);
        }

        let new_hash = hash_password(&input.new_password)?;
        let mut active: user_profile::ActiveModel = profile.into();
        active.password = Set(Some(new_hash));
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        Ok(())
    }

    /// Regenerate the API token, invalidating the old one.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        Ok(token)
    }

    /// List accounts for the administrative console.
    pub async fn list_accounts(
        &self,
        filter: &afrec_db::repositories::UserFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(filter, limit, offset).await
    }

    /// Count accounts matching an admin filter.
    pub async fn count_accounts(
        &self,
        filter: &afrec_db::repositories::UserFilter,
    ) -> AppResult<u64> {
        self.user_repo.count(filter).await
    }

    /// Start a password reset for the account behind `email`.
    ///
    /// Always returns Ok for unknown addresses so the endpoint does not leak
    /// which emails are registered. A failed send is logged, not surfaced.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let now = Utc::now();
        let token = self.id_gen.generate_token();
        let model = password_reset::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            token: Set(token.clone()),
            created_at: Set(now.into()),
            expires_at: Set((now + Duration::hours(RESET_TOKEN_TTL_HOURS)).into()),
            used_at: Set(None),
        };
        self.reset_repo.create(model).await?;

        self.notifier.password_reset_requested(&user, &token).await
    }

    /// Complete a password reset with a previously issued token.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let reset = self
            .reset_repo
            .find_by_token(token)
            .await?
            .filter(|r| r.is_usable(Utc::now()))
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let profile = self.profile_repo.get_by_user_id(&reset.user_id).await?;
        let new_hash = hash_password(new_password)?;

        let mut active: user_profile::ActiveModel = profile.into();
        active.password = Set(Some(new_hash));
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        self.reset_repo.mark_used(reset).await?;

        Ok(())
    }
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against an Argon2 hash.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::EmailService;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-hash"));
    }

    fn disabled_notifier() -> StatusChangeNotifier {
        StatusChangeNotifier::new(
            EmailService::new(None),
            Vec::new(),
            "https://app.example".to_string(),
            Vec::new(),
        )
    }

    fn make_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "kuda".to_string(),
            username_lower: "kuda".to_string(),
            email: "kuda@example.com".to_string(),
            name: None,
            country: Some(user::Country::Malawi),
            token: Some("token".to_string()),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_taken_username() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[make_user("existing")]])
                .into_connection(),
        );
        let db2 = Arc::clone(&db);

        let service = UserService::new(
            UserRepository::new(db),
            UserProfileRepository::new(Arc::clone(&db2)),
            PasswordResetRepository::new(db2),
            disabled_notifier(),
        );

        let result = service
            .create(CreateUserInput {
                username: "kuda".to_string(),
                email: "kuda@example.com".to_string(),
                password: "longenough".to_string(),
                name: None,
                country: None,
            })
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("Username")),
            _ => panic!("Expected BadRequest for taken username"),
        }
    }

    #[tokio::test]
    async fn create_rejects_short_password() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );
        let db2 = Arc::clone(&db);

        let service = UserService::new(
            UserRepository::new(db),
            UserProfileRepository::new(Arc::clone(&db2)),
            PasswordResetRepository::new(db2),
            disabled_notifier(),
        );

        let result = service
            .create(CreateUserInput {
                username: "kuda".to_string(),
                email: "kuda@example.com".to_string(),
                password: "short".to_string(),
                name: None,
                country: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_email_reset_request_is_silent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let db2 = Arc::clone(&db);

        let service = UserService::new(
            UserRepository::new(db),
            UserProfileRepository::new(Arc::clone(&db2)),
            PasswordResetRepository::new(db2),
            disabled_notifier(),
        );

        assert!(service.request_password_reset("nobody@example.com").await.is_ok());
    }
}
