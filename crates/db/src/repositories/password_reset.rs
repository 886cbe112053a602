//! Password reset repository.

use std::sync::Arc;

use crate::entities::{PasswordReset, password_reset};
use afrec_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Password reset repository for database operations.
#[derive(Clone)]
pub struct PasswordResetRepository {
    db: Arc<DatabaseConnection>,
}

impl PasswordResetRepository {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reset record by token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<password_reset::Model>> {
        PasswordReset::find()
            .filter(password_reset::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new reset record.
    pub async fn create(
        &self,
        model: password_reset::ActiveModel,
    ) -> AppResult<password_reset::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a reset token as used.
    pub async fn mark_used(&self, model: password_reset::Model) -> AppResult<password_reset::Model> {
        let mut active: password_reset::ActiveModel = model.into();
        active.used_at = Set(Some(chrono::Utc::now().into()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
