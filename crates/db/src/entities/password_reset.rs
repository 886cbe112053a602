//! Password reset token entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Opaque reset token sent to the user by email
    #[sea_orm(unique)]
    pub token: String,

    pub created_at: DateTimeWithTimeZone,

    /// Tokens expire 24 hours after creation
    pub expires_at: DateTimeWithTimeZone,

    /// Set once the token has been consumed
    #[sea_orm(nullable)]
    pub used_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this token can still be used at `now`.
    #[must_use]
    pub fn is_usable(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn make_token(expires_in: Duration, used: bool) -> Model {
        let now = Utc::now();
        Model {
            id: "pr1".to_string(),
            user_id: "user1".to_string(),
            token: "tok".to_string(),
            created_at: now.into(),
            expires_at: (now + expires_in).into(),
            used_at: used.then(|| now.into()),
        }
    }

    #[test]
    fn fresh_token_is_usable() {
        assert!(make_token(Duration::hours(24), false).is_usable(Utc::now()));
    }

    #[test]
    fn expired_token_is_not_usable() {
        assert!(!make_token(Duration::hours(-1), false).is_usable(Utc::now()));
    }

    #[test]
    fn used_token_is_not_usable() {
        assert!(!make_token(Duration::hours(24), true).is_usable(Utc::now()));
    }
}
