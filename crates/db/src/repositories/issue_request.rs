//! Issue request repository.

use std::sync::Arc;

use crate::entities::{IssueRequest, issue_request};
use afrec_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Filter options for admin issue-request listings.
#[derive(Debug, Clone, Default)]
pub struct IssueRequestFilter {
    /// Exact status match.
    pub status: Option<issue_request::IssueStatus>,
    /// Restrict to one owner.
    pub user_id: Option<String>,
    /// Restrict to one device.
    pub device_id: Option<String>,
}

/// Issue request repository for database operations.
#[derive(Clone)]
pub struct IssueRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl IssueRequestRepository {
    /// Create a new issue request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an issue request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<issue_request::Model>> {
        IssueRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an issue request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<issue_request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue request {id}")))
    }

    /// Create a new issue request.
    pub async fn create(&self, model: issue_request::ActiveModel) -> AppResult<issue_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an issue request.
    pub async fn update(&self, model: issue_request::ActiveModel) -> AppResult<issue_request::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an issue request.
    pub async fn delete(&self, model: issue_request::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List issue requests owned by one user (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<issue_request::Model>> {
        IssueRequest::find()
            .filter(issue_request::Column::UserId.eq(user_id))
            .order_by_desc(issue_request::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List issue requests for the administrative console (filtered, paginated).
    pub async fn list(
        &self,
        filter: &IssueRequestFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<issue_request::Model>> {
        self.filtered_query(filter)
            .order_by_desc(issue_request::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count issue requests matching an admin filter.
    pub async fn count(&self, filter: &IssueRequestFilter) -> AppResult<u64> {
        self.filtered_query(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn filtered_query(&self, filter: &IssueRequestFilter) -> sea_orm::Select<IssueRequest> {
        let mut condition = Condition::all();

        if let Some(status) = filter.status {
            condition = condition.add(issue_request::Column::Status.eq(status));
        }

        if let Some(ref user_id) = filter.user_id {
            condition = condition.add(issue_request::Column::UserId.eq(user_id));
        }

        if let Some(ref device_id) = filter.device_id {
            condition = condition.add(issue_request::Column::DeviceId.eq(device_id));
        }

        IssueRequest::find().filter(condition)
    }
}
