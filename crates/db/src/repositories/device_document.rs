//! Device document repository.

use std::sync::Arc;

use crate::entities::{DeviceDocument, device_document};
use afrec_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// Device document repository for database operations.
#[derive(Clone)]
pub struct DeviceDocumentRepository {
    db: Arc<DatabaseConnection>,
}

impl DeviceDocumentRepository {
    /// Create a new device document repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a document by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<device_document::Model>> {
        DeviceDocument::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a document by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<device_document::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id}")))
    }

    /// List documents attached to a device.
    pub async fn find_by_device(&self, device_id: &str) -> AppResult<Vec<device_document::Model>> {
        DeviceDocument::find()
            .filter(device_document::Column::DeviceId.eq(device_id))
            .order_by_desc(device_document::Column::UploadedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new document record.
    pub async fn create(
        &self,
        model: device_document::ActiveModel,
    ) -> AppResult<device_document::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a document record.
    pub async fn delete(&self, model: device_document::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
