//! Device repository.

use std::sync::Arc;

use crate::entities::{Device, device};
use afrec_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Filter options for admin device listings.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    /// Substring match against device name or address.
    pub search: Option<String>,
    /// Exact status match.
    pub status: Option<device::DeviceStatus>,
    /// Exact country match.
    pub country: Option<String>,
    /// Restrict to one owner.
    pub user_id: Option<String>,
}

/// Device repository for database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    db: Arc<DatabaseConnection>,
}

impl DeviceRepository {
    /// Create a new device repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a device by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<device::Model>> {
        Device::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a device by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<device::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::DeviceNotFound(id.to_string()))
    }

    /// Create a new device.
    pub async fn create(&self, model: device::ActiveModel) -> AppResult<device::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a device.
    pub async fn update(&self, model: device::ActiveModel) -> AppResult<device::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a device.
    pub async fn delete(&self, model: device::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List devices owned by one user (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<device::Model>> {
        Device::find()
            .filter(device::Column::UserId.eq(user_id))
            .order_by_desc(device::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List devices for the administrative console (filtered, paginated).
    pub async fn list(
        &self,
        filter: &DeviceFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<device::Model>> {
        self.filtered_query(filter)
            .order_by_desc(device::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count devices matching an admin filter.
    pub async fn count(&self, filter: &DeviceFilter) -> AppResult<u64> {
        self.filtered_query(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn filtered_query(&self, filter: &DeviceFilter) -> sea_orm::Select<Device> {
        let mut condition = Condition::all();

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"));
            condition = condition.add(
                Condition::any()
                    .add(device::Column::DeviceName.like(&pattern))
                    .add(device::Column::Address.like(&pattern)),
            );
        }

        if let Some(status) = filter.status {
            condition = condition.add(device::Column::Status.eq(status));
        }

        if let Some(ref country) = filter.country {
            condition = condition.add(device::Column::Country.eq(country));
        }

        if let Some(ref user_id) = filter.user_id {
            condition = condition.add(device::Column::UserId.eq(user_id));
        }

        Device::find().filter(condition)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::device::{DeviceStatus, FuelType, PublicFunding, YesNo};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_device(id: &str, name: &str) -> device::Model {
        device::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            status: DeviceStatus::Draft,
            device_name: name.to_string(),
            issuer_organisation: "Acme Energy".to_string(),
            default_account_code: None,
            fuel_type: FuelType::Solar,
            technology_type: "TC110".to_string(),
            capacity: Decimal::new(2_500_000, 6),
            commissioning_date: None,
            effective_date: None,
            address: "1 Plant Road".to_string(),
            country: "Zambia".to_string(),
            latitude: Decimal::new(-15_416_700, 6),
            longitude: Decimal::new(28_283_300, 6),
            postcode: "000000".to_string(),
            meter_ids: None,
            network_owner: None,
            connection_voltage: None,
            grid_connection_details: None,
            volume_evidence_type: None,
            volume_evidence_other: None,
            carbon_offset_registration: None,
            labelling_scheme: None,
            public_funding: PublicFunding::No,
            funding_end_date: None,
            onsite_consumer: YesNo::No,
            onsite_consumer_details: None,
            auxiliary_energy: YesNo::No,
            auxiliary_energy_details: None,
            electricity_import_details: None,
            production_facility_registration: None,
            declaration_of_ownership: None,
            metering_evidence: None,
            single_line_diagram: None,
            project_photos: None,
            additional_notes: None,
            rejection_reason: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<device::Model>::new()])
                .into_connection(),
        );

        let repo = DeviceRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::DeviceNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected DeviceNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let devices = vec![
            create_test_device("dev1", "Lusaka Solar One"),
            create_test_device("dev2", "Lusaka Solar Two"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([devices])
                .into_connection(),
        );

        let repo = DeviceRepository::new(db);
        let result = repo.find_by_user("user1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].device_name, "Lusaka Solar One");
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![create_test_device("dev1", "Plant")]])
                .into_connection(),
        );

        let repo = DeviceRepository::new(db);
        let filter = DeviceFilter {
            status: Some(DeviceStatus::Submitted),
            ..DeviceFilter::default()
        };
        let result = repo.list(&filter, 10, 0).await.unwrap();

        assert_eq!(result.len(), 1);
    }
}
