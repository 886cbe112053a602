//! Device service.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use afrec_common::{AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key};
use afrec_db::{
    entities::{
        device::{self, DeviceStatus, FuelType, PublicFunding, VolumeEvidence, YesNo},
        device_document::{self, DocumentKind},
        user,
    },
    repositories::{DeviceDocumentRepository, DeviceRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::notifier::{StatusChangeNotifier, StatusWatch};

/// Maximum uploaded document size (50MB)
pub const MAX_DOCUMENT_SIZE: usize = 50 * 1024 * 1024;

/// Regulatory document slot on the device record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatorySlot {
    ProductionFacilityRegistration,
    DeclarationOfOwnership,
    MeteringEvidence,
    SingleLineDiagram,
    ProjectPhotos,
}

impl RegulatorySlot {
    /// Storage category for this slot, used in key partitioning.
    #[must_use]
    pub const fn storage_category(self) -> &'static str {
        match self {
            Self::ProductionFacilityRegistration => "device_documents/facility_registration",
            Self::DeclarationOfOwnership => "device_documents/ownership_declaration",
            Self::MeteringEvidence => "device_documents/metering_evidence",
            Self::SingleLineDiagram => "device_documents/single_line_diagram",
            Self::ProjectPhotos => "device_documents/project_photos",
        }
    }
}

/// Input for registering a new device.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceInput {
    #[validate(length(min = 1, max = 255))]
    pub device_name: String,

    #[validate(length(min = 1, max = 255))]
    pub issuer_organisation: String,

    #[validate(length(max = 255))]
    pub default_account_code: Option<String>,

    pub fuel_type: FuelType,

    #[validate(length(min = 1, max = 10))]
    pub technology_type: String,

    pub capacity: Decimal,

    pub commissioning_date: Option<NaiveDate>,

    pub effective_date: Option<NaiveDate>,

    #[validate(length(min = 1))]
    pub address: String,

    #[validate(length(min = 1, max = 100))]
    pub country: String,

    pub latitude: Decimal,

    pub longitude: Decimal,

    #[serde(default = "default_postcode")]
    #[validate(length(max = 20))]
    pub postcode: String,

    pub meter_ids: Option<String>,
    pub network_owner: Option<String>,
    pub connection_voltage: Option<String>,
    pub grid_connection_details: Option<String>,
    pub volume_evidence_type: Option<VolumeEvidence>,
    pub volume_evidence_other: Option<String>,
    pub carbon_offset_registration: Option<String>,
    pub labelling_scheme: Option<String>,

    #[serde(default)]
    pub public_funding: PublicFunding,

    pub funding_end_date: Option<NaiveDate>,

    #[serde(default)]
    pub onsite_consumer: YesNo,

    pub onsite_consumer_details: Option<String>,

    #[serde(default)]
    pub auxiliary_energy: YesNo,

    pub auxiliary_energy_details: Option<String>,
    pub electricity_import_details: Option<String>,
    pub additional_notes: Option<String>,
}

fn default_postcode() -> String {
    "000000".to_string()
}

/// Input for updating a device. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceInput {
    #[validate(length(min = 1, max = 255))]
    pub device_name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub issuer_organisation: Option<String>,

    pub default_account_code: Option<Option<String>>,

    pub fuel_type: Option<FuelType>,

    #[validate(length(min = 1, max = 10))]
    pub technology_type: Option<String>,

    pub capacity: Option<Decimal>,
    pub commissioning_date: Option<Option<NaiveDate>>,
    pub effective_date: Option<Option<NaiveDate>>,

    #[validate(length(min = 1))]
    pub address: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,

    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,

    #[validate(length(max = 20))]
    pub postcode: Option<String>,

    pub meter_ids: Option<Option<String>>,
    pub network_owner: Option<Option<String>>,
    pub connection_voltage: Option<Option<String>>,
    pub grid_connection_details: Option<Option<String>>,
    pub volume_evidence_type: Option<Option<VolumeEvidence>>,
    pub volume_evidence_other: Option<Option<String>>,
    pub carbon_offset_registration: Option<Option<String>>,
    pub labelling_scheme: Option<Option<String>>,
    pub public_funding: Option<PublicFunding>,
    pub funding_end_date: Option<Option<NaiveDate>>,
    pub onsite_consumer: Option<YesNo>,
    pub onsite_consumer_details: Option<Option<String>>,
    pub auxiliary_energy: Option<YesNo>,
    pub auxiliary_energy_details: Option<Option<String>>,
    pub electricity_import_details: Option<Option<String>>,
    pub additional_notes: Option<Option<String>>,

    /// Owners move Draft -> Submitted here; reviewers use the review path.
    pub status: Option<DeviceStatus>,
}

/// Input for uploading a document.
pub struct UploadDocumentInput {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Result of a device save, surfacing the status-change flag.
#[derive(Debug)]
pub struct DeviceSaveResult {
    pub device: device::Model,
    pub status_changed: bool,
    pub previous_status: DeviceStatus,
}

/// Device service for business logic.
#[derive(Clone)]
pub struct DeviceService {
    device_repo: DeviceRepository,
    document_repo: DeviceDocumentRepository,
    user_repo: UserRepository,
    notifier: StatusChangeNotifier,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl DeviceService {
    /// Create a new device service.
    pub fn new(
        device_repo: DeviceRepository,
        document_repo: DeviceDocumentRepository,
        user_repo: UserRepository,
        notifier: StatusChangeNotifier,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            device_repo,
            document_repo,
            user_repo,
            notifier,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new device for `owner`.
    ///
    /// First save of the record: triggers only the "created" notification
    /// path (administrator event email), never a status-change email.
    pub async fn create(
        &self,
        owner: &user::Model,
        input: CreateDeviceInput,
    ) -> AppResult<device::Model> {
        input.validate()?;
        validate_technology(input.fuel_type, &input.technology_type)?;
        validate_geography(input.capacity, input.latitude, input.longitude)?;

        let model = device::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(owner.id.clone()),
            status: Set(DeviceStatus::Draft),
            device_name: Set(input.device_name),
            issuer_organisation: Set(input.issuer_organisation),
            default_account_code: Set(input.default_account_code),
            fuel_type: Set(input.fuel_type),
            technology_type: Set(input.technology_type),
            capacity: Set(input.capacity),
            commissioning_date: Set(input.commissioning_date),
            effective_date: Set(input.effective_date),
            address: Set(input.address),
            country: Set(input.country),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            postcode: Set(input.postcode),
            meter_ids: Set(input.meter_ids),
            network_owner: Set(input.network_owner),
            connection_voltage: Set(input.connection_voltage),
            grid_connection_details: Set(input.grid_connection_details),
            volume_evidence_type: Set(input.volume_evidence_type),
            volume_evidence_other: Set(input.volume_evidence_other),
            carbon_offset_registration: Set(input.carbon_offset_registration),
            labelling_scheme: Set(input.labelling_scheme),
            public_funding: Set(input.public_funding),
            funding_end_date: Set(input.funding_end_date),
            onsite_consumer: Set(input.onsite_consumer),
            onsite_consumer_details: Set(input.onsite_consumer_details),
            auxiliary_energy: Set(input.auxiliary_energy),
            auxiliary_energy_details: Set(input.auxiliary_energy_details),
            electricity_import_details: Set(input.electricity_import_details),
            production_facility_registration: Set(None),
            declaration_of_ownership: Set(None),
            metering_evidence: Set(None),
            single_line_diagram: Set(None),
            project_photos: Set(None),
            additional_notes: Set(input.additional_notes),
            rejection_reason: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let device = self.device_repo.create(model).await?;

        self.notifier.device_created(owner, &device).await?;

        Ok(device)
    }

    /// Get a device, enforcing ownership (staff may read any device).
    pub async fn get(&self, actor: &user::Model, device_id: &str) -> AppResult<device::Model> {
        let device = self.device_repo.get_by_id(device_id).await?;
        ensure_owner(actor, &device)?;
        Ok(device)
    }

    /// List devices owned by `user_id`.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<device::Model>> {
        self.device_repo.find_by_user(user_id, limit, offset).await
    }

    /// List devices for the administrative console.
    pub async fn list_all(
        &self,
        filter: &afrec_db::repositories::DeviceFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<device::Model>> {
        self.device_repo.list(filter, limit, offset).await
    }

    /// Count devices matching an admin filter.
    pub async fn count_all(
        &self,
        filter: &afrec_db::repositories::DeviceFilter,
    ) -> AppResult<u64> {
        self.device_repo.count(filter).await
    }

    /// Update a device.
    ///
    /// The save path caches the stored status, compares it to the status about
    /// to be written and, when they differ, fans out the status-change
    /// notifications after the write.
    pub async fn update(
        &self,
        actor: &user::Model,
        device_id: &str,
        input: UpdateDeviceInput,
    ) -> AppResult<DeviceSaveResult> {
        input.validate()?;

        let existing = self.device_repo.get_by_id(device_id).await?;
        ensure_owner(actor, &existing)?;

        let fuel = input.fuel_type.unwrap_or(existing.fuel_type);
        let technology = input
            .technology_type
            .clone()
            .unwrap_or_else(|| existing.technology_type.clone());
        validate_technology(fuel, &technology)?;
        validate_geography(
            input.capacity.unwrap_or(existing.capacity),
            input.latitude.unwrap_or(existing.latitude),
            input.longitude.unwrap_or(existing.longitude),
        )?;

        let previous_status = existing.status;
        let mut watch = StatusWatch::new(existing.status);
        let next_status = input.status.unwrap_or(existing.status);
        let status_changed = watch.observe(next_status);

        let mut active: device::ActiveModel = existing.into();

        if let Some(v) = input.device_name {
            active.device_name = Set(v);
        }
        if let Some(v) = input.issuer_organisation {
            active.issuer_organisation = Set(v);
        }
        if let Some(v) = input.default_account_code {
            active.default_account_code = Set(v);
        }
        if let Some(v) = input.fuel_type {
            active.fuel_type = Set(v);
        }
        if let Some(v) = input.technology_type {
            active.technology_type = Set(v);
        }
        if let Some(v) = input.capacity {
            active.capacity = Set(v);
        }
        if let Some(v) = input.commissioning_date {
            active.commissioning_date = Set(v);
        }
        if let Some(v) = input.effective_date {
            active.effective_date = Set(v);
        }
        if let Some(v) = input.address {
            active.address = Set(v);
        }
        if let Some(v) = input.country {
            active.country = Set(v);
        }
        if let Some(v) = input.latitude {
            active.latitude = Set(v);
        }
        if let Some(v) = input.longitude {
            active.longitude = Set(v);
        }
        if let Some(v) = input.postcode {
            active.postcode = Set(v);
        }
        if let Some(v) = input.meter_ids {
            active.meter_ids = Set(v);
        }
        if let Some(v) = input.network_owner {
            active.network_owner = Set(v);
        }
        if let Some(v) = input.connection_voltage {
            active.connection_voltage = Set(v);
        }
        if let Some(v) = input.grid_connection_details {
            active.grid_connection_details = Set(v);
        }
        if let Some(v) = input.volume_evidence_type {
            active.volume_evidence_type = Set(v);
        }
        if let Some(v) = input.volume_evidence_other {
            active.volume_evidence_other = Set(v);
        }
        if let Some(v) = input.carbon_offset_registration {
            active.carbon_offset_registration = Set(v);
        }
        if let Some(v) = input.labelling_scheme {
            active.labelling_scheme = Set(v);
        }
        if let Some(v) = input.public_funding {
            active.public_funding = Set(v);
        }
        if let Some(v) = input.funding_end_date {
            active.funding_end_date = Set(v);
        }
        if let Some(v) = input.onsite_consumer {
            active.onsite_consumer = Set(v);
        }
        if let Some(v) = input.onsite_consumer_details {
            active.onsite_consumer_details = Set(v);
        }
        if let Some(v) = input.auxiliary_energy {
            active.auxiliary_energy = Set(v);
        }
        if let Some(v) = input.auxiliary_energy_details {
            active.auxiliary_energy_details = Set(v);
        }
        if let Some(v) = input.electricity_import_details {
            active.electricity_import_details = Set(v);
        }
        if let Some(v) = input.additional_notes {
            active.additional_notes = Set(v);
        }
        active.status = Set(next_status);
        active.updated_at = Set(Some(Utc::now().into()));

        let device = self.device_repo.update(active).await?;

        if status_changed {
            let owner = self.user_repo.get_by_id(&device.user_id).await?;
            self.notifier
                .device_status_changed(&owner, &device, previous_status, next_status)
                .await?;
        }

        Ok(DeviceSaveResult {
            device,
            status_changed,
            previous_status,
        })
    }

    /// Submit a draft device for review.
    pub async fn submit(&self, actor: &user::Model, device_id: &str) -> AppResult<DeviceSaveResult> {
        self.update(
            actor,
            device_id,
            UpdateDeviceInput {
                status: Some(DeviceStatus::Submitted),
                ..UpdateDeviceInput::default()
            },
        )
        .await
    }

    /// Review a device (staff only): set its status and, on rejection, the
    /// reason shown to the owner.
    pub async fn review(
        &self,
        reviewer: &user::Model,
        device_id: &str,
        status: DeviceStatus,
        rejection_reason: Option<String>,
    ) -> AppResult<DeviceSaveResult> {
        if !reviewer.is_staff {
            return Err(AppError::Forbidden("Reviewer access required".to_string()));
        }

        let existing = self.device_repo.get_by_id(device_id).await?;
        let previous_status = existing.status;
        let mut watch = StatusWatch::new(existing.status);
        let status_changed = watch.observe(status);

        let mut active: device::ActiveModel = existing.into();
        active.status = Set(status);
        if status == DeviceStatus::Rejected {
            active.rejection_reason = Set(rejection_reason);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let device = self.device_repo.update(active).await?;

        if status_changed {
            let owner = self.user_repo.get_by_id(&device.user_id).await?;
            self.notifier
                .device_status_changed(&owner, &device, previous_status, status)
                .await?;
        }

        Ok(DeviceSaveResult {
            device,
            status_changed,
            previous_status,
        })
    }

    /// Delete a device and its attached documents.
    pub async fn delete(&self, actor: &user::Model, device_id: &str) -> AppResult<()> {
        let device = self.device_repo.get_by_id(device_id).await?;
        ensure_owner(actor, &device)?;

        for document in self.document_repo.find_by_device(device_id).await? {
            self.storage.delete(&document.storage_key).await?;
        }

        self.device_repo.delete(device).await
    }

    /// Upload a file into one of the five regulatory slots on the device.
    pub async fn upload_slot(
        &self,
        actor: &user::Model,
        device_id: &str,
        slot: RegulatorySlot,
        input: UploadDocumentInput,
    ) -> AppResult<device::Model> {
        let device = self.device_repo.get_by_id(device_id).await?;
        ensure_owner(actor, &device)?;
        validate_upload(&input)?;

        let key = generate_storage_key(slot.storage_category(), &input.name);
        let stored = self
            .storage
            .store(&key, &input.data, &input.content_type)
            .await?;

        let mut active: device::ActiveModel = device.into();
        match slot {
            RegulatorySlot::ProductionFacilityRegistration => {
                active.production_facility_registration = Set(Some(stored.url));
            }
            RegulatorySlot::DeclarationOfOwnership => {
                active.declaration_of_ownership = Set(Some(stored.url));
            }
            RegulatorySlot::MeteringEvidence => {
                active.metering_evidence = Set(Some(stored.url));
            }
            RegulatorySlot::SingleLineDiagram => {
                active.single_line_diagram = Set(Some(stored.url));
            }
            RegulatorySlot::ProjectPhotos => {
                active.project_photos = Set(Some(stored.url));
            }
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.device_repo.update(active).await
    }

    /// Attach a supplementary document to a device.
    pub async fn add_document(
        &self,
        actor: &user::Model,
        device_id: &str,
        kind: DocumentKind,
        input: UploadDocumentInput,
    ) -> AppResult<device_document::Model> {
        let device = self.device_repo.get_by_id(device_id).await?;
        ensure_owner(actor, &device)?;
        validate_upload(&input)?;

        let category = format!("device_documents/{}", kind.code());
        let key = generate_storage_key(&category, &input.name);
        let stored = self
            .storage
            .store(&key, &input.data, &input.content_type)
            .await?;

        let model = device_document::ActiveModel {
            id: Set(self.id_gen.generate()),
            device_id: Set(device.id),
            document_type: Set(kind),
            name: Set(input.name),
            content_type: Set(input.content_type),
            size: Set(input.data.len() as i64),
            url: Set(stored.url),
            storage_key: Set(stored.key),
            uploaded_at: Set(Utc::now().into()),
        };

        self.document_repo.create(model).await
    }

    /// List the supplementary documents attached to a device.
    pub async fn documents(
        &self,
        actor: &user::Model,
        device_id: &str,
    ) -> AppResult<Vec<device_document::Model>> {
        let device = self.device_repo.get_by_id(device_id).await?;
        ensure_owner(actor, &device)?;
        self.document_repo.find_by_device(device_id).await
    }

    /// Remove a supplementary document and its stored file.
    pub async fn delete_document(
        &self,
        actor: &user::Model,
        document_id: &str,
    ) -> AppResult<()> {
        let document = self.document_repo.get_by_id(document_id).await?;
        let device = self.device_repo.get_by_id(&document.device_id).await?;
        ensure_owner(actor, &device)?;

        self.storage.delete(&document.storage_key).await?;
        self.document_repo.delete(document).await
    }
}

fn ensure_owner(actor: &user::Model, device: &device::Model) -> AppResult<()> {
    if actor.is_staff || actor.id == device.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Device belongs to another user".to_string(),
        ))
    }
}

/// Validate the technology code against the fuel type's allowed set.
pub fn validate_technology(fuel: FuelType, technology: &str) -> AppResult<()> {
    if fuel.allows_technology(technology) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Invalid technology for selected fuel type".to_string(),
        ))
    }
}

fn validate_geography(capacity: Decimal, latitude: Decimal, longitude: Decimal) -> AppResult<()> {
    if capacity <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Capacity must be greater than zero".to_string(),
        ));
    }
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err(AppError::Validation(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err(AppError::Validation(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

fn validate_upload(input: &UploadDocumentInput) -> AppResult<()> {
    if input.data.is_empty() {
        return Err(AppError::BadRequest("File is empty".to_string()));
    }
    if input.data.len() > MAX_DOCUMENT_SIZE {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {MAX_DOCUMENT_SIZE} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::EmailService;
    use afrec_common::LocalStorage;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::path::PathBuf;

    fn disabled_notifier() -> StatusChangeNotifier {
        StatusChangeNotifier::new(
            EmailService::new(None),
            Vec::new(),
            "https://app.example".to_string(),
            Vec::new(),
        )
    }

    fn test_storage() -> Arc<dyn StorageBackend> {
        Arc::new(LocalStorage::new(
            PathBuf::from("/tmp/afrec-test-media"),
            "/media".to_string(),
        ))
    }

    fn make_service(db: Arc<sea_orm::DatabaseConnection>) -> DeviceService {
        DeviceService::new(
            DeviceRepository::new(Arc::clone(&db)),
            DeviceDocumentRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
            disabled_notifier(),
            test_storage(),
        )
    }

    fn make_owner(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "owner".to_string(),
            username_lower: "owner".to_string(),
            email: "owner@example.com".to_string(),
            name: None,
            country: None,
            token: None,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn make_device(id: &str, owner_id: &str, status: DeviceStatus) -> device::Model {
        device::Model {
            id: id.to_string(),
            user_id: owner_id.to_string(),
            status,
            device_name: "Lusaka Solar One".to_string(),
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

    fn base_input() -> CreateDeviceInput {
        CreateDeviceInput {
            device_name: "Lusaka Solar One".to_string(),
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
            additional_notes: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_wrong_technology_for_fuel() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = make_service(db);
        let owner = make_owner("user1");

        let input = CreateDeviceInput {
            technology_type: "TC210".to_string(), // wind code on a solar device
            ..base_input()
        };

        let result = service.create(&owner, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_latitude() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = make_service(db);
        let owner = make_owner("user1");

        let input = CreateDeviceInput {
            latitude: Decimal::from(91),
            ..base_input()
        };

        let result = service.create(&owner, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_with_unchanged_status_does_not_flag_change() {
        let existing = make_device("dev1", "user1", DeviceStatus::Draft);
        let saved = make_device("dev1", "user1", DeviceStatus::Draft);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[saved]])
                .into_connection(),
        );
        let service = make_service(db);
        let owner = make_owner("user1");

        let result = service
            .update(&owner, "dev1", UpdateDeviceInput::default())
            .await
            .unwrap();

        assert!(!result.status_changed);
        assert_eq!(result.previous_status, DeviceStatus::Draft);
    }

    #[tokio::test]
    async fn update_with_new_status_flags_change_once() {
        let existing = make_device("dev1", "user1", DeviceStatus::Draft);
        let saved = make_device("dev1", "user1", DeviceStatus::Submitted);
        let owner_row = make_owner("user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[saved]])
                .append_query_results([[owner_row]])
                .into_connection(),
        );
        let service = make_service(db);
        let owner = make_owner("user1");

        let result = service.submit(&owner, "dev1").await.unwrap();

        assert!(result.status_changed);
        assert_eq!(result.previous_status, DeviceStatus::Draft);
        assert_eq!(result.device.status, DeviceStatus::Submitted);
    }

    #[tokio::test]
    async fn update_rejects_foreign_device() {
        let existing = make_device("dev1", "someone-else", DeviceStatus::Draft);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = make_service(db);
        let actor = make_owner("user1");

        let result = service
            .update(&actor, "dev1", UpdateDeviceInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn review_requires_staff() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = make_service(db);
        let actor = make_owner("user1");

        let result = service
            .review(&actor, "dev1", DeviceStatus::Approved, None)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
