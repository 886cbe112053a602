//! Certificate issue request service.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use afrec_common::{AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key};
use afrec_db::{
    entities::{
        issue_request::{self, IssueStatus},
        user,
    },
    repositories::{DeviceRepository, IssueRequestRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::device::UploadDocumentInput;
use crate::services::notifier::{StatusChangeNotifier, StatusWatch};

/// Input for creating an issue request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequestInput {
    pub device_id: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[validate(length(max = 255))]
    pub period_of_production: Option<String>,

    pub production_amount: Decimal,

    #[validate(length(min = 1, max = 255))]
    pub recipient_account: String,

    pub notes: Option<String>,
}

/// Input for updating an issue request. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueRequestInput {
    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    pub period_of_production: Option<Option<String>>,

    pub production_amount: Option<Decimal>,

    #[validate(length(min = 1, max = 255))]
    pub recipient_account: Option<String>,

    pub notes: Option<Option<String>>,

    /// Owners move draft -> submitted here; reviewers use the review path.
    pub status: Option<IssueStatus>,
}

/// Result of an issue request save, surfacing the status-change flag.
#[derive(Debug)]
pub struct IssueRequestSaveResult {
    pub request: issue_request::Model,
    pub status_changed: bool,
    pub previous_status: IssueStatus,
}

/// Issue request service for business logic.
#[derive(Clone)]
pub struct IssueRequestService {
    request_repo: IssueRequestRepository,
    device_repo: DeviceRepository,
    user_repo: UserRepository,
    notifier: StatusChangeNotifier,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl IssueRequestService {
    /// Create a new issue request service.
    pub fn new(
        request_repo: IssueRequestRepository,
        device_repo: DeviceRepository,
        user_repo: UserRepository,
        notifier: StatusChangeNotifier,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            request_repo,
            device_repo,
            user_repo,
            notifier,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an issue request against one of the owner's devices.
    ///
    /// First save of the record: triggers only the "created" notification
    /// path (administrator event email).
    pub async fn create(
        &self,
        owner: &user::Model,
        input: CreateIssueRequestInput,
    ) -> AppResult<issue_request::Model> {
        input.validate()?;
        validate_period(input.start_date, input.end_date, input.production_amount)?;

        let device = self.device_repo.get_by_id(&input.device_id).await?;
        if device.user_id != owner.id {
            return Err(AppError::Forbidden(
                "Device belongs to another user".to_string(),
            ));
        }

        let model = issue_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            device_id: Set(device.id.clone()),
            user_id: Set(owner.id.clone()),
            status: Set(IssueStatus::Draft),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            period_of_production: Set(input.period_of_production),
            production_amount: Set(input.production_amount),
            recipient_account: Set(input.recipient_account),
            notes: Set(input.notes),
            upload_file: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let request = self.request_repo.create(model).await?;

        self.notifier
            .issue_request_created(owner, &device.device_name)
            .await?;

        Ok(request)
    }

    /// Get an issue request, enforcing ownership (staff may read any).
    pub async fn get(
        &self,
        actor: &user::Model,
        request_id: &str,
    ) -> AppResult<issue_request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;
        ensure_owner(actor, &request)?;
        Ok(request)
    }

    /// List issue requests owned by `user_id`.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<issue_request::Model>> {
        self.request_repo.find_by_user(user_id, limit, offset).await
    }

    /// List issue requests for the administrative console.
    pub async fn list_all(
        &self,
        filter: &afrec_db::repositories::IssueRequestFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<issue_request::Model>> {
        self.request_repo.list(filter, limit, offset).await
    }

    /// Count issue requests matching an admin filter.
    pub async fn count_all(
        &self,
        filter: &afrec_db::repositories::IssueRequestFilter,
    ) -> AppResult<u64> {
        self.request_repo.count(filter).await
    }

    /// Update an issue request with the status-change save path.
    pub async fn update(
        &self,
        actor: &user::Model,
        request_id: &str,
        input: UpdateIssueRequestInput,
    ) -> AppResult<IssueRequestSaveResult> {
        input.validate()?;

        let existing = self.request_repo.get_by_id(request_id).await?;
        ensure_owner(actor, &existing)?;

        validate_period(
            input.start_date.unwrap_or(existing.start_date),
            input.end_date.unwrap_or(existing.end_date),
            input.production_amount.unwrap_or(existing.production_amount),
        )?;

        let previous_status = existing.status;
        let mut watch = StatusWatch::new(existing.status);
        let next_status = input.status.unwrap_or(existing.status);
        let status_changed = watch.observe(next_status);

        let device_id = existing.device_id.clone();
        let mut active: issue_request::ActiveModel = existing.into();

        if let Some(v) = input.start_date {
            active.start_date = Set(v);
        }
        if let Some(v) = input.end_date {
            active.end_date = Set(v);
        }
        if let Some(v) = input.period_of_production {
            active.period_of_production = Set(v);
        }
        if let Some(v) = input.production_amount {
            active.production_amount = Set(v);
        }
        if let Some(v) = input.recipient_account {
            active.recipient_account = Set(v);
        }
        if let Some(v) = input.notes {
            active.notes = Set(v);
        }
        active.status = Set(next_status);
        active.updated_at = Set(Some(Utc::now().into()));

        let request = self.request_repo.update(active).await?;

        if status_changed {
            let owner = self.user_repo.get_by_id(&request.user_id).await?;
            let device = self.device_repo.get_by_id(&device_id).await?;
            self.notifier
                .issue_request_status_changed(
                    &owner,
                    &device.device_name,
                    previous_status,
                    next_status,
                )
                .await?;
        }

        Ok(IssueRequestSaveResult {
            request,
            status_changed,
            previous_status,
        })
    }

    /// Submit a draft issue request for review.
    pub async fn submit(
        &self,
        actor: &user::Model,
        request_id: &str,
    ) -> AppResult<IssueRequestSaveResult> {
        self.update(
            actor,
            request_id,
            UpdateIssueRequestInput {
                status: Some(IssueStatus::Submitted),
                ..UpdateIssueRequestInput::default()
            },
        )
        .await
    }

    /// Review an issue request (staff only).
    pub async fn review(
        &self,
        reviewer: &user::Model,
        request_id: &str,
        status: IssueStatus,
    ) -> AppResult<IssueRequestSaveResult> {
        if !reviewer.is_staff {
            return Err(AppError::Forbidden("Reviewer access required".to_string()));
        }

        let existing = self.request_repo.get_by_id(request_id).await?;
        let previous_status = existing.status;
        let mut watch = StatusWatch::new(existing.status);
        let status_changed = watch.observe(status);

        let device_id = existing.device_id.clone();
        let mut active: issue_request::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));

        let request = self.request_repo.update(active).await?;

        if status_changed {
            let owner = self.user_repo.get_by_id(&request.user_id).await?;
            let device = self.device_repo.get_by_id(&device_id).await?;
            self.notifier
                .issue_request_status_changed(&owner, &device.device_name, previous_status, status)
                .await?;
        }

        Ok(IssueRequestSaveResult {
            request,
            status_changed,
            previous_status,
        })
    }

    /// Attach the supporting file to an issue request.
    pub async fn upload_file(
        &self,
        actor: &user::Model,
        request_id: &str,
        input: UploadDocumentInput,
    ) -> AppResult<issue_request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;
        ensure_owner(actor, &request)?;

        if input.data.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }

        let key = generate_storage_key("issue-requests", &input.name);
        let stored = self
            .storage
            .store(&key, &input.data, &input.content_type)
            .await?;

        let mut active: issue_request::ActiveModel = request.into();
        active.upload_file = Set(Some(stored.url));
        active.updated_at = Set(Some(Utc::now().into()));

        self.request_repo.update(active).await
    }

    /// Delete an issue request.
    pub async fn delete(&self, actor: &user::Model, request_id: &str) -> AppResult<()> {
        let request = self.request_repo.get_by_id(request_id).await?;
        ensure_owner(actor, &request)?;
        self.request_repo.delete(request).await
    }
}

fn ensure_owner(actor: &user::Model, request: &issue_request::Model) -> AppResult<()> {
    if actor.is_staff || actor.id == request.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Issue request belongs to another user".to_string(),
        ))
    }
}

fn validate_period(start: NaiveDate, end: NaiveDate, amount: Decimal) -> AppResult<()> {
    if start > end {
        return Err(AppError::Validation(
            "Start date must not be after end date".to_string(),
        ));
    }
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Production amount must be greater than zero".to_string(),
        ));
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

    fn make_service(db: Arc<sea_orm::DatabaseConnection>) -> IssueRequestService {
        IssueRequestService::new(
            IssueRequestRepository::new(Arc::clone(&db)),
            DeviceRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
            disabled_notifier(),
            Arc::new(LocalStorage::new(
                PathBuf::from("/tmp/afrec-test-media"),
                "/media".to_string(),
            )),
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

    fn make_request(id: &str, owner_id: &str, status: IssueStatus) -> issue_request::Model {
        issue_request::Model {
            id: id.to_string(),
            device_id: "dev1".to_string(),
            user_id: owner_id.to_string(),
            status,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            period_of_production: None,
            production_amount: Decimal::new(1_200_000_000, 6),
            recipient_account: "ZM-REC-001".to_string(),
            notes: None,
            upload_file: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_inverted_date_range() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = make_service(db);
        let owner = make_owner("user1");

        let result = service
            .create(
                &owner,
                CreateIssueRequestInput {
                    device_id: "dev1".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                    period_of_production: None,
                    production_amount: Decimal::ONE,
                    recipient_account: "ZM-REC-001".to_string(),
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_with_unchanged_status_does_not_flag_change() {
        let existing = make_request("req1", "user1", IssueStatus::Draft);
        let saved = make_request("req1", "user1", IssueStatus::Draft);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[saved]])
                .into_connection(),
        );
        let service = make_service(db);
        let owner = make_owner("user1");

        let result = service
            .update(&owner, "req1", UpdateIssueRequestInput::default())
            .await
            .unwrap();

        assert!(!result.status_changed);
    }

    #[tokio::test]
    async fn review_requires_staff() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = make_service(db);
        let actor = make_owner("user1");

        let result = service
            .review(&actor, "req1", IssueStatus::Approved)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
