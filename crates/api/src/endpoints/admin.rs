//! Administrative console endpoints.
//!
//! Staff-guarded listings with the search/filter columns reviewers work with,
//! plus the review operations that drive the status-change notifications.

use axum::{Json, Router, extract::State, routing::post};
use afrec_common::AppResult;
use afrec_db::entities::{
    device::DeviceStatus,
    issue_request::IssueStatus,
    user::Country,
};
use afrec_db::repositories::{DeviceFilter, IssueRequestFilter, UserFilter};
use serde::{Deserialize, Serialize};

use crate::endpoints::devices::DeviceResponse;
use crate::endpoints::issue_requests::IssueRequestResponse;
use crate::endpoints::users::UserResponse;
use crate::{extractors::StaffUser, middleware::AppState, response::ApiResponse};

const fn default_limit() -> u64 {
    25
}

/// Paginated listing envelope.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T: Serialize> {
    pub total: u64,
    pub items: Vec<T>,
}

/// List users request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub country: Option<Country>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// List user accounts (search by username/email, filter by country).
async fn list_users(
    StaffUser(_staff): StaffUser,
    State(state): State<AppState>,
    Json(req): Json<ListUsersRequest>,
) -> AppResult<ApiResponse<Listing<UserResponse>>> {
    let filter = UserFilter {
        search: req.search,
        country: req.country,
    };
    let limit = req.limit.min(100);

    let total = state.user_service.count_accounts(&filter).await?;
    let users = state
        .user_service
        .list_accounts(&filter, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(Listing {
        total,
        items: users.into_iter().map(Into::into).collect(),
    }))
}

/// List devices request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// List devices (search by name/address, filter by status/country/owner).
async fn list_devices(
    StaffUser(_staff): StaffUser,
    State(state): State<AppState>,
    Json(req): Json<ListDevicesRequest>,
) -> AppResult<ApiResponse<Listing<DeviceResponse>>> {
    let filter = DeviceFilter {
        search: req.search,
        status: req.status,
        country: req.country,
        user_id: req.user_id,
    };
    let limit = req.limit.min(100);

    let total = state.device_service.count_all(&filter).await?;
    let devices = state
        .device_service
        .list_all(&filter, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(Listing {
        total,
        items: devices.into_iter().map(Into::into).collect(),
    }))
}

/// Review device request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDeviceRequest {
    pub device_id: String,
    pub status: DeviceStatus,
    /// Shown to the owner when the device is rejected.
    pub rejection_reason: Option<String>,
}

/// Set a device's status. A change fans out the owner and administrator
/// notification emails.
async fn review_device(
    StaffUser(staff): StaffUser,
    State(state): State<AppState>,
    Json(req): Json<ReviewDeviceRequest>,
) -> AppResult<ApiResponse<DeviceResponse>> {
    let result = state
        .device_service
        .review(&staff, &req.device_id, req.status, req.rejection_reason)
        .await?;
    Ok(ApiResponse::ok(result.device.into()))
}

/// List issue requests request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIssueRequestsRequest {
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// List issue requests (filter by status/owner/device).
async fn list_issue_requests(
    StaffUser(_staff): StaffUser,
    State(state): State<AppState>,
    Json(req): Json<ListIssueRequestsRequest>,
) -> AppResult<ApiResponse<Listing<IssueRequestResponse>>> {
    let filter = IssueRequestFilter {
        status: req.status,
        user_id: req.user_id,
        device_id: req.device_id,
    };
    let limit = req.limit.min(100);

    let total = state.issue_request_service.count_all(&filter).await?;
    let requests = state
        .issue_request_service
        .list_all(&filter, limit, req.offset)
        .await?;

    Ok(ApiResponse::ok(Listing {
        total,
        items: requests.into_iter().map(Into::into).collect(),
    }))
}

/// Review issue request request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIssueRequestRequest {
    pub request_id: String,
    pub status: IssueStatus,
}

/// Set an issue request's status. A change fans out the owner and
/// administrator notification emails.
async fn review_issue_request(
    StaffUser(staff): StaffUser,
    State(state): State<AppState>,
    Json(req): Json<ReviewIssueRequestRequest>,
) -> AppResult<ApiResponse<IssueRequestResponse>> {
    let result = state
        .issue_request_service
        .review(&staff, &req.request_id, req.status)
        .await?;
    Ok(ApiResponse::ok(result.request.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/list", post(list_users))
        .route("/devices/list", post(list_devices))
        .route("/devices/review", post(review_device))
        .route("/issue-requests/list", post(list_issue_requests))
        .route("/issue-requests/review", post(review_issue_request))
}
