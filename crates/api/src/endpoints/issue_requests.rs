//! Issue request endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use afrec_common::{AppError, AppResult};
use afrec_core::{CreateIssueRequestInput, UpdateIssueRequestInput, UploadDocumentInput};
use afrec_db::entities::issue_request::{IssueStatus, Model as IssueRequestModel};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Issue request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequestResponse {
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub status: IssueStatus,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_of_production: Option<String>,
    pub production_amount: rust_decimal::Decimal,
    pub recipient_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_file: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<IssueRequestModel> for IssueRequestResponse {
    fn from(r: IssueRequestModel) -> Self {
        Self {
            id: r.id,
            device_id: r.device_id,
            user_id: r.user_id,
            status: r.status,
            start_date: r.start_date,
            end_date: r.end_date,
            period_of_production: r.period_of_production,
            production_amount: r.production_amount,
            recipient_account: r.recipient_account,
            notes: r.notes,
            upload_file: r.upload_file,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Create an issue request.
async fn create_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateIssueRequestInput>,
) -> AppResult<ApiResponse<IssueRequestResponse>> {
    let request = state.issue_request_service.create(&user, req).await?;
    Ok(ApiResponse::ok(request.into()))
}

/// List issue requests request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

/// List the authenticated user's issue requests.
async fn list_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequestsRequest>,
) -> AppResult<ApiResponse<Vec<IssueRequestResponse>>> {
    let limit = req.limit.min(100);
    let requests = state
        .issue_request_service
        .list_for_user(&user.id, limit, req.offset)
        .await?;
    Ok(ApiResponse::ok(
        requests.into_iter().map(Into::into).collect(),
    ))
}

/// Show issue request request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRequestRequest {
    pub request_id: String,
}

/// Get issue request details.
async fn show_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowRequestRequest>,
) -> AppResult<ApiResponse<IssueRequestResponse>> {
    let request = state
        .issue_request_service
        .get(&user, &req.request_id)
        .await?;
    Ok(ApiResponse::ok(request.into()))
}

/// Update issue request request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestRequest {
    pub request_id: String,
    #[serde(flatten)]
    pub input: UpdateIssueRequestInput,
}

/// Update an issue request. A status change triggers the notification fan-out.
async fn update_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateRequestRequest>,
) -> AppResult<ApiResponse<IssueRequestResponse>> {
    let result = state
        .issue_request_service
        .update(&user, &req.request_id, req.input)
        .await?;
    Ok(ApiResponse::ok(result.request.into()))
}

/// Submit a draft issue request for review.
async fn submit_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowRequestRequest>,
) -> AppResult<ApiResponse<IssueRequestResponse>> {
    let result = state
        .issue_request_service
        .submit(&user, &req.request_id)
        .await?;
    Ok(ApiResponse::ok(result.request.into()))
}

/// Delete response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub ok: bool,
}

/// Delete an issue request.
async fn delete_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowRequestRequest>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    state
        .issue_request_service
        .delete(&user, &req.request_id)
        .await?;
    Ok(ApiResponse::ok(DeletedResponse { ok: true }))
}

/// Attach the supporting file (multipart form with `file` and `requestId`).
async fn upload_file(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<IssueRequestResponse>> {
    let mut request_id: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(std::string::ToString::to_string);
                content_type = field.content_type().map(std::string::ToString::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            "requestId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.is_empty() {
                    request_id = Some(text);
                }
            }
            _ => {}
        }
    }

    let request_id =
        request_id.ok_or_else(|| AppError::BadRequest("No requestId provided".to_string()))?;
    let data = data.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let input = UploadDocumentInput {
        name: file_name.unwrap_or_else(|| "unnamed".to_string()),
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        data,
    };

    let request = state
        .issue_request_service
        .upload_file(&user, &request_id, input)
        .await?;

    Ok(ApiResponse::ok(request.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_request))
        .route("/list", post(list_requests))
        .route("/show", post(show_request))
        .route("/update", post(update_request))
        .route("/submit", post(submit_request))
        .route("/delete", post(delete_request))
        .route("/upload-file", post(upload_file))
}
