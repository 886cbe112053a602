//! Device endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use afrec_common::{AppError, AppResult};
use afrec_core::{CreateDeviceInput, RegulatorySlot, UpdateDeviceInput, UploadDocumentInput};
use afrec_db::entities::{
    device::Model as DeviceModel,
    device_document::{DocumentKind, Model as DeviceDocumentModel},
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Device response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    pub user_id: String,
    pub status: afrec_db::entities::device::DeviceStatus,
    pub device_name: String,
    pub issuer_organisation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_account_code: Option<String>,
    pub fuel_type: afrec_db::entities::device::FuelType,
    pub technology_type: String,
    pub capacity: rust_decimal::Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commissioning_date: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<chrono::NaiveDate>,
    pub address: String,
    pub country: String,
    pub latitude: rust_decimal::Decimal,
    pub longitude: rust_decimal::Decimal,
    pub postcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_ids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_voltage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_connection_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_evidence_type: Option<afrec_db::entities::device::VolumeEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_evidence_other: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_offset_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labelling_scheme: Option<String>,
    pub public_funding: afrec_db::entities::device::PublicFunding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_end_date: Option<chrono::NaiveDate>,
    pub onsite_consumer: afrec_db::entities::device::YesNo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onsite_consumer_details: Option<String>,
    pub auxiliary_energy: afrec_db::entities::device::YesNo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary_energy_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electricity_import_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_facility_registration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_of_ownership: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metering_evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_line_diagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_photos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<DeviceModel> for DeviceResponse {
    fn from(d: DeviceModel) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            status: d.status,
            device_name: d.device_name,
            issuer_organisation: d.issuer_organisation,
            default_account_code: d.default_account_code,
            fuel_type: d.fuel_type,
            technology_type: d.technology_type,
            capacity: d.capacity,
            commissioning_date: d.commissioning_date,
            effective_date: d.effective_date,
            address: d.address,
            country: d.country,
            latitude: d.latitude,
            longitude: d.longitude,
            postcode: d.postcode,
            meter_ids: d.meter_ids,
            network_owner: d.network_owner,
            connection_voltage: d.connection_voltage,
            grid_connection_details: d.grid_connection_details,
            volume_evidence_type: d.volume_evidence_type,
            volume_evidence_other: d.volume_evidence_other,
            carbon_offset_registration: d.carbon_offset_registration,
            labelling_scheme: d.labelling_scheme,
            public_funding: d.public_funding,
            funding_end_date: d.funding_end_date,
            onsite_consumer: d.onsite_consumer,
            onsite_consumer_details: d.onsite_consumer_details,
            auxiliary_energy: d.auxiliary_energy,
            auxiliary_energy_details: d.auxiliary_energy_details,
            electricity_import_details: d.electricity_import_details,
            production_facility_registration: d.production_facility_registration,
            declaration_of_ownership: d.declaration_of_ownership,
            metering_evidence: d.metering_evidence,
            single_line_diagram: d.single_line_diagram,
            project_photos: d.project_photos,
            additional_notes: d.additional_notes,
            rejection_reason: d.rejection_reason,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Device document response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDocumentResponse {
    pub id: String,
    pub device_id: String,
    pub document_type: DocumentKind,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub url: String,
    pub uploaded_at: String,
}

impl From<DeviceDocumentModel> for DeviceDocumentResponse {
    fn from(d: DeviceDocumentModel) -> Self {
        Self {
            id: d.id,
            device_id: d.device_id,
            document_type: d.document_type,
            name: d.name,
            content_type: d.content_type,
            size: d.size,
            url: d.url,
            uploaded_at: d.uploaded_at.to_rfc3339(),
        }
    }
}

/// Register a new device.
async fn create_device(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateDeviceInput>,
) -> AppResult<ApiResponse<DeviceResponse>> {
    let device = state.device_service.create(&user, req).await?;
    Ok(ApiResponse::ok(device.into()))
}

/// List devices request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    10
}

/// List the authenticated user's devices.
async fn list_devices(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListDevicesRequest>,
) -> AppResult<ApiResponse<Vec<DeviceResponse>>> {
    let limit = req.limit.min(100);
    let devices = state
        .device_service
        .list_for_user(&user.id, limit, req.offset)
        .await?;
    Ok(ApiResponse::ok(devices.into_iter().map(Into::into).collect()))
}

/// Show device request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDeviceRequest {
    pub device_id: String,
}

/// Get device details.
async fn show_device(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowDeviceRequest>,
) -> AppResult<ApiResponse<DeviceResponse>> {
    let device = state.device_service.get(&user, &req.device_id).await?;
    Ok(ApiResponse::ok(device.into()))
}

/// Update device request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    pub device_id: String,
    #[serde(flatten)]
    pub input: UpdateDeviceInput,
}

/// Update a device. A status change here triggers the notification fan-out.
async fn update_device(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateDeviceRequest>,
) -> AppResult<ApiResponse<DeviceResponse>> {
    let result = state
        .device_service
        .update(&user, &req.device_id, req.input)
        .await?;
    Ok(ApiResponse::ok(result.device.into()))
}

/// Submit a draft device for review.
async fn submit_device(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowDeviceRequest>,
) -> AppResult<ApiResponse<DeviceResponse>> {
    let result = state.device_service.submit(&user, &req.device_id).await?;
    Ok(ApiResponse::ok(result.device.into()))
}

/// Delete response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub ok: bool,
}

/// Delete a device.
async fn delete_device(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowDeviceRequest>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    state.device_service.delete(&user, &req.device_id).await?;
    Ok(ApiResponse::ok(DeletedResponse { ok: true }))
}

struct MultipartUpload {
    device_id: Option<String>,
    kind: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Option<Vec<u8>>,
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<MultipartUpload> {
    let mut upload = MultipartUpload {
        device_id: None,
        kind: None,
        file_name: None,
        content_type: None,
        data: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(std::string::ToString::to_string);
                upload.content_type = field.content_type().map(std::string::ToString::to_string);
                upload.data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            "deviceId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.is_empty() {
                    upload.device_id = Some(text);
                }
            }
            "slot" | "documentType" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.is_empty() {
                    upload.kind = Some(text);
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}

fn upload_input(upload: &MultipartUpload) -> AppResult<UploadDocumentInput> {
    let data = upload
        .data
        .clone()
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    Ok(UploadDocumentInput {
        name: upload
            .file_name
            .clone()
            .unwrap_or_else(|| "unnamed".to_string()),
        content_type: upload
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        data,
    })
}

/// Upload a file into one of the device's regulatory slots (multipart form
/// with `file`, `deviceId` and `slot` fields).
async fn upload_slot(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<DeviceResponse>> {
    let upload = read_multipart(multipart).await?;

    let device_id = upload
        .device_id
        .clone()
        .ok_or_else(|| AppError::BadRequest("No deviceId provided".to_string()))?;
    let slot: RegulatorySlot = upload
        .kind
        .as_deref()
        .and_then(|k| serde_json::from_value(serde_json::Value::String(k.to_string())).ok())
        .ok_or_else(|| AppError::BadRequest("Unknown regulatory slot".to_string()))?;
    let input = upload_input(&upload)?;

    let device = state
        .device_service
        .upload_slot(&user, &device_id, slot, input)
        .await?;

    Ok(ApiResponse::ok(device.into()))
}

/// Attach a supplementary document (multipart form with `file`, `deviceId`
/// and `documentType` fields).
async fn upload_document(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<DeviceDocumentResponse>> {
    let upload = read_multipart(multipart).await?;

    let device_id = upload
        .device_id
        .clone()
        .ok_or_else(|| AppError::BadRequest("No deviceId provided".to_string()))?;
    let kind: DocumentKind = upload
        .kind
        .as_deref()
        .and_then(|k| serde_json::from_value(serde_json::Value::String(k.to_string())).ok())
        .ok_or_else(|| AppError::BadRequest("Unknown document type".to_string()))?;
    let input = upload_input(&upload)?;

    let document = state
        .device_service
        .add_document(&user, &device_id, kind, input)
        .await?;

    Ok(ApiResponse::ok(document.into()))
}

/// List the supplementary documents attached to a device.
async fn list_documents(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowDeviceRequest>,
) -> AppResult<ApiResponse<Vec<DeviceDocumentResponse>>> {
    let documents = state.device_service.documents(&user, &req.device_id).await?;
    Ok(ApiResponse::ok(
        documents.into_iter().map(Into::into).collect(),
    ))
}

/// Delete document request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentRequest {
    pub document_id: String,
}

/// Remove a supplementary document.
async fn delete_document(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteDocumentRequest>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    state
        .device_service
        .delete_document(&user, &req.document_id)
        .await?;
    Ok(ApiResponse::ok(DeletedResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_device))
        .route("/list", post(list_devices))
        .route("/show", post(show_device))
        .route("/update", post(update_device))
        .route("/submit", post(submit_device))
        .route("/delete", post(delete_device))
        .route("/upload-slot", post(upload_slot))
        .route("/documents/upload", post(upload_document))
        .route("/documents/list", post(list_documents))
        .route("/documents/delete", post(delete_document))
}
