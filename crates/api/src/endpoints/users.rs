//! User profile endpoints.

use axum::{Json, Router, extract::State, routing::post};
use afrec_common::AppResult;
use afrec_db::entities::user::{self, Country};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    pub brand_name: String,
    pub flag_emoji: String,
    pub is_staff: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        let brand_name = u.brand_name().to_string();
        let flag_emoji = u.flag_emoji().to_string();
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            name: u.name,
            country: u.country,
            brand_name,
            flag_emoji,
            is_staff: u.is_staff,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Get the authenticated user.
async fn me(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

/// Update profile request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 256))]
    pub name: Option<String>,

    /// Absent = unchanged, null = clear the country.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub country: Option<Option<Country>>,
}

/// Distinguish an absent field (None) from an explicit null (Some(None)).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Update the authenticated user's profile.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let input = afrec_core::user::UpdateUserInput {
        name: req.name,
        country: req.country,
    };

    let updated = state.user_service.update(&user.id, input).await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Change password request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Change password response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    pub ok: bool,
}

/// Change the authenticated user's password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<ChangePasswordResponse>> {
    let input = afrec_core::user::ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };

    state.user_service.change_password(&user.id, input).await?;

    Ok(ApiResponse::ok(ChangePasswordResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", post(me))
        .route("/update", post(update_profile))
        .route("/change-password", post(change_password))
}
