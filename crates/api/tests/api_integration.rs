//! API integration tests.
//!
//! These tests verify routing, authentication guards and validation over a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use afrec_api::{AppState, router as api_router};
use afrec_common::{LocalStorage, StorageBackend};
use afrec_core::{
    DeviceService, EmailService, IssueRequestService, StatusChangeNotifier, UserService,
};
use afrec_db::repositories::{
    DeviceDocumentRepository, DeviceRepository, IssueRequestRepository, PasswordResetRepository,
    UserProfileRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a mock database connection.
fn create_mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

/// Create test app state with mock database.
fn create_test_state() -> AppState {
    let db = Arc::new(create_mock_db());

    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let reset_repo = PasswordResetRepository::new(Arc::clone(&db));
    let device_repo = DeviceRepository::new(Arc::clone(&db));
    let document_repo = DeviceDocumentRepository::new(Arc::clone(&db));
    let issue_request_repo = IssueRequestRepository::new(Arc::clone(&db));

    let notifier = StatusChangeNotifier::new(
        EmailService::new(None),
        Vec::new(),
        "https://app.example".to_string(),
        Vec::new(),
    );
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        PathBuf::from("/tmp/afrec-test-media"),
        "/media".to_string(),
    ));

    let user_service = UserService::new(
        user_repo.clone(),
        profile_repo,
        reset_repo,
        notifier.clone(),
    );
    let device_service = DeviceService::new(
        device_repo.clone(),
        document_repo,
        user_repo.clone(),
        notifier.clone(),
        Arc::clone(&storage),
    );
    let issue_request_service = IssueRequestService::new(
        issue_request_repo,
        device_repo,
        user_repo,
        notifier,
        storage,
    );

    AppState {
        user_service,
        device_service,
        issue_request_service,
    }
}

fn test_app() -> Router {
    let state = create_test_state();
    Router::new()
        .nest("/api", api_router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            afrec_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

#[tokio::test]
async fn me_requires_authentication() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/me")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn device_listing_requires_authentication() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/devices/list")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_listing_requires_authentication() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/devices/list")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_short_password() {
    let app = test_app();

    let body = serde_json::json!({
        "username": "kuda",
        "email": "kuda@example.com",
        "password": "short"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_rejects_invalid_email() {
    let app = test_app();

    let body = serde_json::json!({
        "username": "kuda",
        "email": "not-an-email",
        "password": "longenough"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/certificates/list")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
