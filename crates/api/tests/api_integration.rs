//! API integration tests.
//!
//! These tests verify routing, authentication, and the officials-only gate
//! against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use civica_api::{middleware::AppState, router as api_router};
use civica_core::{
    ComplaintService, DepartmentService, NotificationService, RewardPolicy, UserService,
};
use civica_db::entities::user;
use civica_db::repositories::{
    ComplaintRepository, DepartmentRepository, NotificationRepository, RewardAccountRepository,
    UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tower::ServiceExt;

fn create_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let reward_repo = RewardAccountRepository::new(Arc::clone(&db));
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let department_repo = DepartmentRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    let user_service = UserService::new(user_repo.clone(), reward_repo.clone());
    let complaint_service = ComplaintService::new(
        Arc::clone(&db),
        complaint_repo,
        user_repo.clone(),
        reward_repo,
        department_repo.clone(),
        RewardPolicy::default(),
    );
    let department_service = DepartmentService::new(department_repo, user_repo);
    let notification_service = NotificationService::new(notification_repo);

    AppState {
        user_service,
        complaint_service,
        department_service,
        notification_service,
    }
}

fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            civica_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

fn test_citizen(token: &str) -> user::Model {
    user::Model {
        id: "user1".to_string(),
        username: "citizen".to_string(),
        username_lower: "citizen".to_string(),
        email: "citizen@example.com".to_string(),
        password: None,
        token: Some(token.to_string()),
        name: None,
        is_official: false,
        is_admin: false,
        created_at: chrono::Utc::now().into(),
        updated_at: None,
    }
}

#[tokio::test]
async fn test_admin_surface_requires_auth() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/complaints")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_surface_rejects_non_officials() {
    // The token resolves to a citizen; the gate must return 403.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_citizen("citizen_token")]])
        .into_connection();
    let app = create_app(create_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/complaints")
                .header("Authorization", "Bearer citizen_token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_departments_listing_is_public() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<civica_db::entities::department::Model>::new()])
        .into_connection();
    let app = create_app(create_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/departments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_my_complaints_requires_auth() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(create_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/complaints")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
