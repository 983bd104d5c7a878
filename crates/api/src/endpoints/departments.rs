//! Department endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use civica_common::AppResult;
use civica_db::entities::department::Model as DepartmentModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse, success},
};

/// Department response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<DepartmentModel> for DepartmentResponse {
    fn from(d: DepartmentModel) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
        }
    }
}

/// List all departments. Public: filers pick a department when filing.
async fn list_departments(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DepartmentResponse>>> {
    let departments = state.department_service.list().await?;
    Ok(ApiResponse::ok(
        departments.into_iter().map(Into::into).collect(),
    ))
}

/// Create department request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    pub description: Option<String>,
}

/// Create a new department.
async fn create_department(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CreateDepartmentRequest>,
) -> AppResult<ApiResponse<DepartmentResponse>> {
    req.validate()?;

    let input = civica_core::department::CreateDepartmentInput {
        name: req.name,
        description: req.description,
    };

    let department = state.department_service.create(input).await?;

    Ok(ApiResponse::ok(department.into()))
}

/// Add member request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: String,
}

/// Add an official to a department.
async fn add_member(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.department_service.add_member(&name, &req.user_id).await?;
    Ok(success())
}

/// Remove an official from a department.
async fn remove_member(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path((name, user_id)): Path<(String, String)>,
) -> AppResult<Json<MessageResponse>> {
    state.department_service.remove_member(&name, &user_id).await?;
    Ok(success())
}

/// Public router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_departments))
}

/// Admin-only router.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_department))
        .route("/{name}/members", post(add_member))
        .route("/{name}/members/{user_id}", delete(remove_member))
}
