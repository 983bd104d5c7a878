//! Complaint endpoints - citizen filing and the officials' triage surface.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use civica_common::AppResult;
use civica_db::entities::complaint::Model as ComplaintModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{AuthUser, OfficialUser},
    middleware::AppState,
    response::{ApiResponse, MessageResponse, success},
};

/// Complaint response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: String,
    pub token: String,
    pub filer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    pub progress_report: bool,
    pub was_travelled: bool,
    pub created_at: String,
}

impl From<ComplaintModel> for ComplaintResponse {
    fn from(c: ComplaintModel) -> Self {
        Self {
            id: c.id,
            token: c.token,
            filer_id: c.filer_id,
            department_id: c.department_id,
            title: c.title,
            body: c.body,
            location: c.location,
            status: c.status.label().to_string(),
            progress_report: c.progress_report,
            was_travelled: c.was_travelled,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

// ========== Citizen surface ==========

/// File complaint request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FileComplaintRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1, max = 8192))]
    pub body: String,

    pub location: Option<String>,

    /// Department to route the complaint to, by name.
    pub department: Option<String>,

    #[serde(default)]
    pub progress_report: bool,
}

/// File a new complaint.
async fn file_complaint(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FileComplaintRequest>,
) -> AppResult<ApiResponse<ComplaintResponse>> {
    req.validate()?;

    let input = civica_core::complaint::FileComplaintInput {
        title: req.title,
        body: req.body,
        location: req.location,
        department: req.department,
        progress_report: req.progress_report,
    };

    let complaint = state.complaint_service.file(&user, input).await?;

    Ok(ApiResponse::ok(complaint.into()))
}

/// List the authenticated citizen's own complaints.
async fn my_complaints(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let complaints = state.complaint_service.for_filer(&user.id).await?;
    Ok(ApiResponse::ok(
        complaints.into_iter().map(Into::into).collect(),
    ))
}

// ========== Official surface ==========

/// Complaints assigned to the acting official.
async fn assigned_complaints(
    OfficialUser(official): OfficialUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let complaints = state.complaint_service.assigned(&official.id, false).await?;
    Ok(ApiResponse::ok(
        complaints.into_iter().map(Into::into).collect(),
    ))
}

/// Progress reports assigned to the acting official.
async fn assigned_progress_reports(
    OfficialUser(official): OfficialUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let complaints = state.complaint_service.assigned(&official.id, true).await?;
    Ok(ApiResponse::ok(
        complaints.into_iter().map(Into::into).collect(),
    ))
}

/// Verified complaints awaiting settlement.
async fn verified_complaints(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let complaints = state.complaint_service.verified().await?;
    Ok(ApiResponse::ok(
        complaints.into_iter().map(Into::into).collect(),
    ))
}

/// Settled complaints.
async fn solved_complaints(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ComplaintResponse>>> {
    let complaints = state.complaint_service.solved().await?;
    Ok(ApiResponse::ok(
        complaints.into_iter().map(Into::into).collect(),
    ))
}

/// Decline a complaint.
async fn decline(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.complaint_service.decline(&id).await?;
    Ok(success())
}

/// Mark a complaint as spam.
async fn mark_spam(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.complaint_service.mark_spam(&id).await?;
    Ok(success())
}

/// Approve response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub message: &'static str,
    pub reward: i32,
}

/// Approve a complaint and credit the filer.
async fn approve(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApproveResponse>> {
    let reward = state.complaint_service.approve(&id).await?;
    Ok(Json(ApproveResponse {
        message: "success",
        reward,
    }))
}

/// Settle a verified complaint.
async fn mark_solved(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.complaint_service.mark_solved(&id).await?;
    Ok(success())
}

/// Forward request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    pub department: String,
}

/// Forward a complaint to another department.
async fn forward(
    OfficialUser(official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ForwardRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .complaint_service
        .forward(&official.id, &id, &req.department)
        .await?;
    Ok(success())
}

/// Ignore request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreRequest {
    pub reason: String,
}

/// Close a report with a reason, emailed to the filer.
async fn ignore(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IgnoreRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.complaint_service.ignore(&id, &req.reason).await?;
    Ok(success())
}

/// Record a site visit on a complaint.
async fn mark_travelled(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.complaint_service.mark_travelled(&id).await?;
    Ok(success())
}

/// Resolve a report and credit the filer.
async fn resolve(
    OfficialUser(_official): OfficialUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.complaint_service.resolve(&id).await?;
    Ok(success())
}

/// Citizen-facing router.
pub fn citizen_router() -> Router<AppState> {
    Router::new().route("/", post(file_complaint).get(my_complaints))
}

/// Officials-only router.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(assigned_complaints))
        .route("/progress", get(assigned_progress_reports))
        .route("/verified", get(verified_complaints))
        .route("/solved", get(solved_complaints))
        .route("/{id}/decline", post(decline))
        .route("/{id}/spam", post(mark_spam))
        .route("/{id}/approve", post(approve))
        .route("/{id}/solve", post(mark_solved))
        .route("/{id}/forward", post(forward))
        .route("/{id}/ignore", post(ignore))
        .route("/{id}/travelled", post(mark_travelled))
        .route("/{id}/resolve", post(resolve))
}
