use crate::config::moderation::ModerationConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{parse_user_id, require_moderator, AuthUser};
use crate::models::{ReportModel, ReportStatus, TargetType};
use crate::response::{normalize_search, page_params, ApiResponse, PaginatedResponse};
use crate::services::adjudication::{Adjudication, AdjudicationService};
use crate::services::notification_queue::NotificationQueue;
use crate::services::report::{ReportFilter, ReportInput, ReportService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// All fields are optional on the wire so that missing ones are reported
/// together instead of as a deserialization failure.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportRequest {
    /// Account the report is about
    pub reported_user_id: Option<i32>,
    /// One of user, post, comment
    pub target_type: Option<String>,
    /// ID of the reported user, post or comment
    pub target_id: Option<i32>,
    /// Why the content or account is being reported
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Filter by target type
    pub target_type: Option<String>,
    /// Filter by status
    pub status: Option<String>,
    /// Case-insensitive match on reason and verdict reason
    pub search: Option<String>,
    /// Page number
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    /// em_avaliacao, justificado or nao_justificado
    pub status: Option<String>,
    /// Required for justificado and nao_justificado
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub reporter_id: i32,
    pub reported_user_id: i32,
    pub target_type: String,
    pub target_id: i32,
    pub reason: String,
    pub status: String,
    /// Moderator's reason for the current verdict
    pub status_reason: Option<String>,
    pub created_at: String,
}

impl From<ReportModel> for ReportResponse {
    fn from(r: ReportModel) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            reported_user_id: r.reported_user_id,
            target_type: r.target_type.as_str().to_string(),
            target_id: r.target_id,
            reason: r.reason,
            status: r.status.as_str().to_string(),
            status_reason: r.status_reason,
            created_at: r.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub report_id: i32,
    pub previous_status: String,
    pub status: String,
    pub status_reason: Option<String>,
    /// Upheld user-reports against the reported account, for user reports
    pub valid_report_count: Option<u64>,
    /// Whether the reported post or comment was deleted
    pub content_removed: bool,
}

impl From<Adjudication> for StatusUpdateResponse {
    fn from(a: Adjudication) -> Self {
        Self {
            report_id: a.report_id,
            previous_status: a.previous_status.as_str().to_string(),
            status: a.status.as_str().to_string(),
            status_reason: a.reason,
            valid_report_count: a.valid_report_count,
            content_removed: a.content_removed,
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ListReportsQuery {
    fn filter(&self) -> AppResult<ReportFilter> {
        let target_type = match blank_to_none(self.target_type.clone()) {
            Some(raw) => Some(TargetType::parse(&raw).ok_or(AppError::InvalidTargetType(raw))?),
            None => None,
        };
        let status = match blank_to_none(self.status.clone()) {
            Some(raw) => Some(
                ReportStatus::parse(&raw)
                    .ok_or_else(|| AppError::Validation(format!("Unknown status '{raw}'")))?,
            ),
            None => None,
        };
        Ok(ReportFilter {
            target_type,
            status,
            search: normalize_search(self.search.as_deref()),
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report created", body = ReportResponse),
        (status = 400, description = "Missing fields or invalid target type", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reporter_id = parse_user_id(&auth_user)?;

    let service = ReportService::new(db);
    let report = service
        .create_report(
            reporter_id,
            ReportInput {
                reported_user_id: payload.reported_user_id,
                target_type: payload.target_type,
                target_id: payload.target_id,
                reason: payload.reason,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        ReportResponse::from(report),
        "Report submitted",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    security(("jwt_token" = [])),
    params(
        ("target_type" = Option<String>, Query, description = "Filter by target type"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Search reason text"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List of reports", body = PaginatedResponse<ReportResponse>),
        (status = 400, description = "Unknown filter value", body = AppError),
        (status = 403, description = "Moderators only", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let filter = params.filter()?;
    let (page, per_page) = page_params(params.page, params.per_page);

    let service = ReportService::new(db);
    let (reports, total) = service.list_reports(&filter, page, per_page).await?;
    let items = reports.into_iter().map(ReportResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report deleted", body = String),
        (status = 403, description = "Moderators only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn delete_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let service = ReportService::new(db);
    service.delete_report(id).await?;

    Ok(ApiResponse::ok("Report deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/reports/{id}/status",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Report status updated", body = StatusUpdateResponse),
        (status = 400, description = "Invalid status or missing reason", body = AppError),
        (status = 403, description = "Moderators only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn update_report_status(
    Extension(db): Extension<DatabaseConnection>,
    Extension(queue): Extension<NotificationQueue>,
    Extension(moderation): Extension<ModerationConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let moderator = require_moderator(&db, &auth_user).await?;

    let service = AdjudicationService::new(db, queue, moderation);
    let outcome = service
        .set_report_status(
            id,
            moderator.id,
            payload.status.as_deref().unwrap_or_default(),
            payload.reason.as_deref(),
        )
        .await?;

    Ok(ApiResponse::with_message(
        StatusUpdateResponse::from(outcome),
        "Report status updated",
    ))
}
