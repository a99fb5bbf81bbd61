use crate::config::moderation::ModerationConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserResponse;
use crate::middleware::auth::{parse_user_id, require_moderator, AuthUser};
use crate::models::UserModel;
use crate::response::{
    normalize_search, page_params, ApiResponse, PaginatedResponse, SearchPageQuery,
};
use crate::services::admin::AdminService;
use crate::services::auth::AuthService;
use crate::services::ban::{BanService, BanSummary};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// 0 member, 1 moderator
    pub role: i16,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BanCandidateResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: i16,
    /// Upheld user-reports against this account
    pub valid_reports: u64,
    pub created_at: String,
}

impl From<(UserModel, u64)> for BanCandidateResponse {
    fn from((u, valid_reports): (UserModel, u64)) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role.level(),
            valid_reports,
            created_at: u.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(
        ("search" = Option<String>, Query, description = "Search username or email"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Moderators only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<SearchPageQuery>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let (page, per_page) = page_params(params.page, params.per_page);
    let search = normalize_search(params.search.as_deref());

    let service = AdminService::new(db);
    let (users, total) = service
        .list_users(search.as_deref(), page, per_page)
        .await?;
    let items = users.into_iter().map(UserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users-to-ban",
    security(("jwt_token" = [])),
    params(
        ("search" = Option<String>, Query, description = "Search username or email"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Accounts at or above the ban threshold", body = PaginatedResponse<BanCandidateResponse>),
        (status = 403, description = "Moderators only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users_to_ban(
    Extension(db): Extension<DatabaseConnection>,
    Extension(moderation): Extension<ModerationConfig>,
    auth_user: AuthUser,
    Query(params): Query<SearchPageQuery>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let (page, per_page) = page_params(params.page, params.per_page);
    let search = normalize_search(params.search.as_deref());

    let service = AdminService::new(db);
    let (users, total) = service
        .users_to_ban(moderation.ban_threshold, search.as_deref(), page, per_page)
        .await?;
    let items = users.into_iter().map(BanCandidateResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/ban",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User banned", body = BanSummary),
        (status = 403, description = "Not allowed to ban this account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn ban_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(moderation): Extension<ModerationConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    // The ban policy produces its own denial for members.
    let actor = AuthService::new(db.clone())
        .get_user_by_id(parse_user_id(&auth_user)?)
        .await?;

    let service = BanService::new(db, moderation);
    let summary = service.ban_user(id, actor.id, actor.role).await?;

    Ok(ApiResponse::with_message(summary, "User banned"))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "User role updated", body = UserResponse),
        (status = 400, description = "Role not assignable", body = AppError),
        (status = 403, description = "Owner only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    // The role policy produces its own denial for non-owners.
    let actor = AuthService::new(db.clone())
        .get_user_by_id(parse_user_id(&auth_user)?)
        .await?;

    let service = AdminService::new(db);
    let user = service
        .update_user_role(actor.id, actor.role, id, payload.role)
        .await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User role updated",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted by moderator", body = String),
        (status = 403, description = "Moderators only", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn admin_delete_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let service = AdminService::new(db);
    service.admin_delete_post(id).await?;

    Ok(ApiResponse::ok("Post deleted by moderator"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted by moderator", body = String),
        (status = 403, description = "Moderators only", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn admin_delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let service = AdminService::new(db);
    service.admin_delete_comment(id).await?;

    Ok(ApiResponse::ok("Comment deleted by moderator"))
}
