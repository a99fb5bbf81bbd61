use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use heralert::services::notification_queue::NotificationQueue;
use heralert::{config, migration, routes, services, utils};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        heralert::handlers::register,
        heralert::handlers::login,
        heralert::handlers::get_current_user,
        // Report routes
        heralert::handlers::report::create_report,
        heralert::handlers::report::list_reports,
        heralert::handlers::report::delete_report,
        heralert::handlers::report::update_report_status,
        // Admin routes
        heralert::handlers::admin::list_users,
        heralert::handlers::admin::list_users_to_ban,
        heralert::handlers::admin::ban_user,
        heralert::handlers::admin::update_user_role,
        heralert::handlers::admin::admin_delete_post,
        heralert::handlers::admin::admin_delete_comment,
        // Notification routes
        heralert::handlers::notification::list_notifications,
        heralert::handlers::notification::unread_count,
        heralert::handlers::notification::mark_read,
        heralert::handlers::notification::delete_notification,
    ),
    components(
        schemas(
            heralert::response::ApiResponse<serde_json::Value>,
            heralert::response::PaginatedResponse<serde_json::Value>,
            heralert::response::PaginationQuery,
            heralert::response::SearchPageQuery,
            heralert::error::AppError,
            // Auth
            heralert::handlers::auth::RegisterRequest,
            heralert::handlers::auth::LoginRequest,
            heralert::handlers::auth::AuthResponse,
            heralert::handlers::auth::UserResponse,
            // Report
            heralert::handlers::report::ReportResponse,
            heralert::handlers::report::CreateReportRequest,
            heralert::handlers::report::ListReportsQuery,
            heralert::handlers::report::UpdateStatusRequest,
            heralert::handlers::report::StatusUpdateResponse,
            // Admin
            heralert::handlers::admin::BanCandidateResponse,
            heralert::handlers::admin::UpdateRoleRequest,
            heralert::services::ban::BanSummary,
            // Notification
            heralert::handlers::notification::NotificationResponse,
            heralert::handlers::notification::UnreadCountResponse,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "reports", description = "Report filing and adjudication"),
        (name = "admin", description = "Moderation operations"),
        (name = "notifications", description = "Notification operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heralert=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    let moderation = config::moderation::ModerationConfig::from_env();
    tracing::info!(
        ban_threshold = moderation.ban_threshold,
        "Starting heralert v{}...",
        env!("CARGO_PKG_VERSION")
    );

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_owner::ensure_bootstrap_owner(&db).await?;

    let notifications = NotificationQueue::spawn(db.clone());

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(notifications))
        .layer(Extension(moderation));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL: checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "heralert",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
