use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(protected)
}

/// Auth routes: register, login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Protected routes: everything behind a bearer token.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        // Reports
        .route("/reports", routing::post(handlers::report::create_report))
        .route(
            "/admin/reports",
            routing::get(handlers::report::list_reports),
        )
        .route(
            "/admin/reports/{id}",
            routing::delete(handlers::report::delete_report),
        )
        .route(
            "/admin/reports/{id}/status",
            routing::put(handlers::report::update_report_status),
        )
        // Users
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users-to-ban",
            routing::get(handlers::admin::list_users_to_ban),
        )
        .route(
            "/admin/users/{id}/ban",
            routing::post(handlers::admin::ban_user),
        )
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        // Content removal
        .route(
            "/admin/posts/{id}",
            routing::delete(handlers::admin::admin_delete_post),
        )
        .route(
            "/admin/comments/{id}",
            routing::delete(handlers::admin::admin_delete_comment),
        )
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/{id}/read",
            routing::put(handlers::notification::mark_read),
        )
        .route(
            "/notifications/{id}",
            routing::delete(handlers::notification::delete_notification),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!(
            per_second = rule.per_second,
            burst_size = rule.burst_size,
            "Invalid rate limit configuration; serving without a limit"
        );
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
