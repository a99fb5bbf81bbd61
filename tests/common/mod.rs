#![allow(dead_code)]

use heralert::models::{
    comment, message, notification, post, user, Notification, NotificationModel, Role,
};
use reqwest::{Client, StatusCode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};
use std::time::Duration;

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("BAN_THRESHOLD", "3");
        std::env::set_var("BANNED_EMAIL_DOMAIN", "banned.invalid");
        let config = heralert::config::jwt::JwtConfig::from_env().unwrap();
        let _ = heralert::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        heralert::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let notifications = heralert::services::notification_queue::NotificationQueue::spawn(db.clone());

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(heralert::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(notifications))
        .layer(axum::extract::Extension(
            heralert::config::moderation::ModerationConfig::from_env(),
        ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "notifications",
        "banned_users",
        "reports",
        "messages",
        "comments",
        "posts",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let username = format!("{}_{}", username_prefix, counter);
    register(app, &username, &format!("{}@test.com", username)).await
}

pub async fn register(app: &TestApp, username: &str, email: &str) -> (i32, String) {
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": username,
            "name": "Test User",
            "email": email,
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse register response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            username, status, body
        );
    }

    let user_id = body["data"]["user_id"]
        .as_i64()
        .expect("Response missing user_id") as i32;
    let token = body["data"]["token"]
        .as_str()
        .expect("Response missing token")
        .to_string();
    (user_id, token)
}

/// Change a user's role directly in the database.
pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: Role) {
    let existing = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .expect("user to promote must exist");
    let mut active: user::ActiveModel = existing.into();
    active.role = sea_orm::ActiveValue::Set(role);
    active.update(db).await.expect("Failed to set role");
}

/// Register a user with the given role and return (user_id, token).
pub async fn create_user_with_role(app: &TestApp, prefix: &str, role: Role) -> (i32, String) {
    let (id, token) = create_test_user(app, prefix).await;
    set_role(&app.db, id, role).await;
    (id, token)
}

pub async fn get_user(db: &DatabaseConnection, user_id: i32) -> user::Model {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .expect("user must exist")
}

pub async fn insert_post(db: &DatabaseConnection, user_id: i32, title: &str) -> i32 {
    post::ActiveModel {
        user_id: sea_orm::ActiveValue::Set(user_id),
        title: sea_orm::ActiveValue::Set(title.to_string()),
        content: sea_orm::ActiveValue::Set("Lorem ipsum".to_string()),
        created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert post")
    .id
}

pub async fn insert_comment(db: &DatabaseConnection, post_id: i32, user_id: i32) -> i32 {
    comment::ActiveModel {
        post_id: sea_orm::ActiveValue::Set(post_id),
        user_id: sea_orm::ActiveValue::Set(user_id),
        content: sea_orm::ActiveValue::Set("a comment".to_string()),
        created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert comment")
    .id
}

pub async fn insert_message(db: &DatabaseConnection, sender_id: i32, receiver_id: i32) -> i32 {
    message::ActiveModel {
        sender_id: sea_orm::ActiveValue::Set(sender_id),
        receiver_id: sea_orm::ActiveValue::Set(receiver_id),
        content: sea_orm::ActiveValue::Set("hello".to_string()),
        created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert message")
    .id
}

/// File a report through the API and return its id.
pub async fn file_report(
    app: &TestApp,
    token: &str,
    reported_user_id: i32,
    target_type: &str,
    target_id: i32,
) -> i32 {
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "reported_user_id": reported_user_id,
            "target_type": target_type,
            "target_id": target_id,
            "reason": "breaks the rules"
        }))
        .send()
        .await
        .expect("Failed to file report");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse report response");
    assert_eq!(status, StatusCode::OK, "report failed: {}", body);
    body["data"]["id"].as_i64().expect("report id") as i32
}

/// Set a report's status through the API.
pub async fn set_status(
    app: &TestApp,
    token: &str,
    report_id: i32,
    status: &str,
    reason: Option<&str>,
) -> (StatusCode, Value) {
    let resp = app
        .client
        .put(app.url(&format!("/admin/reports/{}/status", report_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "status": status, "reason": reason }))
        .send()
        .await
        .expect("Failed to set report status");
    let code = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse status response");
    (code, body)
}

/// Notifications are written by a background worker; poll until `expected`
/// rows exist for the user or give up after a couple of seconds.
pub async fn wait_for_notifications(
    db: &DatabaseConnection,
    user_id: i32,
    expected: usize,
) -> Vec<NotificationModel> {
    let mut found = Vec::new();
    for _ in 0..40 {
        found = Notification::find()
            .filter(notification::Column::ReceiverId.eq(user_id))
            .order_by_asc(notification::Column::Id)
            .all(db)
            .await
            .unwrap();
        if found.len() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    found
}
