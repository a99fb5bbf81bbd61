mod common;

use heralert::models::Role;
use serde_json::Value;

async fn post_json(app: &common::TestApp, path: &str, body: Value) -> (u16, Value) {
    let resp = app
        .client
        .post(app.url(path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn register_and_login_by_username_or_email() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::register(&app, "carla", "carla@test.com").await;
    assert!(!token.is_empty());

    for identifier in ["carla", "carla@test.com"] {
        let (status, body) = post_json(
            &app,
            "/auth/login",
            serde_json::json!({ "username": identifier, "password": "test_password_123" }),
        )
        .await;
        assert_eq!(status, 200, "{}", body);
        assert_eq!(body["data"]["user_id"], user_id);
        assert_eq!(body["data"]["role"], 0);
    }

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "carla");
    assert_eq!(body["data"]["role_name"], "member");
}

#[tokio::test]
async fn email_is_stored_lowercased_and_matched_in_any_case() {
    let app = common::spawn_app().await;
    let (user_id, _) = common::register(&app, "hana", "Hana@Test.com").await;
    assert_eq!(common::get_user(&app.db, user_id).await.email, "hana@test.com");

    let (status, body) = post_json(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "HANA@test.COM", "password": "test_password_123" }),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["user_id"], user_id);

    let (status, body) = post_json(
        &app,
        "/auth/register",
        serde_json::json!({
            "username": "hana_two",
            "email": "hana@TEST.com",
            "password": "test_password_123"
        }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn register_conflicts_name_the_field() {
    let app = common::spawn_app().await;
    common::register(&app, "dana", "dana@test.com").await;

    let (status, body) = post_json(
        &app,
        "/auth/register",
        serde_json::json!({
            "username": "someone_else",
            "email": "dana@test.com",
            "password": "test_password_123"
        }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["field"], "email");

    let (status, body) = post_json(
        &app,
        "/auth/register",
        serde_json::json!({
            "username": "dana",
            "email": "other@test.com",
            "password": "test_password_123"
        }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["field"], "username");
}

#[tokio::test]
async fn register_validates_input() {
    let app = common::spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/auth/register",
        serde_json::json!({ "username": "ed", "email": "not-an-email", "password": "short" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_wrong_password_fails() {
    let app = common::spawn_app().await;
    common::register(&app, "erin", "erin@test.com").await;

    let (status, _) = post_json(
        &app,
        "/auth/login",
        serde_json::json!({ "username": "erin", "password": "wrong_password" }),
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn banned_email_cannot_register_again() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (target_id, _) = common::register(&app, "frank", "frank@test.com").await;

    let resp = app
        .client
        .post(app.url(&format!("/admin/users/{}/ban", target_id)))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = post_json(
        &app,
        "/auth/register",
        serde_json::json!({
            "username": "frank_returns",
            "email": "frank@test.com",
            "password": "test_password_123"
        }),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn banned_account_cannot_log_in() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (target_id, _) = common::register(&app, "gina", "gina@test.com").await;

    app.client
        .post(app.url(&format!("/admin/users/{}/ban", target_id)))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();

    let placeholder = format!("banned_user_{}", target_id);
    for identifier in ["gina", placeholder.as_str()] {
        let (status, _) = post_json(
            &app,
            "/auth/login",
            serde_json::json!({ "username": identifier, "password": "test_password_123" }),
        )
        .await;
        assert!(status == 401 || status == 403, "login as {} gave {}", identifier, status);
    }
}

#[tokio::test]
async fn me_requires_token() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
