mod common;

use heralert::models::{
    banned_user, comment, message, post, report, BannedUser, Comment, Message, Post, Report, Role,
};
use reqwest::StatusCode;
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::Value;

async fn ban(app: &common::TestApp, token: &str, user_id: i32) -> (StatusCode, Value) {
    let resp = app
        .client
        .post(app.url(&format!("/admin/users/{}/ban", user_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn ban_anonymizes_and_purges_everything() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (target_id, target_token) = common::create_test_user(&app, "target").await;
    let (other_id, other_token) = common::create_test_user(&app, "other").await;
    let original_email = common::get_user(&app.db, target_id).await.email;

    let own_post = common::insert_post(&app.db, target_id, "Mine").await;
    let foreign_comment = common::insert_comment(&app.db, own_post, other_id).await;
    let other_post = common::insert_post(&app.db, other_id, "Theirs").await;
    let own_comment = common::insert_comment(&app.db, other_post, target_id).await;
    common::insert_message(&app.db, target_id, other_id).await;
    common::insert_message(&app.db, other_id, target_id).await;
    common::file_report(&app, &other_token, target_id, "user", target_id).await;
    common::file_report(&app, &other_token, target_id, "comment", own_comment).await;
    common::file_report(&app, &target_token, other_id, "comment", foreign_comment).await;

    let (status, body) = ban(&app, &mod_token, target_id).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["posts_deleted"], 1);
    assert_eq!(body["data"]["comments_deleted"], 1);
    assert_eq!(body["data"]["messages_deleted"], 2);

    let banned = common::get_user(&app.db, target_id).await;
    assert_eq!(banned.username, format!("banned_user_{}", target_id));
    assert_eq!(banned.email, format!("banned_{}@banned.invalid", target_id));
    assert!(banned.password_hash.is_empty());
    assert!(banned.is_banned);

    let ledger = BannedUser::find_by_id(target_id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(ledger.email, original_email);

    let posts = Post::find()
        .filter(post::Column::UserId.eq(target_id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(posts, 0);
    assert!(Comment::find_by_id(foreign_comment).one(&app.db).await.unwrap().is_none());
    let comments = Comment::find()
        .filter(comment::Column::UserId.eq(target_id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(comments, 0);
    let reports = Report::find()
        .filter(
            Condition::any()
                .add(report::Column::ReporterId.eq(target_id))
                .add(report::Column::ReportedUserId.eq(target_id)),
        )
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(reports, 0);
    let messages = Message::find()
        .filter(
            Condition::any()
                .add(message::Column::SenderId.eq(target_id))
                .add(message::Column::ReceiverId.eq(target_id)),
        )
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(messages, 0);

    // Other users' unrelated content survives.
    assert!(Post::find_by_id(other_post).one(&app.db).await.unwrap().is_some());

    // The old token no longer opens protected routes.
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn moderator_cannot_ban_moderator() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (peer_id, _) = common::create_user_with_role(&app, "peer", Role::Moderator).await;
    let post_id = common::insert_post(&app.db, peer_id, "Peer post").await;
    let before = common::get_user(&app.db, peer_id).await;

    let (status, body) = ban(&app, &mod_token, peer_id).await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Moderators cannot ban other moderators");

    assert_eq!(common::get_user(&app.db, peer_id).await, before);
    assert!(Post::find_by_id(post_id).one(&app.db).await.unwrap().is_some());
    assert_eq!(BannedUser::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn moderator_cannot_ban_owner() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (owner_id, _) = common::create_user_with_role(&app, "owner", Role::Owner).await;

    let (status, body) = ban(&app, &mod_token, owner_id).await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Moderators cannot ban the owner");
}

#[tokio::test]
async fn owner_can_ban_moderator() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (mod_id, _) = common::create_user_with_role(&app, "mod", Role::Moderator).await;

    let (status, _) = ban(&app, &owner_token, mod_id).await;
    assert_eq!(status, 200);
    assert!(common::get_user(&app.db, mod_id).await.is_banned);
}

#[tokio::test]
async fn nobody_can_ban_themselves() {
    let app = common::spawn_app().await;
    let (owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;

    let (status, body) = ban(&app, &owner_token, owner_id).await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "You cannot ban your own account");
    assert!(!common::get_user(&app.db, owner_id).await.is_banned);
}

#[tokio::test]
async fn member_cannot_ban() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let (target_id, _) = common::create_test_user(&app, "target").await;

    let (status, body) = ban(&app, &token, target_id).await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Only moderators and owners can ban users");
    assert!(!common::get_user(&app.db, target_id).await.is_banned);
}

#[tokio::test]
async fn member_banning_missing_user_is_still_denied() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "member").await;

    let (status, body) = ban(&app, &token, 99999).await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Only moderators and owners can ban users");
}

#[tokio::test]
async fn banning_missing_user_returns_404() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;

    let (status, _) = ban(&app, &mod_token, 99999).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn repeat_ban_keeps_a_single_ledger_row() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (target_id, _) = common::create_test_user(&app, "target").await;
    let original_email = common::get_user(&app.db, target_id).await.email;

    let (status, _) = ban(&app, &owner_token, target_id).await;
    assert_eq!(status, 200);
    let first = BannedUser::find_by_id(target_id).one(&app.db).await.unwrap().unwrap();

    let (status, _) = ban(&app, &owner_token, target_id).await;
    assert_eq!(status, 200);

    let rows = BannedUser::find()
        .filter(banned_user::Column::UserId.eq(target_id))
        .all(&app.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email, original_email);
    assert!(rows[0].banned_at >= first.banned_at);
}

async fn try_register(app: &common::TestApp, username: &str, email: &str) -> (StatusCode, Value) {
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn placeholder_names_cannot_be_registered_ahead_of_a_ban() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (victim_id, _) = common::create_test_user(&app, "victim").await;

    let (status, body) = try_register(
        &app,
        &format!("banned_user_{}", victim_id),
        "squatter@test.com",
    )
    .await;
    assert_eq!(status, 400, "{}", body);

    let (status, body) = try_register(
        &app,
        "squatter",
        &format!("banned_{}@banned.invalid", victim_id),
    )
    .await;
    assert_eq!(status, 400, "{}", body);

    let (status, body) = ban(&app, &owner_token, victim_id).await;
    assert_eq!(status, 200, "{}", body);
    let victim = common::get_user(&app.db, victim_id).await;
    assert!(victim.is_banned);
    assert_eq!(victim.username, format!("banned_user_{}", victim_id));
}

#[tokio::test]
async fn banned_email_blocks_case_variants() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (target_id, _) = common::register(&app, "evader", "evader@test.com").await;

    let (status, _) = ban(&app, &owner_token, target_id).await;
    assert_eq!(status, 200);

    for email in ["Evader@test.com", "EVADER@TEST.COM", "evader@Test.com"] {
        let (status, body) = try_register(&app, "evader_again", email).await;
        assert_eq!(status, 403, "{} -> {}", email, body);
        assert_eq!(body["message"], "This email belongs to a banned account");
    }
    assert_eq!(BannedUser::find().count(&app.db).await.unwrap(), 1);
}
