mod common;

use heralert::models::{Comment, Post, Report, Role};
use reqwest::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::Value;

async fn change_role(
    app: &common::TestApp,
    token: &str,
    user_id: i32,
    role: i16,
) -> (StatusCode, Value) {
    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", user_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "role": role }))
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn users_to_ban(app: &common::TestApp, token: &str) -> Value {
    app.client
        .get(app.url("/admin/users-to-ban"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn list_users_with_search() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    for i in 1..=3 {
        common::create_test_user(&app, &format!("alice{}", i)).await;
    }
    common::create_test_user(&app, "bob").await;

    let resp = app
        .client
        .get(app.url("/admin/users?search=ALICE&per_page=2"))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert!(body["data"]["items"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn list_users_as_member_fails() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "member").await;

    let resp = app
        .client
        .get(app.url("/admin/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn owner_promotes_and_demotes() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (user_id, _) = common::create_test_user(&app, "member").await;

    let (status, body) = change_role(&app, &owner_token, user_id, 1).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["role"], 1);
    assert_eq!(common::get_user(&app.db, user_id).await.role, Role::Moderator);

    let (status, _) = change_role(&app, &owner_token, user_id, 0).await;
    assert_eq!(status, 200);
    assert_eq!(common::get_user(&app.db, user_id).await.role, Role::Member);
}

#[tokio::test]
async fn owner_role_cannot_be_granted_or_changed() {
    let app = common::spawn_app().await;
    let (owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;
    let (other_owner, _) = common::create_user_with_role(&app, "owner2", Role::Owner).await;
    let (user_id, _) = common::create_test_user(&app, "member").await;

    let (status, _) = change_role(&app, &owner_token, user_id, 2).await;
    assert_eq!(status, 400);

    let (status, _) = change_role(&app, &owner_token, other_owner, 0).await;
    assert_eq!(status, 403);

    let (status, body) = change_role(&app, &owner_token, owner_id, 1).await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "You cannot change your own role");
}

#[tokio::test]
async fn moderator_cannot_change_roles() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (user_id, _) = common::create_test_user(&app, "member").await;

    let (status, body) = change_role(&app, &mod_token, user_id, 1).await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Only the owner can change user roles");
    assert_eq!(common::get_user(&app.db, user_id).await.role, Role::Member);
}

#[tokio::test]
async fn role_change_on_missing_user_returns_404() {
    let app = common::spawn_app().await;
    let (_owner_id, owner_token) = common::create_user_with_role(&app, "owner", Role::Owner).await;

    let (status, _) = change_role(&app, &owner_token, 99999, 1).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn users_to_ban_lists_accounts_at_threshold_until_banned() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (target_id, _) = common::create_test_user(&app, "target").await;
    let (almost_id, _) = common::create_test_user(&app, "almost").await;

    for i in 0..3 {
        let (_, token) = common::create_test_user(&app, &format!("reporter{}", i)).await;
        let id = common::file_report(&app, &token, target_id, "user", target_id).await;
        common::set_status(&app, &mod_token, id, "justificado", Some("abuse")).await;
        if i < 2 {
            let id = common::file_report(&app, &token, almost_id, "user", almost_id).await;
            common::set_status(&app, &mod_token, id, "justificado", Some("abuse")).await;
        }
    }

    let body = users_to_ban(&app, &mod_token).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], target_id);
    assert_eq!(body["data"]["items"][0]["valid_reports"], 3);

    let resp = app
        .client
        .post(app.url(&format!("/admin/users/{}/ban", target_id)))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = users_to_ban(&app, &mod_token).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn moderator_deletes_post_with_its_comments_and_reports() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (author_id, author_token) = common::create_test_user(&app, "author").await;
    let post_id = common::insert_post(&app.db, author_id, "Post").await;
    let comment_id = common::insert_comment(&app.db, post_id, author_id).await;
    common::file_report(&app, &author_token, author_id, "comment", comment_id).await;

    let resp = app
        .client
        .delete(app.url(&format!("/admin/posts/{}", post_id)))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(Post::find_by_id(post_id).one(&app.db).await.unwrap().is_none());
    assert!(Comment::find_by_id(comment_id).one(&app.db).await.unwrap().is_none());
    assert_eq!(Report::find().count(&app.db).await.unwrap(), 0);

    let resp = app
        .client
        .delete(app.url(&format!("/admin/posts/{}", post_id)))
        .bearer_auth(&mod_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn moderator_deletes_comment() {
    let app = common::spawn_app().await;
    let (_mod_id, mod_token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (author_id, _) = common::create_test_user(&app, "author").await;
    let post_id = common::insert_post(&app.db, author_id, "Post").await;
    let comment_id = common::insert_comment(&app.db, post_id, author_id).await;

    let url = app.url(&format!("/admin/comments/{}", comment_id));
    let resp = app.client.delete(&url).bearer_auth(&mod_token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(Post::find_by_id(post_id).one(&app.db).await.unwrap().is_some());

    let resp = app.client.delete(&url).bearer_auth(&mod_token).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn admin_requires_auth() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/admin/users")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}
