//! Lookups and purges of reportable content, generic over the connection so
//! they can run inside the caller's transaction.

use crate::{
    error::AppResult,
    models::{comment, post, report, Comment, Post, Report, TargetType},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

/// Human-readable label for a reported post or comment, plus the post it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLabel {
    pub post_id: Option<i32>,
    pub title: String,
}

pub fn comment_title(parent_post_title: &str) -> String {
    format!("Comment on: {}", parent_post_title)
}

pub async fn content_label<C: ConnectionTrait>(
    conn: &C,
    target_type: TargetType,
    target_id: i32,
) -> AppResult<Option<ContentLabel>> {
    let label = match target_type {
        TargetType::User => None,
        TargetType::Post => Post::find_by_id(target_id)
            .one(conn)
            .await?
            .map(|p| ContentLabel {
                post_id: Some(p.id),
                title: p.title,
            }),
        TargetType::Comment => {
            let Some(c) = Comment::find_by_id(target_id).one(conn).await? else {
                return Ok(None);
            };
            let parent = Post::find_by_id(c.post_id).one(conn).await?;
            Some(ContentLabel {
                post_id: Some(c.post_id),
                title: comment_title(parent.as_ref().map_or("", |p| p.title.as_str())),
            })
        }
    };
    Ok(label)
}

/// Delete every report that targets one of `ids`.
pub async fn purge_reports_for<C: ConnectionTrait>(
    conn: &C,
    target_type: TargetType,
    ids: Vec<i32>,
) -> AppResult<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = Report::delete_many()
        .filter(report::Column::TargetType.eq(target_type))
        .filter(report::Column::TargetId.is_in(ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Delete a comment and the reports against it. Returns whether the comment
/// existed.
pub async fn delete_comment_cascade<C: ConnectionTrait>(
    conn: &C,
    comment_id: i32,
) -> AppResult<bool> {
    purge_reports_for(conn, TargetType::Comment, vec![comment_id]).await?;
    let result = Comment::delete_by_id(comment_id).exec(conn).await?;
    Ok(result.rows_affected > 0)
}

/// Delete posts together with their comments and every report targeting any
/// of them.
pub async fn delete_posts_cascade<C: ConnectionTrait>(
    conn: &C,
    post_ids: Vec<i32>,
) -> AppResult<u64> {
    if post_ids.is_empty() {
        return Ok(0);
    }

    let comment_ids: Vec<i32> = Comment::find()
        .select_only()
        .column(comment::Column::Id)
        .filter(comment::Column::PostId.is_in(post_ids.clone()))
        .into_tuple()
        .all(conn)
        .await?;

    purge_reports_for(conn, TargetType::Comment, comment_ids).await?;
    Comment::delete_many()
        .filter(comment::Column::PostId.is_in(post_ids.clone()))
        .exec(conn)
        .await?;

    purge_reports_for(conn, TargetType::Post, post_ids.clone()).await?;
    let result = Post::delete_many()
        .filter(post::Column::Id.is_in(post_ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Remove the content a report points at. User targets are left alone.
pub async fn remove_target<C: ConnectionTrait>(
    conn: &C,
    target_type: TargetType,
    target_id: i32,
) -> AppResult<()> {
    match target_type {
        TargetType::User => {}
        TargetType::Post => {
            delete_posts_cascade(conn, vec![target_id]).await?;
        }
        TargetType::Comment => {
            delete_comment_cascade(conn, target_id).await?;
        }
    }
    Ok(())
}
