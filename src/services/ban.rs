use crate::{
    config::moderation::ModerationConfig,
    error::{AppError, AppResult},
    models::{
        banned_user, comment, message, post, report, user, BannedUser, Comment, Message, Post,
        Report, Role, TargetType, User,
    },
    services::{
        content::{delete_posts_cascade, purge_reports_for},
        policy::{authorize_ban, ensure_can_ban},
    },
};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

const BANNED_USERNAME_PREFIX: &str = "banned_user_";

pub fn banned_username(user_id: i32) -> String {
    format!("{}{}", BANNED_USERNAME_PREFIX, user_id)
}

pub fn banned_email(user_id: i32, domain: &str) -> String {
    format!("banned_{}@{}", user_id, domain)
}

/// Usernames shaped like a ban placeholder. Registering one would block the
/// anonymizing update of that user id later on.
pub fn is_reserved_username(username: &str) -> bool {
    username
        .trim()
        .to_lowercase()
        .starts_with(BANNED_USERNAME_PREFIX)
}

/// Any address on the placeholder domain is reserved.
pub fn is_reserved_email(email: &str, domain: &str) -> bool {
    let domain = domain.trim().to_lowercase();
    email
        .trim()
        .to_lowercase()
        .rsplit_once('@')
        .is_some_and(|(_, d)| d == domain)
}

/// What a ban removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BanSummary {
    pub user_id: i32,
    pub posts_deleted: u64,
    pub comments_deleted: u64,
    pub reports_deleted: u64,
    pub messages_deleted: u64,
}

pub struct BanService {
    db: DatabaseConnection,
    config: ModerationConfig,
}

impl BanService {
    pub fn new(db: DatabaseConnection, config: ModerationConfig) -> Self {
        Self { db, config }
    }

    /// Anonymize the account, blacklist its email and purge everything it
    /// authored or took part in. All of it commits together or not at all.
    pub async fn ban_user(
        &self,
        target_id: i32,
        actor_id: i32,
        actor_role: Role,
    ) -> AppResult<BanSummary> {
        ensure_can_ban(actor_role)?;

        let target = User::find_by_id(target_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        authorize_ban(actor_role, target.role, actor_id, target_id)?;

        let txn = self.db.begin().await?;

        // Re-read under lock: the role may have changed since the check above.
        let target = User::find_by_id(target_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        authorize_ban(actor_role, target.role, actor_id, target_id)?;

        let original_email = target.email.trim().to_lowercase();
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = target.into();
        active.username = sea_orm::ActiveValue::Set(banned_username(target_id));
        active.email = sea_orm::ActiveValue::Set(banned_email(
            target_id,
            &self.config.banned_email_domain,
        ));
        active.name = sea_orm::ActiveValue::Set(None);
        active.bio = sea_orm::ActiveValue::Set(None);
        active.avatar_url = sea_orm::ActiveValue::Set(None);
        active.cover_url = sea_orm::ActiveValue::Set(None);
        active.password_hash = sea_orm::ActiveValue::Set(String::new());
        active.is_banned = sea_orm::ActiveValue::Set(true);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&txn).await?;

        // Repeat bans only refresh the timestamp, keeping the first email.
        BannedUser::insert(banned_user::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(target_id),
            email: sea_orm::ActiveValue::Set(original_email),
            banned_at: sea_orm::ActiveValue::Set(now),
        })
        .on_conflict(
            OnConflict::column(banned_user::Column::UserId)
                .update_column(banned_user::Column::BannedAt)
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let post_ids: Vec<i32> = Post::find()
            .select_only()
            .column(post::Column::Id)
            .filter(post::Column::UserId.eq(target_id))
            .into_tuple()
            .all(&txn)
            .await?;
        let posts_deleted = delete_posts_cascade(&txn, post_ids).await?;

        let comment_ids: Vec<i32> = Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::UserId.eq(target_id))
            .into_tuple()
            .all(&txn)
            .await?;
        purge_reports_for(&txn, TargetType::Comment, comment_ids).await?;
        let comments_deleted = Comment::delete_many()
            .filter(comment::Column::UserId.eq(target_id))
            .exec(&txn)
            .await?
            .rows_affected;

        let reports_deleted = Report::delete_many()
            .filter(
                Condition::any()
                    .add(report::Column::ReporterId.eq(target_id))
                    .add(report::Column::ReportedUserId.eq(target_id)),
            )
            .exec(&txn)
            .await?
            .rows_affected;

        let messages_deleted = Message::delete_many()
            .filter(
                Condition::any()
                    .add(message::Column::SenderId.eq(target_id))
                    .add(message::Column::ReceiverId.eq(target_id)),
            )
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        tracing::warn!(
            user_id = target_id,
            banned_by = actor_id,
            posts_deleted,
            comments_deleted,
            reports_deleted,
            messages_deleted,
            "User banned"
        );

        Ok(BanSummary {
            user_id: target_id,
            posts_deleted,
            comments_deleted,
            reports_deleted,
            messages_deleted,
        })
    }
}
