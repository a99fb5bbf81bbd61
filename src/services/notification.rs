use crate::{
    error::{AppError, AppResult},
    models::{notification, Notification, NotificationModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Sent to the reporter once a verdict is reached.
pub const KIND_REPORT_OUTCOME: &str = "report_outcome";
/// Sent to the reported user when their post or comment was removed.
pub const KIND_CONTENT_REMOVED: &str = "content_removed";
/// Sent to the reported user when a report against their account is upheld.
pub const KIND_ACCOUNT_WARNING: &str = "account_warning";

/// A notification waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub receiver_id: i32,
    pub sender_id: i32,
    pub kind: &'static str,
    pub post_id: Option<i32>,
    pub post_title: Option<String>,
    pub message: String,
}

pub struct NotificationService {
    db: DatabaseConnection,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewNotification) -> AppResult<NotificationModel> {
        let now = chrono::Utc::now().naive_utc();
        let model = notification::ActiveModel {
            receiver_id: sea_orm::ActiveValue::Set(new.receiver_id),
            sender_id: sea_orm::ActiveValue::Set(new.sender_id),
            kind: sea_orm::ActiveValue::Set(new.kind.to_string()),
            post_id: sea_orm::ActiveValue::Set(new.post_id),
            post_title: sea_orm::ActiveValue::Set(new.post_title),
            message: sea_orm::ActiveValue::Set(new.message),
            is_read: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        Ok(saved)
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        let paginator = Notification::find()
            .filter(notification::Column::ReceiverId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn unread_count(&self, user_id: i32) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::ReceiverId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.owned_by(id, user_id).await?;

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = sea_orm::ActiveValue::Set(true);
        active.update(&self.db).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        self.owned_by(id, user_id).await?;
        Notification::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn owned_by(&self, id: i32, user_id: i32) -> AppResult<NotificationModel> {
        let existing = Notification::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if existing.receiver_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(existing)
    }
}
