use crate::{
    error::{AppError, AppResult},
    models::{report, user, Report, ReportStatus, Role, TargetType, User, UserModel},
    services::{
        content::{delete_comment_cascade, delete_posts_cascade},
        policy::{assignable_role, authorize_role_change},
    },
};
use sea_orm::{
    sea_query::{Expr, Func, Query},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;

pub struct AdminService {
    db: DatabaseConnection,
}

fn user_search(pattern: &str) -> Condition {
    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(user::Column::Username))).like(pattern))
        .add(Expr::expr(Func::lower(Expr::col(user::Column::Email))).like(pattern))
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_users(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let mut query = User::find();
        if let Some(pattern) = search {
            query = query.filter(user_search(pattern));
        }

        let paginator = query
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    /// Active accounts whose upheld user-reports reached the ban threshold,
    /// each paired with that count.
    pub async fn users_to_ban(
        &self,
        ban_threshold: u64,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<(UserModel, u64)>, u64)> {
        let threshold = i64::try_from(ban_threshold).unwrap_or(i64::MAX);
        let eligible = Query::select()
            .column(report::Column::ReportedUserId)
            .from(report::Entity)
            .and_where(report::Column::TargetType.eq(TargetType::User))
            .and_where(report::Column::Status.eq(ReportStatus::Upheld))
            .group_by_col(report::Column::ReportedUserId)
            .and_having(Expr::expr(Expr::col(report::Column::Id).count()).gte(threshold))
            .to_owned();

        let mut query = User::find()
            .filter(user::Column::Id.in_subquery(eligible))
            .filter(user::Column::IsBanned.eq(false));
        if let Some(pattern) = search {
            query = query.filter(user_search(pattern));
        }

        let paginator = query
            .order_by_asc(user::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;

        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let counts: HashMap<i32, i64> = if ids.is_empty() {
            HashMap::new()
        } else {
            Report::find()
                .select_only()
                .column(report::Column::ReportedUserId)
                .column_as(Expr::col(report::Column::Id).count(), "valid_reports")
                .filter(report::Column::TargetType.eq(TargetType::User))
                .filter(report::Column::Status.eq(ReportStatus::Upheld))
                .filter(report::Column::ReportedUserId.is_in(ids))
                .group_by(report::Column::ReportedUserId)
                .into_tuple::<(i32, i64)>()
                .all(&self.db)
                .await?
                .into_iter()
                .collect()
        };

        let items = users
            .into_iter()
            .map(|u| {
                let count = counts.get(&u.id).copied().unwrap_or(0).max(0) as u64;
                (u, count)
            })
            .collect();
        Ok((items, total))
    }

    pub async fn update_user_role(
        &self,
        actor_id: i32,
        actor_role: Role,
        target_id: i32,
        new_level: i16,
    ) -> AppResult<UserModel> {
        let role = assignable_role(new_level).ok_or_else(|| {
            AppError::Validation("role must be 0 (member) or 1 (moderator)".to_string())
        })?;

        let existing = User::find_by_id(target_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        authorize_role_change(actor_id, actor_role, target_id, existing.role)?;

        let previous = existing.role;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(role);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;

        tracing::info!(
            user_id = target_id,
            changed_by = actor_id,
            from = previous.level(),
            to = role.level(),
            "User role changed"
        );
        Ok(updated)
    }

    pub async fn admin_delete_post(&self, post_id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;
        if delete_posts_cascade(&txn, vec![post_id]).await? == 0 {
            return Err(AppError::NotFound);
        }
        txn.commit().await?;
        tracing::info!(post_id, "Post removed by moderator");
        Ok(())
    }

    pub async fn admin_delete_comment(&self, comment_id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;
        if !delete_comment_cascade(&txn, comment_id).await? {
            return Err(AppError::NotFound);
        }
        txn.commit().await?;
        tracing::info!(comment_id, "Comment removed by moderator");
        Ok(())
    }
}
