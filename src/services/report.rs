use crate::{
    error::{AppError, AppResult},
    models::{report, Comment, Post, Report, ReportModel, ReportStatus, TargetType, User},
};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select,
};

/// Raw report submission; every field is optional so that absence can be
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub reported_user_id: Option<i32>,
    pub target_type: Option<String>,
    pub target_id: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReport {
    pub reported_user_id: i32,
    pub target_type: TargetType,
    pub target_id: i32,
    pub reason: String,
}

impl ReportInput {
    pub fn validate(self) -> AppResult<ValidReport> {
        let reason = self
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let target_type = self
            .target_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut missing = Vec::new();
        if self.reported_user_id.is_none() {
            missing.push("reported_user_id");
        }
        if target_type.is_none() {
            missing.push("target_type");
        }
        if self.target_id.is_none() {
            missing.push("target_id");
        }
        if reason.is_none() {
            missing.push("reason");
        }

        match (self.reported_user_id, target_type, self.target_id, reason) {
            (Some(reported_user_id), Some(raw_type), Some(target_id), Some(reason)) => {
                let target_type =
                    TargetType::parse(&raw_type).ok_or(AppError::InvalidTargetType(raw_type))?;
                Ok(ValidReport {
                    reported_user_id,
                    target_type,
                    target_id,
                    reason,
                })
            }
            _ => Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub target_type: Option<TargetType>,
    pub status: Option<ReportStatus>,
    /// Already lowered and wrapped in `%` (see `response::normalize_search`).
    pub search: Option<String>,
}

impl ReportFilter {
    /// The single filtered query both the page and its total come from.
    fn query(&self) -> Select<Report> {
        let mut query = Report::find();

        if let Some(t) = self.target_type {
            query = query.filter(report::Column::TargetType.eq(t));
        }
        if let Some(s) = self.status {
            query = query.filter(report::Column::Status.eq(s));
        }
        if let Some(pattern) = &self.search {
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(report::Column::Reason))).like(pattern))
                    .add(
                        Expr::expr(Func::lower(Expr::col(report::Column::StatusReason)))
                            .like(pattern),
                    ),
            );
        }

        query
    }
}

pub struct ReportService {
    db: DatabaseConnection,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_report(
        &self,
        reporter_id: i32,
        input: ReportInput,
    ) -> AppResult<ReportModel> {
        let valid = input.validate()?;

        User::find_by_id(valid.reported_user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Validation("Reported user not found".to_string()))?;

        // The target must exist and belong to the reported user.
        let author_id = match valid.target_type {
            TargetType::User => valid.target_id,
            TargetType::Post => {
                Post::find_by_id(valid.target_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::Validation("Post not found".to_string()))?
                    .user_id
            }
            TargetType::Comment => {
                Comment::find_by_id(valid.target_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::Validation("Comment not found".to_string()))?
                    .user_id
            }
        };
        if author_id != valid.reported_user_id {
            return Err(AppError::Validation(format!(
                "reported_user_id does not match the owner of this {}",
                valid.target_type.as_str()
            )));
        }

        let now = chrono::Utc::now().naive_utc();
        let model = report::ActiveModel {
            reporter_id: sea_orm::ActiveValue::Set(reporter_id),
            reported_user_id: sea_orm::ActiveValue::Set(valid.reported_user_id),
            target_type: sea_orm::ActiveValue::Set(valid.target_type),
            target_id: sea_orm::ActiveValue::Set(valid.target_id),
            reason: sea_orm::ActiveValue::Set(valid.reason),
            status: sea_orm::ActiveValue::Set(ReportStatus::Pending),
            status_reason: sea_orm::ActiveValue::Set(None),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        tracing::info!(
            report_id = saved.id,
            reporter_id,
            reported_user_id = saved.reported_user_id,
            target_type = saved.target_type.as_str(),
            "Report created"
        );
        Ok(saved)
    }

    pub async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let paginator = filter
            .query()
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reports = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reports, total))
    }

    pub async fn delete_report(&self, id: i32) -> AppResult<()> {
        let result = Report::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!(report_id = id, "Report deleted");
        Ok(())
    }
}
