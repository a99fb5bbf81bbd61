//! Verdicts on reports.
//!
//! A status change is written in one transaction together with everything
//! that depends on it: the valid-report recount for user reports and the
//! removal of upheld posts/comments. Notifications are planned from the
//! committed outcome and handed to the sink afterwards.

use crate::{
    config::moderation::ModerationConfig,
    error::{AppError, AppResult},
    models::{report, Report, ReportStatus, TargetType, User},
    services::{
        content::{content_label, remove_target, ContentLabel},
        notification::{
            NewNotification, KIND_ACCOUNT_WARNING, KIND_CONTENT_REMOVED, KIND_REPORT_OUTCOME,
        },
        notification_queue::NotificationSink,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait,
};

const MISSING_CONTENT_TITLE: &str = "(deleted content)";

/// Upheld `user` reports against `user_id`, as seen by `conn`.
pub async fn count_valid_reports<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
    let count = Report::find()
        .filter(report::Column::ReportedUserId.eq(user_id))
        .filter(report::Column::TargetType.eq(TargetType::User))
        .filter(report::Column::Status.eq(ReportStatus::Upheld))
        .count(conn)
        .await?;
    Ok(count)
}

/// How a status transition moves the reported user's valid-report count.
pub fn valid_count_delta(prior: ReportStatus, next: ReportStatus) -> i64 {
    match (prior == ReportStatus::Upheld, next == ReportStatus::Upheld) {
        (false, true) => 1,
        (true, false) => -1,
        _ => 0,
    }
}

pub fn parse_verdict(
    status: &str,
    reason: Option<&str>,
) -> AppResult<(ReportStatus, Option<String>)> {
    let raw = status.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("status is required".to_string()));
    }
    let status = ReportStatus::parse(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "status must be one of: {}, {}, {}",
            ReportStatus::Pending.as_str(),
            ReportStatus::Upheld.as_str(),
            ReportStatus::Rejected.as_str()
        ))
    })?;

    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    if status.is_verdict() && reason.is_none() {
        return Err(AppError::MissingReason(format!(
            "A reason is required when setting status to '{}'",
            status.as_str()
        )));
    }
    Ok((status, reason))
}

/// Result of a committed status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjudication {
    pub report_id: i32,
    pub reporter_id: i32,
    pub reported_user_id: i32,
    pub target_type: TargetType,
    pub target_id: i32,
    pub previous_status: ReportStatus,
    pub status: ReportStatus,
    pub reason: Option<String>,
    /// Set for `user` reports only.
    pub valid_report_count: Option<u64>,
    pub content_removed: bool,
}

/// Everything the notification texts depend on.
#[derive(Debug, Clone)]
pub struct VerdictContext<'a> {
    pub outcome: &'a Adjudication,
    pub actor_id: i32,
    pub label: Option<&'a ContentLabel>,
    pub reported_username: Option<&'a str>,
    pub ban_threshold: u64,
}

pub fn plan_notifications(ctx: &VerdictContext<'_>) -> Vec<NewNotification> {
    let outcome = ctx.outcome;
    if !outcome.status.is_verdict() {
        return Vec::new();
    }
    let upheld = outcome.status == ReportStatus::Upheld;
    let reason = outcome.reason.as_deref().unwrap_or_default();
    let title = ctx
        .label
        .map(|l| l.title.as_str())
        .unwrap_or(MISSING_CONTENT_TITLE);
    let count = outcome.valid_report_count.unwrap_or(0);
    let threshold_reached = count >= ctx.ban_threshold;

    // A removed post no longer has anything to link to.
    let post_id = match (outcome.target_type, upheld) {
        (TargetType::Post, true) => None,
        _ => ctx.label.and_then(|l| l.post_id),
    };
    let post_title = ctx.label.map(|l| l.title.clone());

    let reporter_message = match (outcome.target_type, upheld) {
        (TargetType::Post, true) => format!(
            "Your report on the post \"{}\" was upheld and the post has been removed. Moderator note: {}",
            title, reason
        ),
        (TargetType::Post, false) => format!(
            "Your report on the post \"{}\" was reviewed and the post was kept. Moderator note: {}",
            title, reason
        ),
        (TargetType::Comment, true) => format!(
            "Your report on a comment ({}) was upheld and the comment has been removed. Moderator note: {}",
            title, reason
        ),
        (TargetType::Comment, false) => format!(
            "Your report on a comment ({}) was reviewed and the comment was kept. Moderator note: {}",
            title, reason
        ),
        (TargetType::User, true) => {
            let who = ctx.reported_username.unwrap_or("this user");
            if threshold_reached {
                format!(
                    "Your report against {} was upheld. The account now has {} upheld reports and is up for a ban. Moderator note: {}",
                    who, count, reason
                )
            } else {
                format!(
                    "Your report against {} was upheld. Moderator note: {}",
                    who, reason
                )
            }
        }
        (TargetType::User, false) => format!(
            "Your report against {} was reviewed and not upheld. Moderator note: {}",
            ctx.reported_username.unwrap_or("this user"),
            reason
        ),
    };

    let mut planned = vec![NewNotification {
        receiver_id: outcome.reporter_id,
        sender_id: ctx.actor_id,
        kind: KIND_REPORT_OUTCOME,
        post_id,
        post_title: post_title.clone(),
        message: reporter_message,
    }];

    if upheld && outcome.reported_user_id != outcome.reporter_id {
        let (kind, message) = match outcome.target_type {
            TargetType::Post => (
                KIND_CONTENT_REMOVED,
                format!(
                    "Your post \"{}\" was removed after a report against it was upheld. Reason: {}",
                    title, reason
                ),
            ),
            TargetType::Comment => (
                KIND_CONTENT_REMOVED,
                format!(
                    "Your comment ({}) was removed after a report against it was upheld. Reason: {}",
                    title, reason
                ),
            ),
            TargetType::User if threshold_reached => (
                KIND_ACCOUNT_WARNING,
                format!(
                    "A report against your account was upheld. You now have {} upheld reports and your account is subject to a ban. Reason: {}",
                    count, reason
                ),
            ),
            TargetType::User => (
                KIND_ACCOUNT_WARNING,
                format!(
                    "A report against your account was upheld ({} of {}). Reaching {} upheld reports can lead to a ban. Reason: {}",
                    count, ctx.ban_threshold, ctx.ban_threshold, reason
                ),
            ),
        };
        planned.push(NewNotification {
            receiver_id: outcome.reported_user_id,
            sender_id: ctx.actor_id,
            kind,
            post_id,
            post_title,
            message,
        });
    }

    planned
}

pub struct AdjudicationService {
    db: DatabaseConnection,
    sink: Box<dyn NotificationSink>,
    config: ModerationConfig,
}

impl AdjudicationService {
    pub fn new(
        db: DatabaseConnection,
        sink: impl NotificationSink + 'static,
        config: ModerationConfig,
    ) -> Self {
        Self {
            db,
            sink: Box::new(sink),
            config,
        }
    }

    pub async fn set_report_status(
        &self,
        report_id: i32,
        actor_id: i32,
        status: &str,
        reason: Option<&str>,
    ) -> AppResult<Adjudication> {
        let (status, reason) = parse_verdict(status, reason)?;

        let txn = self.db.begin().await?;

        let existing = Report::find_by_id(report_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let previous_status = existing.status;
        let target_type = existing.target_type;
        let target_id = existing.target_id;
        let reporter_id = existing.reporter_id;
        let reported_user_id = existing.reported_user_id;

        let label = content_label(&txn, target_type, target_id).await?;
        let reported_username = match target_type {
            TargetType::User => User::find_by_id(reported_user_id)
                .one(&txn)
                .await?
                .map(|u| u.username),
            _ => None,
        };
        let count_before = match target_type {
            TargetType::User => Some(count_valid_reports(&txn, reported_user_id).await?),
            _ => None,
        };

        let mut active: report::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(status);
        active.status_reason = sea_orm::ActiveValue::Set(reason.clone());
        active.update(&txn).await?;

        let valid_report_count = match count_before {
            Some(before) => {
                let after = count_valid_reports(&txn, reported_user_id).await?;
                let expected =
                    before.saturating_add_signed(valid_count_delta(previous_status, status));
                if after != expected {
                    tracing::warn!(
                        report_id,
                        reported_user_id,
                        before,
                        after,
                        expected,
                        "Valid report count moved concurrently"
                    );
                }
                Some(after)
            }
            None => None,
        };

        let content_removed = status == ReportStatus::Upheld && target_type != TargetType::User;
        if content_removed {
            remove_target(&txn, target_type, target_id).await?;
        }

        txn.commit().await?;

        let outcome = Adjudication {
            report_id,
            reporter_id,
            reported_user_id,
            target_type,
            target_id,
            previous_status,
            status,
            reason,
            valid_report_count,
            content_removed,
        };
        tracing::info!(
            report_id,
            actor_id,
            previous = previous_status.as_str(),
            status = status.as_str(),
            valid_report_count = ?valid_report_count,
            content_removed,
            "Report status updated"
        );

        let ctx = VerdictContext {
            outcome: &outcome,
            actor_id,
            label: label.as_ref(),
            reported_username: reported_username.as_deref(),
            ban_threshold: self.config.ban_threshold,
        };
        for notification in plan_notifications(&ctx) {
            self.sink.enqueue(notification);
        }

        Ok(outcome)
    }
}
