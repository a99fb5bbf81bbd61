use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a report accuses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "comment")]
    Comment,
}

impl TargetType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "user" => Some(TargetType::User),
            "post" => Some(TargetType::Post),
            "comment" => Some(TargetType::Comment),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::User => "user",
            TargetType::Post => "post",
            TargetType::Comment => "comment",
        }
    }
}

/// Report lifecycle. `Pending` is the initial state; the two verdicts can be
/// swapped (or reverted to pending) by a later adjudication.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReportStatus {
    #[sea_orm(string_value = "em_avaliacao")]
    #[serde(rename = "em_avaliacao")]
    Pending,
    #[sea_orm(string_value = "justificado")]
    #[serde(rename = "justificado")]
    Upheld,
    #[sea_orm(string_value = "nao_justificado")]
    #[serde(rename = "nao_justificado")]
    Rejected,
}

impl ReportStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "em_avaliacao" => Some(ReportStatus::Pending),
            "justificado" => Some(ReportStatus::Upheld),
            "nao_justificado" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "em_avaliacao",
            ReportStatus::Upheld => "justificado",
            ReportStatus::Rejected => "nao_justificado",
        }
    }

    /// Verdicts require a written reason and notify the parties.
    pub fn is_verdict(self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reporter_id: i32,
    pub reported_user_id: i32,
    pub target_type: TargetType,
    pub target_id: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub status: ReportStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub status_reason: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReportedUserId",
        to = "super::user::Column::Id"
    )]
    ReportedUser,
}

impl ActiveModelBehavior for ActiveModel {}
