use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Permanent ban ledger. Rows outlive the anonymized `users` row and keep
/// the account's original email so it cannot register again.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banned_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    pub email: String,
    pub banned_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
