use crate::config::parse_bool_env;
use crate::error::AppResult;
use crate::models::{user, Role, User};
use crate::services::auth::normalize_email;
use crate::utils::hash_password;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapOwnerConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapOwnerConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_OWNER_ENABLED", false) {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_OWNER_USERNAME").ok()?,
            email: normalize_email(&env::var("BOOTSTRAP_OWNER_EMAIL").ok()?),
            password: env::var("BOOTSTRAP_OWNER_PASSWORD").ok()?,
        })
    }
}

/// 启动时确保存在站长账号：
/// - 若库中已有 owner：不做任何事
/// - 否则若配置的 email/username 已存在且未被封禁：提升为 owner
/// - 否则创建一个新的 owner
pub async fn ensure_bootstrap_owner(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapOwnerConfig::from_env() else {
        return Ok(());
    };

    let owner_exists = User::find()
        .filter(user::Column::Role.eq(Role::Owner))
        .one(db)
        .await?
        .is_some();
    if owner_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(cfg.email.clone()))
                .add(user::Column::Username.eq(cfg.username.clone())),
        )
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = existing {
        if existing.is_banned {
            tracing::warn!(user_id = existing.id, "Bootstrap owner account is banned; skipping");
            return Ok(());
        }
        let user_id = existing.id;
        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(Role::Owner);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(db).await?;
        tracing::info!(user_id, "Promoted bootstrap account to owner");
        return Ok(());
    }

    let password_hash = hash_password(&cfg.password)?;

    let new_user = user::ActiveModel {
        username: sea_orm::ActiveValue::Set(cfg.username),
        email: sea_orm::ActiveValue::Set(cfg.email),
        password_hash: sea_orm::ActiveValue::Set(password_hash),
        role: sea_orm::ActiveValue::Set(Role::Owner),
        is_banned: sea_orm::ActiveValue::Set(false),
        created_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    };

    let owner = new_user.insert(db).await?;
    tracing::info!(user_id = owner.id, "Created bootstrap owner");
    Ok(())
}
