use crate::{
    config::moderation::ModerationConfig,
    error::{AppError, AppResult},
    models::{banned_user, user, BannedUser, Role, User, UserModel},
    services::ban::{is_reserved_email, is_reserved_username},
    utils::{encode_access_token, hash_password, verify_password},
};
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};

/// Emails are stored and compared lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn lower_eq<C>(column: C, value: &str) -> SimpleExpr
where
    C: ColumnTrait + 'static,
{
    Expr::expr(Func::lower(Expr::col(column))).eq(value)
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new member account.
    /// Returns (user_model, access_token).
    pub async fn register(
        &self,
        moderation: &ModerationConfig,
        username: &str,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> AppResult<(UserModel, String)> {
        let email = normalize_email(email);
        let email = email.as_str();

        if is_reserved_username(username) {
            return Err(AppError::Validation("This username is reserved".to_string()));
        }
        if is_reserved_email(email, &moderation.banned_email_domain) {
            return Err(AppError::Validation(
                "This email domain is reserved".to_string(),
            ));
        }

        let banned = BannedUser::find()
            .filter(lower_eq(banned_user::Column::Email, email))
            .count(&self.db)
            .await?;
        if banned > 0 {
            return Err(AppError::Denied(
                "This email belongs to a banned account".to_string(),
            ));
        }

        if self.exists(lower_eq(user::Column::Email, email)).await? {
            return Err(AppError::Conflict {
                field: "email",
                message: "Email already registered".to_string(),
            });
        }
        if self.exists(user::Column::Username.eq(username)).await? {
            return Err(AppError::Conflict {
                field: "username",
                message: "Username already taken".to_string(),
            });
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            name: sea_orm::ActiveValue::Set(name.map(str::to_string)),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            role: sea_orm::ActiveValue::Set(Role::Member),
            is_banned: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let access_token = encode_access_token(&user.id.to_string())?;
        tracing::info!(user_id = user.id, "User registered");

        Ok((user, access_token))
    }

    /// Login with either the username or the email.
    /// Returns (user_model, access_token)
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(lower_eq(user::Column::Email, &normalize_email(identifier))),
            )
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_banned {
            return Err(AppError::Forbidden);
        }

        // Anonymized accounts carry a blank hash, which bcrypt rejects as malformed.
        if !verify_password(password, &user.password_hash).unwrap_or(false) {
            return Err(AppError::Unauthorized);
        }

        let access_token = encode_access_token(&user.id.to_string())?;
        Ok((user, access_token))
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        let user = User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(user)
    }

    async fn exists(&self, condition: SimpleExpr) -> AppResult<bool> {
        let count = User::find()
            .filter(condition)
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
