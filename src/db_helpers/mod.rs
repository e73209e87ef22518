use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::{NewUser, User, UserRole};

mod comment_helpers;
mod post_helpers;
mod series_helpers;
mod subscriber_helpers;
mod tag_helpers;

pub use comment_helpers::*;
pub use post_helpers::*;
pub use series_helpers::*;
pub use subscriber_helpers::*;
pub use tag_helpers::*;

/// SQLite reports unique-index violations only through the error message.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(e) if e.message().contains("UNIQUE constraint failed")
    )
}

// ----------------- User Functions -----------------

/// Inserts or refreshes a user record keyed by the auth provider's open id.
/// Provided profile fields overwrite stale values, absent ones are kept, and
/// `last_signed_in` is always bumped. The open id named by `OWNER_OPEN_ID`
/// is promoted to admin on every sign-in.
pub async fn upsert_user(pool: &SqlitePool, user: NewUser) -> Result<User, RequestError> {
    let role = match std::env::var("OWNER_OPEN_ID") {
        Ok(owner) if owner == user.open_id => UserRole::Admin,
        _ => UserRole::User,
    };

    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        INSERT INTO users (open_id, name, email, login_method, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (open_id) DO UPDATE SET
            name = COALESCE(excluded.name, users.name),
            email = COALESCE(excluded.email, users.email),
            login_method = COALESCE(excluded.login_method, users.login_method),
            role = CASE WHEN excluded.role = 'admin' THEN 'admin' ELSE users.role END,
            last_signed_in = CURRENT_TIMESTAMP,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(user.open_id)
    .bind(user.name)
    .bind(user.email)
    .bind(user.login_method)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(result)
}

pub async fn get_user_by_open_id(
    pool: &SqlitePool,
    open_id: &str,
) -> Result<Option<User>, RequestError> {
    let result = sqlx::query_as::<Sqlite, User>("SELECT * FROM users WHERE open_id = $1")
        .bind(open_id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let result = sqlx::query_as::<Sqlite, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
