use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::Subscriber;

pub async fn get_subscriber_by_email_in_db(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<Subscriber>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Subscriber>("SELECT * FROM subscribers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn create_subscriber_in_db(pool: &SqlitePool, email: &str) -> Result<i64, RequestError> {
    let result = sqlx::query("INSERT INTO subscribers (email) VALUES ($1)")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Resubscription reuses the unsubscribed row instead of inserting a second
/// one, which the unique email index would reject.
pub async fn reactivate_subscriber_in_db(
    pool: &SqlitePool,
    email: &str,
) -> Result<(), RequestError> {
    sqlx::query(
        r#"
        UPDATE subscribers
        SET is_active = 1,
            subscribed_at = CURRENT_TIMESTAMP,
            unsubscribed_at = NULL
        WHERE email = $1
        "#,
    )
    .bind(email)
    .execute(pool)
    .await?;
    Ok(())
}

/// Unconditional; unknown emails are a silent no-op.
pub async fn unsubscribe_in_db(pool: &SqlitePool, email: &str) -> Result<(), RequestError> {
    sqlx::query(
        r#"
        UPDATE subscribers
        SET is_active = 0,
            unsubscribed_at = CURRENT_TIMESTAMP
        WHERE email = $1
        "#,
    )
    .bind(email)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_active_subscribers_in_db(
    pool: &SqlitePool,
) -> Result<Vec<Subscriber>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Subscriber>(
        r#"
        SELECT * FROM subscribers
        WHERE is_active = 1
        ORDER BY subscribed_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}
