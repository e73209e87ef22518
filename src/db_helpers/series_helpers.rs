use sqlx::{Sqlite, SqlitePool};

use crate::db_helpers::is_unique_violation;
use crate::errors::RequestError;
use crate::models::Series;

pub async fn get_all_series_in_db(pool: &SqlitePool) -> Result<Vec<Series>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Series>("SELECT * FROM series ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn create_series_in_db(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
) -> Result<i64, RequestError> {
    let result = sqlx::query("INSERT INTO series (name, description) VALUES ($1, $2)")
        .bind(name)
        .bind(description)
        .execute(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RequestError::Conflict("A series with that name already exists")
            } else {
                e.into()
            }
        })?;
    Ok(result.last_insert_rowid())
}

pub async fn get_series_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Series>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Series>("SELECT * FROM series WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
