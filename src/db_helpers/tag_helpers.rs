use sqlx::{Sqlite, SqlitePool};

use crate::db_helpers::is_unique_violation;
use crate::errors::RequestError;
use crate::models::Tag;

pub async fn get_all_tags_in_db(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn create_tag_in_db(pool: &SqlitePool, name: &str) -> Result<i64, RequestError> {
    let result = sqlx::query("INSERT INTO tags (name) VALUES ($1)")
        .bind(name)
        .execute(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RequestError::Conflict("A tag with that name already exists")
            } else {
                e.into()
            }
        })?;
    Ok(result.last_insert_rowid())
}

pub async fn get_tags_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Tag>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Tag>(
        r#"
        SELECT tags.* FROM tags
            JOIN post_tags ON post_tags.tag_id = tags.id
        WHERE post_tags.post_id = $1
        ORDER BY tags.name
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}
