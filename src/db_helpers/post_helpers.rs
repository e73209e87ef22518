use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::{CreatePostRequest, SortBy, UpdatePostRequest};
use crate::errors::RequestError;
use crate::models::Post;

pub async fn get_published_posts_in_db(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Post>(
        r#"
        SELECT * FROM posts
        WHERE is_published = 1
        ORDER BY published_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_featured_posts_in_db(
    pool: &SqlitePool,
    sort_by: SortBy,
    limit: i64,
) -> Result<Vec<Post>, RequestError> {
    let order_by = match sort_by {
        SortBy::IsPinned => "is_pinned DESC, published_at DESC",
        SortBy::ViewCount => "view_count DESC",
        SortBy::PublishedAt => "published_at DESC",
    };
    let query = format!(
        "SELECT * FROM posts WHERE is_published = 1 ORDER BY {order_by} LIMIT $1"
    );
    let result = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn get_post_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Post>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

/// Unconditional counter bump; repeated views by the same caller all count.
pub async fn increment_view_count_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn search_posts_in_db(
    pool: &SqlitePool,
    term: &str,
) -> Result<Vec<Post>, RequestError> {
    let pattern = format!("%{term}%");
    let result = sqlx::query_as::<Sqlite, Post>(
        r#"
        SELECT * FROM posts
        WHERE is_published = 1 AND (title LIKE $1 OR content LIKE $1)
        ORDER BY published_at DESC
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_posts_by_year_in_db(
    pool: &SqlitePool,
    year: i32,
) -> Result<Vec<Post>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Post>(
        r#"
        SELECT * FROM posts
        WHERE is_published = 1
            AND CAST(strftime('%Y', published_at) AS INTEGER) = $1
        ORDER BY published_at DESC
        "#,
    )
    .bind(year)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_posts_by_series_in_db(
    pool: &SqlitePool,
    series_id: i64,
) -> Result<Vec<Post>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Post>(
        r#"
        SELECT * FROM posts
        WHERE is_published = 1 AND series_id = $1
        ORDER BY published_at DESC
        "#,
    )
    .bind(series_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_posts_by_tag_in_db(
    pool: &SqlitePool,
    tag_id: i64,
) -> Result<Vec<Post>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Post>(
        r#"
        SELECT posts.* FROM posts
            JOIN post_tags ON post_tags.post_id = posts.id
        WHERE post_tags.tag_id = $1 AND posts.is_published = 1
        ORDER BY posts.published_at DESC
        "#,
    )
    .bind(tag_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

/// Inserts the post and its tag links in one transaction. A post created
/// already published gets its publication timestamp stamped here, once.
pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    CreatePostRequest {
        title,
        content,
        summary,
        cover_image,
        series_id,
        tag_ids,
        is_pinned,
        is_published,
    }: CreatePostRequest,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO posts
            (title, content, summary, cover_image, author_id, series_id,
             is_pinned, is_published, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                CASE WHEN $8 THEN CURRENT_TIMESTAMP ELSE NULL END)
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(summary)
    .bind(cover_image)
    .bind(author_id)
    .bind(series_id)
    .bind(is_pinned)
    .bind(is_published)
    .execute(&mut tx)
    .await?;

    let post_id = result.last_insert_rowid();

    if let Some(tag_ids) = tag_ids {
        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO post_tags (post_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, tag_id) DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(post_id)
}

/// Partial update; absent fields are left untouched. The publication
/// timestamp is written by the first transition to published and never
/// moved afterwards. A provided tag set replaces the existing links
/// wholesale, in the same transaction.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    UpdatePostRequest {
        title,
        content,
        summary,
        cover_image,
        series_id,
        tag_ids,
        is_pinned,
        is_published,
    }: UpdatePostRequest,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE posts SET
            title = COALESCE($1, title),
            content = COALESCE($2, content),
            summary = COALESCE($3, summary),
            cover_image = COALESCE($4, cover_image),
            series_id = COALESCE($5, series_id),
            is_pinned = COALESCE($6, is_pinned),
            published_at = CASE
                WHEN COALESCE($7, 0) AND NOT is_published AND published_at IS NULL
                THEN CURRENT_TIMESTAMP
                ELSE published_at
            END,
            is_published = COALESCE($7, is_published),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $8
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(summary)
    .bind(cover_image)
    .bind(series_id)
    .bind(is_pinned)
    .bind(is_published)
    .bind(id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Post not found"));
    }

    if let Some(tag_ids) = tag_ids {
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(id)
            .execute(&mut tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO post_tags (post_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, tag_id) DO NOTHING
                "#,
            )
            .bind(id)
            .bind(tag_id)
            .execute(&mut tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}
