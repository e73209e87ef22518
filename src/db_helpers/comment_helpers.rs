use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::CreateCommentRequest;
use crate::errors::RequestError;
use crate::models::{Comment, CommentStatus};

pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Comment>(
        r#"
        SELECT * FROM comments
        WHERE post_id = $1 AND status = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(post_id)
    .bind(CommentStatus::Approved)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_pending_comments_in_db(pool: &SqlitePool) -> Result<Vec<Comment>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Comment>(
        r#"
        SELECT * FROM comments
        WHERE status = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(CommentStatus::Pending)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn get_comment_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Comment>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

/// Inserts an auto-approved comment. The post must exist, and a reply's
/// parent must be a comment on the same post.
pub async fn create_comment_in_db(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    CreateCommentRequest { content, parent_id }: CreateCommentRequest,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if post.is_none() {
        return Err(RequestError::NotFound("Post not found"));
    }

    if let Some(parent_id) = parent_id {
        let parent =
            sqlx::query_as::<Sqlite, Comment>("SELECT * FROM comments WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(&mut tx)
                .await?;
        match parent {
            None => {
                return Err(RequestError::Validation("Parent comment does not exist"));
            }
            Some(parent) if parent.post_id != post_id => {
                return Err(RequestError::Validation(
                    "Parent comment belongs to a different post",
                ));
            }
            Some(_) => {}
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO comments (content, post_id, author_id, parent_id, status)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(content)
    .bind(post_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(CommentStatus::Approved)
    .execute(&mut tx)
    .await?;

    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

/// First like inserts the junction row and bumps the counter in one
/// transaction; the unique index makes a repeat like a no-op. Returns
/// whether this call was the first like.
pub async fn like_comment_in_db(
    pool: &SqlitePool,
    comment_id: i64,
    user_id: i64,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;

    let comment = sqlx::query("SELECT id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(&mut tx)
        .await?;
    if comment.is_none() {
        return Err(RequestError::NotFound("Comment not found"));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO comment_likes (comment_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (comment_id, user_id) DO NOTHING
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(&mut tx)
    .await?;

    if inserted.rows_affected() == 0 {
        tx.commit().await?;
        return Ok(false);
    }

    sqlx::query("UPDATE comments SET like_count = like_count + 1 WHERE id = $1")
        .bind(comment_id)
        .execute(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Returns whether a like row was removed; the counter never drops below
/// zero even if it was already out of step.
pub async fn unlike_comment_in_db(
    pool: &SqlitePool,
    comment_id: i64,
    user_id: i64,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query(
        "DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2",
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(&mut tx)
    .await?;

    if deleted.rows_affected() == 0 {
        tx.commit().await?;
        return Ok(false);
    }

    sqlx::query("UPDATE comments SET like_count = MAX(like_count - 1, 0) WHERE id = $1")
        .bind(comment_id)
        .execute(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn has_user_liked_comment_in_db(
    pool: &SqlitePool,
    comment_id: i64,
    user_id: i64,
) -> Result<bool, RequestError> {
    let result = sqlx::query(
        "SELECT id FROM comment_likes WHERE comment_id = $1 AND user_id = $2",
    )
    .bind(comment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(result.is_some())
}

pub async fn update_comment_status_in_db(
    pool: &SqlitePool,
    id: i64,
    status: CommentStatus,
) -> Result<(), RequestError> {
    let result = sqlx::query(
        "UPDATE comments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Comment not found"));
    }
    Ok(())
}

/// Removes the comment together with its like rows.
pub async fn delete_comment_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;

    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Comment not found"));
    }

    tx.commit().await?;
    Ok(())
}
