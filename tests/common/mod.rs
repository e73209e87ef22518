#![allow(dead_code)]

use std::sync::Arc;

use axum::Extension;
use inkpress::authentication::{AuthUser, MaybeUser};
use inkpress::db_helpers::{get_user_by_id, upsert_user};
use inkpress::models::{NewUser, User};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// A fresh in-memory database with the schema applied. Single connection so
/// every statement sees the same memory store.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

pub fn db(pool: &SqlitePool) -> Extension<Arc<SqlitePool>> {
    Extension(Arc::new(pool.clone()))
}

pub fn as_user(user: &User) -> MaybeUser {
    MaybeUser(Some(AuthUser {
        id: user.id,
        token: String::new(),
    }))
}

pub fn anonymous() -> MaybeUser {
    MaybeUser(None)
}

pub async fn seed_user(pool: &SqlitePool, open_id: &str, name: &str) -> User {
    upsert_user(
        pool,
        NewUser {
            open_id: open_id.to_string(),
            name: Some(name.to_string()),
            email: Some(format!("{open_id}@example.com")),
            login_method: Some("oauth".to_string()),
        },
    )
    .await
    .expect("failed to seed user")
}

pub async fn seed_admin(pool: &SqlitePool, open_id: &str, name: &str) -> User {
    let user = seed_user(pool, open_id, name).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .expect("failed to promote user");
    get_user_by_id(pool, user.id)
        .await
        .expect("failed to reload user")
        .expect("seeded user is missing")
}

/// Backdates a post's publication timestamp so ordering is deterministic.
pub async fn set_published_at(pool: &SqlitePool, post_id: i64, timestamp: &str) {
    sqlx::query("UPDATE posts SET published_at = $1 WHERE id = $2")
        .bind(timestamp)
        .bind(post_id)
        .execute(pool)
        .await
        .expect("failed to set published_at");
}
