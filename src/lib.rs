pub mod ai;
pub mod authentication;
pub mod data_formats;
pub mod db_helpers;
pub mod errors;
pub mod handlers;
pub mod models;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
pub use errors::RequestError;
use handlers::*;
pub use models::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Connects to the configured store, applying migrations on the way up.
pub async fn init_db() -> Result<SqlitePool> {
    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
        tracing::info!("creating database {}", db_url);
        Sqlite::create_database(&db_url)
            .await
            .context("Failed to create database")?;
    }
    let pool = SqlitePool::connect(&db_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations applied");
    Ok(pool)
}

/// Serves the API over the given pool. Tests use this directly with an
/// in-memory database.
pub async fn serve(pool: SqlitePool, address: SocketAddr) -> Result<()> {
    let app = make_router().layer(Extension(Arc::new(pool)));
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn run_app(address: SocketAddr) -> Result<()> {
    let pool = init_db().await?;
    serve(pool, address).await
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/user", get(current_user))
        .route("/logout", post(handlers::logout))
        .route("/posts", get(get_published_posts).post(create_post))
        .route("/posts/featured", get(get_featured_posts))
        .route("/posts/search", get(search_posts))
        .route("/posts/year/:year", get(get_posts_by_year))
        .route("/posts/series/:series_id", get(get_posts_by_series))
        .route("/posts/tag/:tag_id", get(get_posts_by_tag))
        .route("/posts/:id", get(get_post).put(update_post))
        .route("/posts/:id/view", post(increment_post_view))
        .route("/posts/:id/comments", get(get_post_comments).post(create_comment))
        .route("/comments/pending", get(get_pending_comments))
        .route("/comments/:id", delete(delete_comment))
        .route("/comments/:id/status", put(update_comment_status))
        .route("/comments/:id/like", post(like_comment).delete(unlike_comment))
        .route("/tags", get(get_all_tags).post(create_tag))
        .route("/series", get(get_all_series).post(create_series))
        .route("/subscribers", get(get_active_subscribers).post(subscribe))
        .route("/subscribers/unsubscribe", post(unsubscribe))
        .route("/ai/summary", post(generate_summary))
        .route("/ai/cover-image", post(generate_cover_image))
        .fallback(not_found)
}
