use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    ai,
    authentication::{clear_session_cookie, require_admin, require_user, MaybeUser},
    data_formats::{
        AuthorInfo, CommentResponse, CoverImageResponse, CreateCommentRequest, CreatePostRequest,
        CreateSeriesRequest, CreateTagRequest, EmailRequest, FeaturedQueryParams,
        GenerateCoverImageRequest, GenerateSummaryRequest, IdResponse, PageQueryParams,
        PendingCommentResponse, PostRef, PostResponse, SearchQueryParams, SubscribeResponse,
        SuccessResponse, SummaryResponse, UpdateCommentStatusRequest, UpdatePostRequest,
    },
    db_helpers::{
        create_comment_in_db, create_post_in_db, create_series_in_db, create_subscriber_in_db,
        create_tag_in_db, delete_comment_in_db, get_active_subscribers_in_db, get_all_series_in_db,
        get_all_tags_in_db, get_comments_for_post_in_db, get_featured_posts_in_db,
        get_pending_comments_in_db, get_post_by_id_in_db, get_posts_by_series_in_db,
        get_posts_by_tag_in_db, get_posts_by_year_in_db, get_published_posts_in_db,
        get_series_by_id_in_db, get_subscriber_by_email_in_db, get_tags_for_post_in_db,
        get_user_by_id, has_user_liked_comment_in_db, increment_view_count_in_db,
        like_comment_in_db, reactivate_subscriber_in_db, search_posts_in_db,
        unlike_comment_in_db, unsubscribe_in_db, update_comment_status_in_db, update_post_in_db,
    },
    errors::RequestError,
    models::{Post, Series, Subscriber, Tag, User},
};

type Db = Extension<Arc<SqlitePool>>;

// ----------------- Helper Handlers -----------------

pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

fn author_info(user: User) -> AuthorInfo {
    AuthorInfo {
        id: user.id,
        name: user.name,
        email: None,
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

async fn enrich_post(
    pool: &SqlitePool,
    post: Post,
    include_email: bool,
) -> Result<PostResponse, RequestError> {
    let author = get_user_by_id(pool, post.author_id).await?;
    let tags = get_tags_for_post_in_db(pool, post.id).await?;
    let series = match post.series_id {
        Some(series_id) => get_series_by_id_in_db(pool, series_id).await?,
        None => None,
    };
    Ok(PostResponse {
        author: author.map(|author| AuthorInfo {
            id: author.id,
            name: author.name,
            email: if include_email { author.email } else { None },
        }),
        tags,
        series,
        post,
    })
}

async fn enrich_posts(
    pool: &SqlitePool,
    posts: Vec<Post>,
) -> Result<Vec<PostResponse>, RequestError> {
    let mut result = Vec::with_capacity(posts.len());
    for post in posts {
        result.push(enrich_post(pool, post, false).await?);
    }
    Ok(result)
}

// ----------------- Post Handlers -----------------

pub async fn get_featured_posts(
    Extension(pool): Db,
    Query(params): Query<FeaturedQueryParams>,
) -> Result<Json<Vec<PostResponse>>, RequestError> {
    let posts = get_featured_posts_in_db(&pool, params.sort_by, params.limit).await?;
    Ok(Json(enrich_posts(&pool, posts).await?))
}

pub async fn get_published_posts(
    Extension(pool): Db,
    Query(params): Query<PageQueryParams>,
) -> Result<Json<Vec<PostResponse>>, RequestError> {
    let posts = get_published_posts_in_db(&pool, params.limit, params.offset).await?;
    Ok(Json(enrich_posts(&pool, posts).await?))
}

pub async fn search_posts(
    Extension(pool): Db,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<Vec<PostResponse>>, RequestError> {
    let posts = search_posts_in_db(&pool, &params.query).await?;
    Ok(Json(enrich_posts(&pool, posts).await?))
}

pub async fn get_posts_by_year(
    Extension(pool): Db,
    Path(year): Path<i32>,
) -> Result<Json<Vec<PostResponse>>, RequestError> {
    let posts = get_posts_by_year_in_db(&pool, year).await?;
    Ok(Json(enrich_posts(&pool, posts).await?))
}

pub async fn get_posts_by_series(
    Extension(pool): Db,
    Path(series_id): Path<i64>,
) -> Result<Json<Vec<PostResponse>>, RequestError> {
    let posts = get_posts_by_series_in_db(&pool, series_id).await?;
    Ok(Json(enrich_posts(&pool, posts).await?))
}

pub async fn get_posts_by_tag(
    Extension(pool): Db,
    Path(tag_id): Path<i64>,
) -> Result<Json<Vec<PostResponse>>, RequestError> {
    let posts = get_posts_by_tag_in_db(&pool, tag_id).await?;
    Ok(Json(enrich_posts(&pool, posts).await?))
}

/// Unpublished posts are indistinguishable from missing ones here, for every
/// caller; there is no admin preview through this route.
pub async fn get_post(
    Extension(pool): Db,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, RequestError> {
    let post = match get_post_by_id_in_db(&pool, id).await? {
        Some(post) if post.is_published => post,
        _ => return Err(RequestError::NotFound("Post not found")),
    };
    Ok(Json(enrich_post(&pool, post, true).await?))
}

pub async fn increment_post_view(
    Extension(pool): Db,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, RequestError> {
    increment_view_count_in_db(&pool, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn create_post(
    Extension(pool): Db,
    user: MaybeUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<IdResponse>, RequestError> {
    let admin = require_admin(&pool, &user).await?;
    if request.title.is_empty() || request.title.chars().count() > 500 {
        return Err(RequestError::Validation(
            "Title must be between 1 and 500 characters",
        ));
    }
    if request.content.is_empty() {
        return Err(RequestError::Validation("Content cannot be empty"));
    }
    let id = create_post_in_db(&pool, admin.id, request).await?;
    Ok(Json(IdResponse { id }))
}

pub async fn update_post(
    Extension(pool): Db,
    user: MaybeUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<SuccessResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    if let Some(title) = &request.title {
        if title.is_empty() || title.chars().count() > 500 {
            return Err(RequestError::Validation(
                "Title must be between 1 and 500 characters",
            ));
        }
    }
    if let Some(content) = &request.content {
        if content.is_empty() {
            return Err(RequestError::Validation("Content cannot be empty"));
        }
    }
    update_post_in_db(&pool, id, request).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ----------------- Tag Handlers -----------------

pub async fn get_all_tags(Extension(pool): Db) -> Result<Json<Vec<Tag>>, RequestError> {
    Ok(Json(get_all_tags_in_db(&pool).await?))
}

pub async fn create_tag(
    Extension(pool): Db,
    user: MaybeUser,
    Json(request): Json<CreateTagRequest>,
) -> Result<Json<IdResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    if request.name.is_empty() || request.name.chars().count() > 100 {
        return Err(RequestError::Validation(
            "Tag name must be between 1 and 100 characters",
        ));
    }
    let id = create_tag_in_db(&pool, &request.name).await?;
    Ok(Json(IdResponse { id }))
}

// ----------------- Series Handlers -----------------

pub async fn get_all_series(Extension(pool): Db) -> Result<Json<Vec<Series>>, RequestError> {
    Ok(Json(get_all_series_in_db(&pool).await?))
}

pub async fn create_series(
    Extension(pool): Db,
    user: MaybeUser,
    Json(request): Json<CreateSeriesRequest>,
) -> Result<Json<IdResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    if request.name.is_empty() || request.name.chars().count() > 255 {
        return Err(RequestError::Validation(
            "Series name must be between 1 and 255 characters",
        ));
    }
    let id = create_series_in_db(&pool, &request.name, request.description.as_deref()).await?;
    Ok(Json(IdResponse { id }))
}

// ----------------- Comment Handlers -----------------

pub async fn get_post_comments(
    Extension(pool): Db,
    user: MaybeUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<CommentResponse>>, RequestError> {
    let caller_id = user.get_id();
    let comments = get_comments_for_post_in_db(&pool, post_id).await?;
    let mut result = Vec::with_capacity(comments.len());
    for comment in comments {
        let author = get_user_by_id(&pool, comment.author_id).await?;
        let has_liked = match caller_id {
            Some(user_id) => has_user_liked_comment_in_db(&pool, comment.id, user_id).await?,
            None => false,
        };
        result.push(CommentResponse {
            author: author.map(author_info),
            has_liked,
            comment,
        });
    }
    Ok(Json(result))
}

pub async fn create_comment(
    Extension(pool): Db,
    user: MaybeUser,
    Path(post_id): Path<i64>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<IdResponse>, RequestError> {
    let auth = require_user(&user)?;
    if request.content.is_empty() {
        return Err(RequestError::Validation("Comment content cannot be empty"));
    }
    let id = create_comment_in_db(&pool, post_id, auth.id, request).await?;
    Ok(Json(IdResponse { id }))
}

pub async fn like_comment(
    Extension(pool): Db,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, RequestError> {
    let auth = require_user(&user)?;
    let success = like_comment_in_db(&pool, id, auth.id).await?;
    Ok(Json(SuccessResponse { success }))
}

pub async fn unlike_comment(
    Extension(pool): Db,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, RequestError> {
    let auth = require_user(&user)?;
    let success = unlike_comment_in_db(&pool, id, auth.id).await?;
    Ok(Json(SuccessResponse { success }))
}

pub async fn get_pending_comments(
    Extension(pool): Db,
    user: MaybeUser,
) -> Result<Json<Vec<PendingCommentResponse>>, RequestError> {
    require_admin(&pool, &user).await?;
    let comments = get_pending_comments_in_db(&pool).await?;
    let mut result = Vec::with_capacity(comments.len());
    for comment in comments {
        let author = get_user_by_id(&pool, comment.author_id).await?;
        let post = get_post_by_id_in_db(&pool, comment.post_id).await?;
        result.push(PendingCommentResponse {
            author: author.map(author_info),
            post: post.map(|post| PostRef {
                id: post.id,
                title: post.title,
            }),
            comment,
        });
    }
    Ok(Json(result))
}

pub async fn update_comment_status(
    Extension(pool): Db,
    user: MaybeUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCommentStatusRequest>,
) -> Result<Json<SuccessResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    update_comment_status_in_db(&pool, id, request.status).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn delete_comment(
    Extension(pool): Db,
    user: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    delete_comment_in_db(&pool, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ----------------- Subscriber Handlers -----------------

pub async fn subscribe(
    Extension(pool): Db,
    Json(request): Json<EmailRequest>,
) -> Result<Json<SubscribeResponse>, RequestError> {
    if !is_valid_email(&request.email) {
        return Err(RequestError::Validation("A valid email address is required"));
    }
    match get_subscriber_by_email_in_db(&pool, &request.email).await? {
        Some(existing) if existing.is_active => Err(RequestError::Conflict(
            "This email address is already subscribed",
        )),
        Some(_) => {
            reactivate_subscriber_in_db(&pool, &request.email).await?;
            Ok(Json(SubscribeResponse {
                success: true,
                message: "Subscription reactivated".to_string(),
            }))
        }
        None => {
            create_subscriber_in_db(&pool, &request.email).await?;
            Ok(Json(SubscribeResponse {
                success: true,
                message: "Subscribed".to_string(),
            }))
        }
    }
}

pub async fn unsubscribe(
    Extension(pool): Db,
    Json(request): Json<EmailRequest>,
) -> Result<Json<SuccessResponse>, RequestError> {
    if !is_valid_email(&request.email) {
        return Err(RequestError::Validation("A valid email address is required"));
    }
    unsubscribe_in_db(&pool, &request.email).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn get_active_subscribers(
    Extension(pool): Db,
    user: MaybeUser,
) -> Result<Json<Vec<Subscriber>>, RequestError> {
    require_admin(&pool, &user).await?;
    Ok(Json(get_active_subscribers_in_db(&pool).await?))
}

// ----------------- AI Handlers -----------------

pub async fn generate_summary(
    Extension(pool): Db,
    user: MaybeUser,
    Json(request): Json<GenerateSummaryRequest>,
) -> Result<Json<SummaryResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    let config = ai::AiConfig::from_env()?;
    let summary = ai::generate_summary(&config, &request.title, &request.content).await?;
    Ok(Json(SummaryResponse { summary }))
}

pub async fn generate_cover_image(
    Extension(pool): Db,
    user: MaybeUser,
    Json(request): Json<GenerateCoverImageRequest>,
) -> Result<Json<CoverImageResponse>, RequestError> {
    require_admin(&pool, &user).await?;
    let config = ai::AiConfig::from_env()?;
    let keywords = request.keywords.unwrap_or_default();
    let cover_image = ai::generate_cover_image(&config, &request.title, &keywords).await?;
    Ok(Json(CoverImageResponse { cover_image }))
}

// ----------------- Auth Handlers -----------------

pub async fn current_user(
    Extension(pool): Db,
    user: MaybeUser,
) -> Result<Json<Option<User>>, RequestError> {
    let user = match user.get_id() {
        Some(id) => get_user_by_id(&pool, id).await?,
        None => None,
    };
    Ok(Json(user))
}

pub async fn logout() -> Result<(HeaderMap, Json<SuccessResponse>), RequestError> {
    let cookie = clear_session_cookie();
    let value =
        HeaderValue::from_str(&cookie.to_string()).map_err(|_| RequestError::ServerError)?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok((headers, Json(SuccessResponse { success: true })))
}
