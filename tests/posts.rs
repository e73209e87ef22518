mod common;

use axum::extract::{Path, Query};
use axum::Json;
use chrono::Utc;
use common::{anonymous, as_user, db, seed_admin, seed_user, set_published_at, test_pool};
use inkpress::data_formats::{
    CreatePostRequest, FeaturedQueryParams, PageQueryParams, SearchQueryParams, SortBy,
    UpdatePostRequest,
};
use inkpress::db_helpers::{
    create_series_in_db, create_tag_in_db, get_post_by_id_in_db, get_tags_for_post_in_db,
};
use inkpress::errors::RequestError;
use inkpress::handlers;

fn published_post(title: &str) -> CreatePostRequest {
    CreatePostRequest {
        title: title.to_string(),
        content: "Some body text".to_string(),
        summary: None,
        cover_image: None,
        series_id: None,
        tag_ids: None,
        is_pinned: false,
        is_published: true,
    }
}

fn draft_post(title: &str) -> CreatePostRequest {
    CreatePostRequest {
        is_published: false,
        ..published_post(title)
    }
}

#[tokio::test]
async fn post_creation_is_admin_only() {
    let pool = test_pool().await;
    let user = seed_user(&pool, "reader", "Reader").await;

    let err = handlers::create_post(db(&pool), anonymous(), Json(published_post("Hello")))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::NotAuthorized(_)));

    let err = handlers::create_post(db(&pool), as_user(&user), Json(published_post("Hello")))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Forbidden(_)));
}

#[tokio::test]
async fn post_input_is_validated() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let err = handlers::create_post(db(&pool), as_user(&admin), Json(published_post("")))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Validation(_)));

    let long_title = "x".repeat(501);
    let err = handlers::create_post(db(&pool), as_user(&admin), Json(published_post(&long_title)))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Validation(_)));

    let mut request = published_post("Valid title");
    request.content = String::new();
    let err = handlers::create_post(db(&pool), as_user(&admin), Json(request))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Validation(_)));
}

#[tokio::test]
async fn unpublished_posts_read_as_not_found_for_everyone() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let Json(created) = handlers::create_post(db(&pool), as_user(&admin), Json(draft_post("Draft")))
        .await
        .unwrap();

    // The row exists, but the read path masks it. The route carries no
    // caller identity at all, so even an admin gets the same answer.
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap();
    assert!(post.is_some());

    let err = handlers::get_post(db(&pool), Path(created.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::NotFound(_)));

    let err = handlers::get_post(db(&pool), Path(created.id))
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::NotFound(_)));
}

#[tokio::test]
async fn publication_timestamp_is_stamped_exactly_once() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let Json(created) = handlers::create_post(db(&pool), as_user(&admin), Json(draft_post("Draft")))
        .await
        .unwrap();
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap().unwrap();
    assert!(post.published_at.is_none());

    // First transition to published stamps the timestamp.
    handlers::update_post(
        db(&pool),
        as_user(&admin),
        Path(created.id),
        Json(UpdatePostRequest {
            is_published: Some(true),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap().unwrap();
    let stamped = post.published_at.expect("publishing must stamp published_at");
    assert!((Utc::now() - stamped).num_seconds().abs() < 5);

    // An unrelated edit leaves it alone.
    handlers::update_post(
        db(&pool),
        as_user(&admin),
        Path(created.id),
        Json(UpdatePostRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(post.published_at, Some(stamped));
    assert_eq!(post.title, "Renamed");

    // Unpublishing and republishing does not move it either.
    for flag in [false, true] {
        handlers::update_post(
            db(&pool),
            as_user(&admin),
            Path(created.id),
            Json(UpdatePostRequest {
                is_published: Some(flag),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
    }
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(post.published_at, Some(stamped));
}

#[tokio::test]
async fn creating_a_published_post_stamps_immediately() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let Json(created) =
        handlers::create_post(db(&pool), as_user(&admin), Json(published_post("Live")))
            .await
            .unwrap();
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap().unwrap();
    assert!(post.is_published);
    assert!(post.published_at.is_some());
}

#[tokio::test]
async fn updating_tags_replaces_the_whole_set() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let tag_a = create_tag_in_db(&pool, "alpha").await.unwrap();
    let tag_b = create_tag_in_db(&pool, "beta").await.unwrap();
    let tag_c = create_tag_in_db(&pool, "gamma").await.unwrap();

    let mut request = published_post("Tagged");
    request.tag_ids = Some(vec![tag_a, tag_b]);
    let Json(created) = handlers::create_post(db(&pool), as_user(&admin), Json(request))
        .await
        .unwrap();

    let names = |tags: Vec<inkpress::models::Tag>| {
        tags.into_iter().map(|tag| tag.name).collect::<Vec<_>>()
    };
    let tags = get_tags_for_post_in_db(&pool, created.id).await.unwrap();
    assert_eq!(names(tags), ["alpha", "beta"]);

    handlers::update_post(
        db(&pool),
        as_user(&admin),
        Path(created.id),
        Json(UpdatePostRequest {
            tag_ids: Some(vec![tag_b, tag_c]),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let tags = get_tags_for_post_in_db(&pool, created.id).await.unwrap();
    assert_eq!(names(tags), ["beta", "gamma"]);

    // Leaving the tag set out of the update keeps the links as they are.
    handlers::update_post(
        db(&pool),
        as_user(&admin),
        Path(created.id),
        Json(UpdatePostRequest {
            title: Some("Still tagged".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let tags = get_tags_for_post_in_db(&pool, created.id).await.unwrap();
    assert_eq!(names(tags), ["beta", "gamma"]);
}

#[tokio::test]
async fn updating_a_missing_post_is_not_found() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let err = handlers::update_post(
        db(&pool),
        as_user(&admin),
        Path(4242),
        Json(UpdatePostRequest {
            title: Some("Ghost".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RequestError::NotFound(_)));
}

#[tokio::test]
async fn published_listing_paginates_and_hides_drafts() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let mut ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        let Json(created) =
            handlers::create_post(db(&pool), as_user(&admin), Json(published_post(title)))
                .await
                .unwrap();
        ids.push(created.id);
    }
    handlers::create_post(db(&pool), as_user(&admin), Json(draft_post("Hidden")))
        .await
        .unwrap();

    set_published_at(&pool, ids[0], "2024-01-01 00:00:00").await;
    set_published_at(&pool, ids[1], "2024-02-01 00:00:00").await;
    set_published_at(&pool, ids[2], "2024-03-01 00:00:00").await;

    let Json(posts) = handlers::get_published_posts(
        db(&pool),
        Query(PageQueryParams {
            limit: 10,
            offset: 0,
        }),
    )
    .await
    .unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, ["Three", "Two", "One"]);

    let Json(posts) = handlers::get_published_posts(
        db(&pool),
        Query(PageQueryParams {
            limit: 2,
            offset: 2,
        }),
    )
    .await
    .unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, ["One"]);
}

#[tokio::test]
async fn featured_ordering_honours_each_mode() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let create = |title: &str, pinned: bool| {
        let mut request = published_post(title);
        request.is_pinned = pinned;
        handlers::create_post(db(&pool), as_user(&admin), Json(request))
    };
    let Json(newest) = create("Newest", false).await.unwrap();
    let Json(popular) = create("Popular", false).await.unwrap();
    let Json(pinned) = create("Pinned", true).await.unwrap();

    set_published_at(&pool, newest.id, "2024-03-01 00:00:00").await;
    set_published_at(&pool, popular.id, "2024-02-01 00:00:00").await;
    set_published_at(&pool, pinned.id, "2024-01-01 00:00:00").await;
    sqlx::query("UPDATE posts SET view_count = $1 WHERE id = $2")
        .bind(10_i64)
        .bind(popular.id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE posts SET view_count = $1 WHERE id = $2")
        .bind(5_i64)
        .bind(pinned.id)
        .execute(&pool)
        .await
        .unwrap();

    let featured = |sort_by: SortBy, limit: i64| {
        handlers::get_featured_posts(db(&pool), Query(FeaturedQueryParams { sort_by, limit }))
    };

    let Json(posts) = featured(SortBy::PublishedAt, 5).await.unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, ["Newest", "Popular", "Pinned"]);

    let Json(posts) = featured(SortBy::ViewCount, 5).await.unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, ["Popular", "Pinned", "Newest"]);

    let Json(posts) = featured(SortBy::IsPinned, 5).await.unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, ["Pinned", "Newest", "Popular"]);

    let Json(posts) = featured(SortBy::PublishedAt, 2).await.unwrap();
    assert_eq!(posts.len(), 2);
}

#[tokio::test]
async fn search_matches_title_or_content_of_published_posts() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    handlers::create_post(
        db(&pool),
        as_user(&admin),
        Json(published_post("Shipping Rust to production")),
    )
    .await
    .unwrap();
    let mut request = published_post("Async adventures");
    request.content = "A long piece about tokio internals".to_string();
    handlers::create_post(db(&pool), as_user(&admin), Json(request))
        .await
        .unwrap();
    handlers::create_post(db(&pool), as_user(&admin), Json(draft_post("Rust drafts")))
        .await
        .unwrap();

    let search = |query: &str| {
        handlers::search_posts(
            db(&pool),
            Query(SearchQueryParams {
                query: query.to_string(),
            }),
        )
    };

    let Json(posts) = search("Rust").await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.title, "Shipping Rust to production");

    let Json(posts) = search("tokio").await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.title, "Async adventures");

    let Json(posts) = search("quantum").await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn posts_filter_by_year_series_and_tag() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let series_id = create_series_in_db(&pool, "Deep Dives", None).await.unwrap();
    let tag_id = create_tag_in_db(&pool, "databases").await.unwrap();

    let mut request = published_post("Old favourite");
    request.series_id = Some(series_id);
    request.tag_ids = Some(vec![tag_id]);
    let Json(old) = handlers::create_post(db(&pool), as_user(&admin), Json(request))
        .await
        .unwrap();
    let Json(recent) =
        handlers::create_post(db(&pool), as_user(&admin), Json(published_post("Fresh take")))
            .await
            .unwrap();
    set_published_at(&pool, old.id, "2023-06-15 10:00:00").await;
    set_published_at(&pool, recent.id, "2024-06-15 10:00:00").await;

    let Json(posts) = handlers::get_posts_by_year(db(&pool), Path(2023)).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.id, old.id);

    let Json(posts) = handlers::get_posts_by_series(db(&pool), Path(series_id))
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.id, old.id);

    let Json(posts) = handlers::get_posts_by_tag(db(&pool), Path(tag_id)).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.id, old.id);

    let Json(posts) = handlers::get_posts_by_year(db(&pool), Path(1999)).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn view_counter_increments_without_deduplication() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let Json(created) =
        handlers::create_post(db(&pool), as_user(&admin), Json(published_post("Counted")))
            .await
            .unwrap();

    for _ in 0..2 {
        let Json(response) = handlers::increment_post_view(db(&pool), Path(created.id))
            .await
            .unwrap();
        assert!(response.success);
    }
    let post = get_post_by_id_in_db(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(post.view_count, 2);

    // Fire-and-forget: unknown ids succeed without touching anything.
    let Json(response) = handlers::increment_post_view(db(&pool), Path(999)).await.unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn responses_are_enriched_with_author_tags_and_series() {
    let pool = test_pool().await;
    let admin = seed_admin(&pool, "writer", "Writer").await;

    let series_id = create_series_in_db(&pool, "Letters", Some("Monthly notes"))
        .await
        .unwrap();
    let tag_id = create_tag_in_db(&pool, "meta").await.unwrap();
    let mut request = published_post("Enriched");
    request.series_id = Some(series_id);
    request.tag_ids = Some(vec![tag_id]);
    let Json(created) = handlers::create_post(db(&pool), as_user(&admin), Json(request))
        .await
        .unwrap();

    let Json(post) = handlers::get_post(db(&pool), Path(created.id)).await.unwrap();
    let author = post.author.expect("author must be resolved");
    assert_eq!(author.id, admin.id);
    assert_eq!(author.name.as_deref(), Some("Writer"));
    assert!(author.email.is_some());
    assert_eq!(post.tags.len(), 1);
    assert_eq!(post.tags[0].name, "meta");
    assert_eq!(post.series.as_ref().map(|s| s.name.as_str()), Some("Letters"));

    // List views resolve the author too, but never expose the email.
    let Json(posts) = handlers::get_published_posts(db(&pool), Query(PageQueryParams::default()))
        .await
        .unwrap();
    let author = posts[0].author.as_ref().expect("author must be resolved");
    assert!(author.email.is_none());
}
