mod common;

use axum::extract::FromRequestParts;
use axum::http::Request;
use common::{seed_user, test_pool};
use inkpress::authentication::{issue_session_token, MaybeUser};
use inkpress::db_helpers::{get_user_by_open_id, upsert_user};
use inkpress::errors::RequestError;
use inkpress::models::{NewUser, UserRole};

#[tokio::test]
async fn upserting_is_idempotent_per_open_id() {
    let pool = test_pool().await;

    let first = seed_user(&pool, "oid-1", "Original").await;
    assert_eq!(first.role, UserRole::User);

    let second = upsert_user(
        &pool,
        NewUser {
            open_id: "oid-1".to_string(),
            name: Some("Renamed".to_string()),
            email: None,
            login_method: None,
        },
    )
    .await
    .unwrap();

    // Same row, refreshed profile; absent fields keep their old values.
    assert_eq!(second.id, first.id);
    assert_eq!(second.name.as_deref(), Some("Renamed"));
    assert_eq!(second.email, first.email);
    assert!(second.last_signed_in >= first.last_signed_in);

    let reloaded = get_user_by_open_id(&pool, "oid-1").await.unwrap().unwrap();
    assert_eq!(reloaded.id, first.id);
}

#[tokio::test]
async fn the_owner_open_id_is_promoted_to_admin() {
    std::env::set_var("OWNER_OPEN_ID", "the-owner");
    let pool = test_pool().await;

    let owner = seed_user(&pool, "the-owner", "Owner").await;
    assert_eq!(owner.role, UserRole::Admin);

    let guest = seed_user(&pool, "a-guest", "Guest").await;
    assert_eq!(guest.role, UserRole::User);

    // Promotion survives later sign-ins too.
    let owner = seed_user(&pool, "the-owner", "Owner").await;
    assert_eq!(owner.role, UserRole::Admin);
}

async fn extract(request: Request<()>) -> Result<MaybeUser, RequestError> {
    let (mut parts, _) = request.into_parts();
    MaybeUser::from_request_parts(&mut parts, &()).await
}

#[tokio::test]
async fn session_tokens_round_trip_through_the_extractor() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let token = issue_session_token(42).unwrap();

    // Header scheme.
    let request = Request::builder()
        .uri("/")
        .header("Authorization", format!("Token {token}"))
        .body(())
        .unwrap();
    let user = extract(request).await.unwrap();
    assert_eq!(user.get_id(), Some(42));

    // Cookie scheme.
    let request = Request::builder()
        .uri("/")
        .header("Cookie", format!("theme=dark; session={token}"))
        .body(())
        .unwrap();
    let user = extract(request).await.unwrap();
    assert_eq!(user.get_id(), Some(42));

    // No credential at all is anonymous, not an error.
    let request = Request::builder().uri("/").body(()).unwrap();
    let user = extract(request).await.unwrap();
    assert_eq!(user.get_id(), None);
}

#[tokio::test]
async fn garbage_credentials_are_rejected() {
    std::env::set_var("JWT_SECRET", "test-secret");

    let request = Request::builder()
        .uri("/")
        .header("Authorization", "Token not-a-jwt")
        .body(())
        .unwrap();
    let err = extract(request).await.unwrap_err();
    assert!(matches!(err, RequestError::NotAuthorized(_)));

    // A bearer prefix we do not speak is rejected rather than ignored.
    let request = Request::builder()
        .uri("/")
        .header("Authorization", "Bearer whatever")
        .body(())
        .unwrap();
    let err = extract(request).await.unwrap_err();
    assert!(matches!(err, RequestError::NotAuthorized(_)));

    let request = Request::builder()
        .uri("/")
        .header("Cookie", "session=not-a-jwt")
        .body(())
        .unwrap();
    let err = extract(request).await.unwrap_err();
    assert!(matches!(err, RequestError::NotAuthorized(_)));
}
