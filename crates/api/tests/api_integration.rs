//! API integration tests.
//!
//! Requests go through the full router, including the auth middleware, against a
//! mock database whose results are consumed in query order.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use chrono::Utc;
use riviu_api::{AppState, auth_middleware, health, router as api_router};
use riviu_common::LocalStorage;
use riviu_core::{
    AggregationService, CategoryService, CommentService, DishService, FeedService, LikeService,
    MediaService, ProfileService, RatingService, RestaurantService, ReviewService, UserService,
};
use riviu_db::entities::{
    category::{self, CategoryKind},
    user::{self, Role},
};
use riviu_db::repositories::{
    CategoryRepository, CommentRepository, DishRepository, LikeRepository, ProfileRepository,
    RatingRepository, RestaurantRepository, ReviewRepository, TagRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use serde_json::Value as Json;
use tower::ServiceExt;

const TOKEN: &str = "tok_alice";

fn upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("riviu-api-test-{}", std::process::id()))
}

fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(db.clone());
    let profile_repo = ProfileRepository::new(db.clone());
    let category_repo = CategoryRepository::new(db.clone());
    let tag_repo = TagRepository::new(db.clone());
    let restaurant_repo = RestaurantRepository::new(db.clone());
    let dish_repo = DishRepository::new(db.clone());
    let review_repo = ReviewRepository::new(db.clone());
    let rating_repo = RatingRepository::new(db.clone());
    let like_repo = LikeRepository::new(db.clone());
    let comment_repo = CommentRepository::new(db.clone());

    let aggregation = AggregationService::new(rating_repo.clone(), like_repo.clone());
    let storage = Arc::new(LocalStorage::new(
        upload_dir(),
        "https://cdn.example.com".to_string(),
    ));

    AppState {
        user_service: UserService::new(user_repo),
        profile_service: ProfileService::new(profile_repo.clone()),
        restaurant_service: RestaurantService::new(
            restaurant_repo.clone(),
            category_repo.clone(),
            tag_repo.clone(),
            review_repo.clone(),
        ),
        dish_service: DishService::new(
            dish_repo.clone(),
            restaurant_repo.clone(),
            category_repo.clone(),
        ),
        review_service: ReviewService::new(
            review_repo.clone(),
            restaurant_repo.clone(),
            dish_repo,
        ),
        feed_service: FeedService::new(
            review_repo.clone(),
            restaurant_repo.clone(),
            category_repo.clone(),
            tag_repo.clone(),
            aggregation.clone(),
        ),
        like_service: LikeService::new(like_repo, restaurant_repo.clone(), review_repo),
        rating_service: RatingService::new(rating_repo, restaurant_repo.clone(), aggregation),
        comment_service: CommentService::new(comment_repo, restaurant_repo, profile_repo),
        category_service: CategoryService::new(category_repo, tag_repo),
        media_service: MediaService::new(storage, 1024),
    }
}

fn create_test_router(db: MockDatabase) -> Router {
    let state = create_test_state(db.into_connection());
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn alice(role: Role) -> user::Model {
    user::Model {
        id: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        token: Some(TOKEN.to_string()),
        role,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

async fn body_json(response: axum::response::Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(boundary: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_health() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent/endpoint")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signin_with_invalid_json_returns_error() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/signin")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_restaurant_requires_session() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/restaurants")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Pasta Palace","address":"1 Main St"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let db = empty_db().append_query_results([[alice(Role::User)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("token").is_none());
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let db = empty_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, "Bearer stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_restaurant_likes_for_anonymous_viewer() {
    let db = empty_db().append_query_results([[maplit::btreemap! {
        "num_items" => Value::BigInt(Some(3)),
    }]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/restaurants/r1/likes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(body["data"]["hasLiked"], false);
}

#[tokio::test]
async fn test_missing_restaurant_returns_404() {
    let db = empty_db().append_query_results([Vec::<riviu_db::entities::restaurant::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/restaurants/r404")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "RESTAURANT_NOT_FOUND");
}

#[tokio::test]
async fn test_list_dish_categories() {
    let desserts = category::Model {
        id: "c1".to_string(),
        name: "Desserts".to_string(),
        kind: CategoryKind::Dish,
        description: None,
        created_at: Utc::now().into(),
    };
    let db = empty_db().append_query_results([[desserts]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/categories?kind=dish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["name"], "Desserts");
    assert_eq!(body["data"][0]["kind"], "dish");
}

#[tokio::test]
async fn test_non_admin_cannot_create_category() {
    let db = empty_db().append_query_results([[alice(Role::User)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .method("POST")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Italian","kind":"restaurant"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_feed_for_unknown_category_is_empty() {
    let db = empty_db().append_query_results([Vec::<category::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reviews/feed?category=Sushi&q=tuna")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_upload_requires_session() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/media/upload")
                .method("POST")
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(multipart_body("X", "image/png", b"png")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let db = empty_db().append_query_results([[alice(Role::User)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/media/upload")
                .method("POST")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(multipart_body("X", "text/plain", b"hello")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_upload_rejects_oversized_image() {
    let db = empty_db().append_query_results([[alice(Role::User)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/media/upload")
                .method("POST")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(multipart_body("X", "image/png", &[0u8; 2048])))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_image() {
    let db = empty_db().append_query_results([[alice(Role::User)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/media/upload")
                .method("POST")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
                .body(Body::from(multipart_body("X", "image/png", b"\x89PNG....")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://cdn.example.com/"));
    assert!(url.ends_with(".png"));
    assert_eq!(body["data"]["contentType"], "image/png");

    tokio::fs::remove_dir_all(upload_dir()).await.ok();
}
