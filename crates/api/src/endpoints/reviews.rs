//! Review endpoints and the review feed.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use riviu_common::AppResult;
use riviu_core::{
    CreateReviewInput, FeedEntry, FeedQuery, FeedView, LikeSummary, ReviewView, SearchOutcome,
    filter_items,
};
use riviu_db::repositories::LikeTarget;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Feed query string.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    /// Restaurant category name.
    pub category: Option<String>,
    pub limit: Option<u64>,
    /// Search over restaurant name, address, description, category and tags.
    pub q: Option<String>,
}

/// The review feed, best rated restaurants first.
///
/// With `?q=` only matching entries are returned; a blank query returns everything.
async fn feed(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> AppResult<ApiResponse<Vec<FeedEntry>>> {
    let query = FeedQuery {
        category: params.category,
        limit: params.limit,
    };
    let entries = state.feed_service.load(&query, viewer.user_id()).await?;

    let mut view = FeedView::new(entries);
    if let Some(q) = params.q {
        let results = filter_items(&q, view.entries());
        view.apply_search(SearchOutcome { query: q, results });
    }

    Ok(ApiResponse::ok(view.visible().to_vec()))
}

async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReviewInput>,
) -> AppResult<ApiResponse<ReviewView>> {
    let review = state
        .review_service
        .create(Some(&user.actor()), input)
        .await?;
    Ok(ApiResponse::created(review))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReviewView>> {
    let review = state.review_service.get(&id).await?;
    Ok(ApiResponse::ok(review))
}

async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.review_service.delete(Some(&user.actor()), &id).await?;
    Ok(response::ok())
}

/// Reviews written by a user.
async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<ReviewView>>> {
    let reviews = state.review_service.list_for_user(&user_id).await?;
    Ok(ApiResponse::ok(reviews))
}

async fn likes(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeSummary>> {
    let summary = state
        .like_service
        .summary(LikeTarget::Review, &id, viewer.user_id())
        .await?;
    Ok(ApiResponse::ok(summary))
}

async fn toggle_like(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeSummary>> {
    let summary = state
        .like_service
        .toggle(Some(&user.actor()), LikeTarget::Review, &id)
        .await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/feed", get(feed))
        .route("/user/{user_id}", get(by_user))
        .route("/{id}", get(show).delete(delete))
        .route("/{id}/likes", get(likes).post(toggle_like))
}
