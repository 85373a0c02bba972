//! Restaurant endpoints, including the restaurant's likes, rating, comments,
//! dishes and reviews.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use riviu_common::AppResult;
use riviu_core::{
    CommentInput, CommentThread, CreateDishInput, CreatePostInput, CreateRestaurantInput,
    CreatedPost, LikeSummary, RateInput, RatingView, RestaurantListQuery, RestaurantView,
    ReviewView, UpdateRestaurantInput,
};
use riviu_db::{entities::dish, repositories::LikeTarget};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{self, ApiResponse},
};

/// List restaurants, filtered by `?category=` name and `?q=` name keyword.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<RestaurantListQuery>,
) -> AppResult<ApiResponse<Vec<RestaurantView>>> {
    let restaurants = state.restaurant_service.list(&query).await?;
    Ok(ApiResponse::ok(restaurants))
}

/// Restaurants created by the signed-in user.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<RestaurantView>>> {
    let restaurants = state.restaurant_service.list_by_owner(&user.id).await?;
    Ok(ApiResponse::ok(restaurants))
}

async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRestaurantInput>,
) -> AppResult<ApiResponse<RestaurantView>> {
    let restaurant = state
        .restaurant_service
        .create(Some(&user.actor()), input)
        .await?;
    Ok(ApiResponse::created(restaurant))
}

/// Create a restaurant together with the author's first review of it.
async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<CreatedPost>> {
    let post = state
        .restaurant_service
        .create_post(Some(&user.actor()), input)
        .await?;
    Ok(ApiResponse::created(post))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RestaurantView>> {
    let restaurant = state.restaurant_service.get(&id).await?;
    Ok(ApiResponse::ok(restaurant))
}

async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateRestaurantInput>,
) -> AppResult<ApiResponse<RestaurantView>> {
    let restaurant = state
        .restaurant_service
        .update(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::ok(restaurant))
}

/// Delete a restaurant with everything attached to it.
async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .restaurant_service
        .delete(Some(&user.actor()), &id)
        .await?;
    Ok(response::ok())
}

async fn likes(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeSummary>> {
    let summary = state
        .like_service
        .summary(LikeTarget::Restaurant, &id, viewer.user_id())
        .await?;
    Ok(ApiResponse::ok(summary))
}

/// Like the restaurant, or take the like back.
async fn toggle_like(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeSummary>> {
    let summary = state
        .like_service
        .toggle(Some(&user.actor()), LikeTarget::Restaurant, &id)
        .await?;
    Ok(ApiResponse::ok(summary))
}

async fn rating(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RatingView>> {
    let rating = state.rating_service.summary(&id, viewer.user_id()).await?;
    Ok(ApiResponse::ok(rating))
}

/// Set the signed-in user's score, replacing an earlier one.
async fn rate(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RateInput>,
) -> AppResult<ApiResponse<RatingView>> {
    let rating = state
        .rating_service
        .rate(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::ok(rating))
}

async fn comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentThread>>> {
    let threads = state.comment_service.list(&id).await?;
    Ok(ApiResponse::ok(threads))
}

async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<CommentThread>> {
    let thread = state
        .comment_service
        .create(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::created(thread))
}

async fn dishes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<dish::Model>>> {
    let dishes = state.dish_service.list(&id).await?;
    Ok(ApiResponse::ok(dishes))
}

async fn create_dish(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CreateDishInput>,
) -> AppResult<ApiResponse<dish::Model>> {
    let dish = state
        .dish_service
        .create(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::created(dish))
}

async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ReviewView>>> {
    let reviews = state.review_service.list_for_restaurant(&id).await?;
    Ok(ApiResponse::ok(reviews))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/mine", get(mine))
        .route("/post", post(create_post))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/likes", get(likes).post(toggle_like))
        .route("/{id}/rating", get(rating).put(rate))
        .route("/{id}/comments", get(comments).post(create_comment))
        .route("/{id}/dishes", get(dishes).post(create_dish))
        .route("/{id}/reviews", get(reviews))
}
