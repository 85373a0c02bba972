//! Dish endpoints. Listing and creation live under the restaurant.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use riviu_common::AppResult;
use riviu_core::{ReviewView, UpdateDishInput};
use riviu_db::entities::dish;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<dish::Model>> {
    let dish = state.dish_service.get(&id).await?;
    Ok(ApiResponse::ok(dish))
}

async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateDishInput>,
) -> AppResult<ApiResponse<dish::Model>> {
    let dish = state
        .dish_service
        .update(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::ok(dish))
}

async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.dish_service.delete(Some(&user.actor()), &id).await?;
    Ok(response::ok())
}

async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ReviewView>>> {
    let reviews = state.review_service.list_for_dish(&id).await?;
    Ok(ApiResponse::ok(reviews))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/reviews", get(reviews))
}
