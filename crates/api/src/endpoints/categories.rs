//! Category and tag endpoints. Reads are public, writes need an admin.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use riviu_common::AppResult;
use riviu_core::{CreateCategoryInput, CreateTagInput, UpdateCategoryInput};
use riviu_db::entities::{
    category::{self, CategoryKind},
    tag,
};
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    pub kind: Option<CategoryKind>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let categories = state.category_service.list(query.kind).await?;
    Ok(ApiResponse::ok(categories))
}

async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state
        .category_service
        .create(Some(&user.actor()), input)
        .await?;
    Ok(ApiResponse::created(category))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.category_service.get(&id).await?;
    Ok(ApiResponse::ok(category))
}

async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state
        .category_service
        .update(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::ok(category))
}

/// Delete a category. Restaurants and dishes in it lose their category.
async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .category_service
        .delete(Some(&user.actor()), &id)
        .await?;
    Ok(response::ok())
}

async fn list_tags(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<tag::Model>>> {
    let tags = state.category_service.list_tags().await?;
    Ok(ApiResponse::ok(tags))
}

async fn create_tag(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTagInput>,
) -> AppResult<ApiResponse<tag::Model>> {
    let tag = state
        .category_service
        .create_tag(Some(&user.actor()), input)
        .await?;
    Ok(ApiResponse::created(tag))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
}

pub fn tags_router() -> Router<AppState> {
    Router::new().route("/", get(list_tags).post(create_tag))
}
