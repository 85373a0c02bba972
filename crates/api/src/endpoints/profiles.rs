//! Profile endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use riviu_common::AppResult;
use riviu_core::{Actor, UpdateProfileInput};
use riviu_db::entities::profile;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// The signed-in user's profile, created on first access.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<profile::Model>> {
    let profile = state.profile_service.get_or_create(&user).await?;
    Ok(ApiResponse::ok(profile))
}

async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<profile::Model>> {
    // The row may not exist yet for accounts that never opened their profile
    state.profile_service.get_or_create(&user).await?;
    let profile = state
        .profile_service
        .update(Some(&Actor::from(&user)), &user.id, input)
        .await?;
    Ok(ApiResponse::ok(profile))
}

async fn by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<profile::Model>> {
    let profile = state.profile_service.get_by_username(&username).await?;
    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .route("/{username}", get(by_username))
}
