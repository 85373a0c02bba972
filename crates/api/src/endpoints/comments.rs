//! Comment endpoints: deletion, reactions and replies. Listing and posting live
//! under the restaurant.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post},
};
use riviu_common::AppResult;
use riviu_core::{CommentInput, ReactionGroup, ReactionInput, ReplyView};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Delete a comment and its replies and reactions. Author only.
async fn remove(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.comment_service.delete(Some(&user.actor()), &id).await?;
    Ok(response::ok())
}

/// Toggle an emoji reaction; returns the comment's reactions afterwards.
async fn react(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReactionInput>,
) -> AppResult<ApiResponse<Vec<ReactionGroup>>> {
    let reactions = state
        .comment_service
        .toggle_reaction(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::ok(reactions))
}

async fn reply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<ReplyView>> {
    let reply = state
        .comment_service
        .reply(Some(&user.actor()), &id, input)
        .await?;
    Ok(ApiResponse::created(reply))
}

async fn remove_reply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .comment_service
        .delete_reply(Some(&user.actor()), &id)
        .await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(remove))
        .route("/{id}/reactions", post(react))
        .route("/{id}/replies", post(reply))
        .route("/replies/{id}", delete(remove_reply))
}
