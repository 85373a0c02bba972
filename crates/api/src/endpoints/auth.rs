//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use riviu_common::AppResult;
use riviu_core::{AuthSession, ChangePasswordInput, SignInInput, SignUpInput};
use riviu_db::entities::user;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Create a new account and sign in.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignUpInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.user_service.sign_up(input).await?;
    Ok(ApiResponse::created(session))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.user_service.sign_in(input).await?;
    Ok(ApiResponse::ok(session))
}

/// Sign out. The token in use stops working.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.user_service.sign_out(&user.id).await?;
    Ok(response::ok())
}

async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<impl IntoResponse> {
    state.user_service.change_password(&user.id, input).await?;
    Ok(response::ok())
}

/// The signed-in account.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<user::Model> {
    ApiResponse::ok(user)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}
