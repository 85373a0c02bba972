//! API endpoints.

mod auth;
mod categories;
mod comments;
mod dishes;
mod health;
mod media;
mod profiles;
mod restaurants;
mod reviews;

use axum::Router;

use crate::middleware::AppState;

pub use health::health;

/// Create the API router, mounted under `/api` by the server.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/restaurants", restaurants::router())
        .nest("/dishes", dishes::router())
        .nest("/reviews", reviews::router())
        .nest("/comments", comments::router())
        .nest("/profiles", profiles::router())
        .nest("/categories", categories::router())
        .nest("/tags", categories::tags_router())
        .nest("/media", media::router())
}
