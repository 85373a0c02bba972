//! HTTP API layer for riviu.
//!
//! This crate provides the JSON API consumed by the riviu clients:
//!
//! - **Endpoints**: auth, restaurants, dishes, reviews and the feed, comments,
//!   profiles, categories and tags, image upload
//! - **Extractors**: the signed-in user, required or optional
//! - **Middleware**: bearer token authentication and the shared [`AppState`]
//!
//! Built on Axum 0.8 with Tower middleware stack.
//!
//! [`AppState`]: middleware::AppState

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{health, router};
pub use middleware::{AppState, auth_middleware};
