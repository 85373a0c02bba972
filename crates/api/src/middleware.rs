//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use riviu_core::{
    CategoryService, CommentService, DishService, FeedService, LikeService, MediaService,
    ProfileService, RatingService, RestaurantService, ReviewService, UserService,
};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub profile_service: ProfileService,
    pub restaurant_service: RestaurantService,
    pub dish_service: DishService,
    pub review_service: ReviewService,
    pub feed_service: FeedService,
    pub like_service: LikeService,
    pub rating_service: RatingService,
    pub comment_service: CommentService,
    pub category_service: CategoryService,
    pub media_service: MediaService,
}

/// Authentication middleware.
///
/// A valid `Authorization: Bearer <token>` header puts the user into the request
/// extensions. Anything else leaves the request anonymous; handlers that need a
/// user reject it through the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
