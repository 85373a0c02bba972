//! riviu server entry point.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use riviu_api::{AppState, auth_middleware, health, router as api_router};
use riviu_common::{Config, LocalStorage, StorageBackend, StorageConfig};
use riviu_core::{
    AggregationService, CategoryService, CommentService, DishService, FeedService, LikeService,
    MediaService, ProfileService, RatingService, RestaurantService, ReviewService, UserService,
};
use riviu_db::repositories::{
    CategoryRepository, CommentRepository, DishRepository, LikeRepository, ProfileRepository,
    RatingRepository, RestaurantRepository, ReviewRepository, TagRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Room for multipart framing on top of the largest accepted image.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riviu=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting riviu server...");

    let config = Config::load()?;

    let db = riviu_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    riviu_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let restaurant_repo = RestaurantRepository::new(Arc::clone(&db));
    let dish_repo = DishRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));
    let rating_repo = RatingRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));

    // Uploaded images
    let storage_config = StorageConfig::from(&config.storage);
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::from_config(&storage_config));
    info!(
        path = %storage_config.base_path.display(),
        url = %storage_config.base_url,
        "Using local image storage"
    );

    // Services
    let aggregation = AggregationService::new(rating_repo.clone(), like_repo.clone());
    let state = AppState {
        user_service: UserService::new(user_repo),
        profile_service: ProfileService::new(profile_repo.clone()),
        restaurant_service: RestaurantService::new(
            restaurant_repo.clone(),
            category_repo.clone(),
            tag_repo.clone(),
            review_repo.clone(),
        ),
        dish_service: DishService::new(
            dish_repo.clone(),
            restaurant_repo.clone(),
            category_repo.clone(),
        ),
        review_service: ReviewService::new(
            review_repo.clone(),
            restaurant_repo.clone(),
            dish_repo,
        ),
        feed_service: FeedService::new(
            review_repo.clone(),
            restaurant_repo.clone(),
            category_repo.clone(),
            tag_repo.clone(),
            aggregation.clone(),
        ),
        like_service: LikeService::new(like_repo, restaurant_repo.clone(), review_repo),
        rating_service: RatingService::new(rating_repo, restaurant_repo.clone(), aggregation),
        comment_service: CommentService::new(comment_repo, restaurant_repo, profile_repo),
        category_service: CategoryService::new(category_repo, tag_repo),
        media_service: MediaService::new(storage, storage_config.max_bytes),
    };

    let body_limit = storage_config.max_bytes + MULTIPART_OVERHEAD_BYTES;

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router());

    // Serve uploads ourselves unless they live behind an absolute URL
    if storage_config.base_url.starts_with('/') && storage_config.base_url.len() > 1 {
        app = app.nest_service(
            &storage_config.base_url,
            ServeDir::new(&storage_config.base_path),
        );
    }

    let app = app
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(usize::try_from(body_limit)?))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
