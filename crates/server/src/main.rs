//! Foodbook-rs server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, middleware};
use foodbook_api::{middleware::AppState, router as api_router};
use foodbook_common::{Config, LocalStorage, StorageBackend};
use foodbook_core::{
    FavoriteService, IngredientService, RecipeService, ShoppingCartService, SubscriptionService,
    TagService, UserService,
};
use foodbook_db::repositories::{
    FavoriteRepository, IngredientRepository, RecipeRepository, ShoppingCartRepository,
    SubscriptionRepository, TagRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodbook=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting foodbook-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = foodbook_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    foodbook_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let ingredient_repo = IngredientRepository::new(Arc::clone(&db));
    let recipe_repo = RecipeRepository::new(Arc::clone(&db));
    let favorite_repo = FavoriteRepository::new(Arc::clone(&db));
    let shopping_cart_repo = ShoppingCartRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));

    // Initialize image storage
    let media_path = PathBuf::from(&config.media.path);
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        media_path.clone(),
        config.media.base_url.clone(),
    ));

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let tag_service = TagService::new(tag_repo.clone());
    let ingredient_service = IngredientService::new(ingredient_repo.clone());
    let recipe_service = RecipeService::new(
        recipe_repo.clone(),
        ingredient_repo,
        tag_repo,
        user_repo.clone(),
        storage,
    );
    let favorite_service = FavoriteService::new(favorite_repo, recipe_repo.clone());
    let shopping_cart_service = ShoppingCartService::new(shopping_cart_repo, recipe_repo.clone());
    let subscription_service = SubscriptionService::new(subscription_repo, user_repo, recipe_repo);

    // Create app state
    let state = AppState {
        user_service,
        tag_service,
        ingredient_service,
        recipe_service,
        favorite_service,
        shopping_cart_service,
        subscription_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .nest_service(
            config.media.base_url.trim_end_matches('/'),
            ServeDir::new(media_path),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            foodbook_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
