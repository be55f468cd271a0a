use std::net::SocketAddr;
use std::sync::Arc;

use food_search_api::api::{self, AppState};
use food_search_api::config::AppConfig;
use food_search_api::middleware::rate_limit::{self, RateLimiter};
use food_search_api::upstream::FoodDataClient;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("🚀 Starting Food Search API Server");

    // Load configuration
    let config = AppConfig::load();
    info!("📋 Configuration loaded");
    info!("   - Environment: {}", config.environment);
    info!("   - Upstream: {}", config.fdc_base_url);
    info!("   - API key configured: {}", config.fdc_api_key.is_some());

    // Initialize upstream client
    let upstream = match &config.fdc_api_key {
        Some(key) => Some(FoodDataClient::new(
            key.clone(),
            config.fdc_base_url.clone(),
        )?),
        None => {
            warn!("⚠️  FDC_API_KEY is not set; /foods will return configuration errors");
            None
        }
    };

    // Initialize rate limiting
    let rate_limiter = Arc::new(RateLimiter::new(
        rate_limit::WINDOW,
        rate_limit::MAX_REQUESTS,
    ));
    info!(
        "🚦 Rate limit: {} requests per {} minutes per client",
        rate_limit::MAX_REQUESTS,
        rate_limit::WINDOW.as_secs() / 60
    );

    // Create application state
    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        upstream,
        rate_limiter,
    };

    // Build router with modular routes
    let app = api::router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET  /          - API description");
    info!("   GET  /health    - Health check (?probe=true checks upstream)");
    info!("   GET  /foods     - Search foods (?type=<name>&limit=<1-50>)");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
