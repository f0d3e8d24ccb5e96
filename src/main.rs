//! ParkWise Backend Server
//!
//! Parking management backend: concurrency-safe space allocation, fee
//! computation and payment settlement, with simulated LPR, barrier and
//! payment-gateway collaborators.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use parkwise_server::barrier::BarrierService;
use parkwise_server::config::Config;
use parkwise_server::db;
use parkwise_server::events::EventRecorder;
use parkwise_server::lpr::LprService;
use parkwise_server::middleware;
use parkwise_server::models::EventSeverity;
use parkwise_server::parking::ParkingService;
use parkwise_server::payment::{PaymentService, RetryPolicy, SimulatedGateway};
use parkwise_server::routes;
use parkwise_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    // Initialize database connection pool and run migrations
    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    let events = EventRecorder::new(db_pool.clone());

    let parking_service = Arc::new(ParkingService::new(db_pool.clone(), events.clone()));

    let gateway = Arc::new(SimulatedGateway::new(
        config.gateway_failure_rate,
        config.gateway_processing_delay,
    ));
    let payment_service = Arc::new(PaymentService::new(
        db_pool.clone(),
        config.pricing.clone(),
        gateway,
        RetryPolicy::new(config.gateway_max_attempts, config.gateway_retry_delay),
        events.clone(),
    ));

    let lpr_service = Arc::new(LprService::new(
        config.lpr_processing_delay,
        config.lpr_failure_rate,
        events.clone(),
    ));
    let barrier_service = Arc::new(BarrierService::new(config.barrier_open_delay, events.clone()));

    let app_state = AppState::new(
        parking_service,
        payment_service,
        lpr_service,
        barrier_service,
    );

    events
        .record(
            "system_startup",
            EventSeverity::Low,
            "Server",
            "ParkWise server starting",
            serde_json::json!({ "environment": config.environment.as_str() }),
        )
        .await;

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::parking_routes())
        .merge(routes::payment_routes())
        .merge(routes::lpr_routes())
        .merge(routes::barrier_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "ParkWise API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let db_status = match db::check_health(&pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins_str = config.cors_allowed_origins.clone().unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
