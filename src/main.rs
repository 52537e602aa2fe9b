//! VPC CIDR Registry API - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vpc_cidr_registry::domain::gateways::AllocationRepository;
use vpc_cidr_registry::infrastructure::driven_adapters::config::{AppConfig, LogFormat, StoreBackend};
use vpc_cidr_registry::infrastructure::driven_adapters::database;
use vpc_cidr_registry::infrastructure::driven_adapters::{InMemoryAllocationRepository, PostgresAllocationRepository};
use vpc_cidr_registry::infrastructure::driving_adapters::api_rest::handlers::allocations;
use vpc_cidr_registry::infrastructure::driving_adapters::api_rest::middleware::{
    add_config_extension, request_id_middleware,
};
use vpc_cidr_registry::infrastructure::driving_adapters::api_rest::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(config.logging.format);
    tracing::info!(store = ?config.store.backend, "Configuration loaded successfully");

    let allocation_repository: Arc<dyn AllocationRepository> = match config.store.backend {
        StoreBackend::Postgres => {
            let pool = database::create_pool(&config.database)
                .await
                .context("Failed to connect to the database")?;
            tracing::info!("Database connection pool created");

            database::run_migrations(&pool).await?;
            Arc::new(PostgresAllocationRepository::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; allocations are lost on restart");
            Arc::new(InMemoryAllocationRepository::new())
        }
    };

    let config = Arc::new(config);
    let app_state = AppState::new(Arc::clone(&config), allocation_repository).context("Invalid address pool")?;

    let governor_config = GovernorConfigBuilder::default()
        .per_second(config.rate_limit.requests_per_second)
        .burst_size(config.rate_limit.burst_size)
        .finish()
        .context("Invalid rate limit configuration")?;

    let app = Router::new()
        .nest("/allocations", allocations::router())
        .layer(middleware::from_fn_with_state(app_state.clone(), add_config_extension))
        .layer(GovernorLayer {
            config: Arc::new(governor_config),
        })
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&config.server.allowed_origins))
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vpc_cidr_registry=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Any origin when none are configured, otherwise exactly the listed ones
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
