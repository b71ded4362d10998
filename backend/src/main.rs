//! Auth Service
//!
//! Checks usernames and passwords against stored credentials and issues
//! signed, expiring tokens; validates those tokens without a store lookup.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Services: Login / verify / logout sequencing
//! - Auth: Password hashing and token issuance/verification
//! - Repositories: Credential store (PostgreSQL or in-memory)

use anyhow::Result;
use auth_service_backend::{
    config::{self, StoreBackend},
    db,
    repositories::{CredentialStore, InMemoryCredentialStore, PgCredentialStore},
    routes,
    services::AuthService,
    state::AppState,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired entries are swept from the revocation list
const REVOCATION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Auth Service"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    } else if config.token.secret.expose_secret() == config::DEVELOPMENT_SECRET {
        warn!("Using the built-in development signing secret; set JWT_SECRET outside local runs");
    }

    let store = connect_store(&config).await?;

    // Create application state (fails without a signing secret)
    let mut state = AppState::new(store, config)?;

    let bootstrap = &state.config().bootstrap;
    if bootstrap.enabled {
        AuthService::bootstrap_default_account(
            state.store(),
            state.passwords(),
            &bootstrap.username,
            bootstrap.password.expose_secret(),
        )
        .await?;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Failed to install metrics recorder: {}. /metrics disabled.", e),
    }

    spawn_revocation_sweeper(state.clone());

    // Start server
    let addr = format!("{}:{}", state.config().server.host, state.config().server.port);

    // Build application
    let app = routes::create_router(state);

    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Build the configured credential store
///
/// An unreachable database aborts startup.
async fn connect_store(config: &config::AppConfig) -> Result<Arc<dyn CredentialStore>> {
    match config.database.backend {
        StoreBackend::Postgres => {
            info!("Connecting to database...");
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgCredentialStore::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory credential store; accounts are lost on restart");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
    }
}

/// Periodically drop revocation entries whose tokens have expired
fn spawn_revocation_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REVOCATION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = state.tokens().revocations().purge_expired(Utc::now());
            if purged > 0 {
                debug!(purged, "Swept expired revocations");
            }
        }
    });
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "auth_service_backend=info,auth_service=info,tower_http=info".into()
        } else {
            "auth_service_backend=debug,auth_service=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let problems = config.production_problems();

    if config.database.backend == StoreBackend::Memory {
        warn!("In-memory credential store in production - ensure this is intentional");
    }

    if !problems.is_empty() {
        for problem in &problems {
            error!("Configuration error: {}", problem);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
