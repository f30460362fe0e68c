//! CRM Server - REST backend for the customer-relationship manager

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use crm_api::{AppState, create_router};
use crm_auth::{JwtManager, hash_password};
use crm_db::{Database, NewUser, UserRole};

/// CRM Server - customer-relationship management REST API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "CRM_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "CRM_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting CRM Server v{}", env!("CARGO_PKG_VERSION"));

    if config.uses_default_secret() {
        warn!("Using the built-in JWT secret; set auth.jwt_secret before deploying");
    }

    // Create data directory for file-backed databases
    if let Some(dir) = sqlite_parent_dir(&config.database.url) {
        tokio::fs::create_dir_all(dir).await?;
    }

    // Initialize database
    let db = Database::new(&config.database.url, config.database.max_connections).await?;

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = hash_password(&config.auth.admin_password)?;
        db.insert_user(NewUser {
            name: config.auth.admin_name.clone(),
            email: config.auth.admin_email.trim().to_lowercase(),
            password_hash,
            company: None,
            role: UserRole::Admin,
        })
        .await?;
        info!("Default admin user created (email: {})", config.auth.admin_email);
    }

    // Install the Prometheus recorder
    let metrics_handle = if config.metrics.enabled {
        Some(Arc::new(PrometheusBuilder::new().install_recorder()?))
    } else {
        None
    };

    // Initialize JWT manager
    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_hours,
    ));

    // Create application state
    let state = AppState::new(db, jwt, config.auth.protect_resources);
    if !config.auth.protect_resources {
        warn!("Resource endpoints are open: auth.protect_resources is false");
    }

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Directory holding a `sqlite:` database file, if any
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
