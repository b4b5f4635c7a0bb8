//! Taskhive API server binary.
//!
//! Serves the HTTP API over PostgreSQL when a database URL is configured,
//! otherwise over a process-local in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use taskhive_api::AppState;
use taskhive_api::config::ApiConfig;
use taskhive_core::auth::jwt::MAX_TOKEN_TTL_SECS;
use taskhive_core::store::{MemoryStore, PgStore};
use tracing::{info, warn};

/// CLI arguments for the API server. Anything given here overrides the
/// environment read by [`ApiConfig::from_env`].
#[derive(Parser, Debug)]
#[command(name = "taskhive_server", about = "Taskhive API server")]
struct Args {
    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Interface to bind.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// PostgreSQL connection URL. Without one, data lives in memory only.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Lifetime of issued tokens in seconds.
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECS))]
    token_ttl_secs: Option<i64>,

    /// Create this tenant-less super admin at startup if it does not exist.
    #[arg(long, env = "SUPER_ADMIN_EMAIL", requires = "super_admin_password")]
    super_admin_email: Option<String>,

    #[arg(long, env = "SUPER_ADMIN_PASSWORD", hide_env_values = true)]
    super_admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,taskhive_api=debug,taskhive_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.override_bind(args.host.as_deref(), args.port);
    if let Some(url) = args.database_url.filter(|url| !url.trim().is_empty()) {
        config.database_url = Some(url);
    }
    if let Some(ttl) = args.token_ttl_secs {
        config.token_ttl_secs = ttl;
    }
    info!(bind_addr = %config.bind_addr, "starting taskhive_server");

    let state = match &config.database_url {
        Some(url) => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(url)
                .await?;

            let store = PgStore::new(pool);
            info!("running database migrations");
            store.migrate().await?;
            AppState::new(Arc::new(store), config.clone())
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            AppState::new(Arc::new(MemoryStore::new()), config.clone())
        }
    };

    if let (Some(email), Some(password)) = (&args.super_admin_email, &args.super_admin_password) {
        let admin = state
            .services
            .auth
            .ensure_super_admin(email, password, "Super Admin")
            .await?;
        info!(user_id = %admin.id, "super admin ready");
    }

    let app = taskhive_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
