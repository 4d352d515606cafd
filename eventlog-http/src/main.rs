use anyhow::{Context, Result};
use clap::Parser;
use eventlog_http::config::Cli;
use eventlog_http::state::AppState;
use eventlog_store::{migrate, pool};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();
    let pool_config = args.pool_config();
    let db_pool = pool::connect(&args.database_url, &pool_config)
        .await
        .with_context(|| "connecting to the event store database")?;
    migrate(&db_pool)
        .await
        .with_context(|| "running event store migrations")?;

    let state = AppState::new(db_pool, pool_config.fulltext_enabled);
    let app = eventlog_http::router(state);

    let listener = tokio::net::TcpListener::bind(args.listen_endpoint_http)
        .await
        .with_context(|| format!("binding {}", args.listen_endpoint_http))?;
    tracing::info!(addr = %args.listen_endpoint_http, "eventlog-http-srv listening");
    axum::serve(listener, app)
        .await
        .with_context(|| "serving http")?;
    Ok(())
}
