use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use carshare::config::AppConfig;
use carshare::db::Pool;
use carshare::router::build_router;
use carshare::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.identity_secret.is_empty() {
        tracing::warn!("IDENTITY_SECRET is empty, trusting X-User-Id without a signature");
    }

    let pool = Pool::open(
        &config.database_url,
        config.db_pool_size,
        Duration::from_millis(config.db_busy_timeout_ms),
    )?;

    let state = Arc::new(AppState {
        db: pool,
        config: config.clone(),
    });

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
