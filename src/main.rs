use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use saas_api::config::{self, Environment};
use saas_api::routes::build_router;
use saas_api::state::AppState;
use saas_api::store::memory::MemoryUserStore;
use saas_api::store::postgres::PgUserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("saas_api=info,tower_http=info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting SaaS API in {:?} mode", config.environment);

    if config.security.jwt_secret == "your-secret-key-here"
        && config.environment != Environment::Development
    {
        tracing::warn!("SECRET_KEY is not set; tokens are signed with the default secret");
    }

    let app = match &config.database.url {
        Some(url) => {
            let store = PgUserStore::connect(url, &config.database)
                .await
                .context("failed to connect database")?;
            build_router(AppState::new(config, Arc::new(store)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the seeded in-memory store");
            build_router(AppState::new(config, Arc::new(MemoryUserStore::seeded())))
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 SaaS API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
