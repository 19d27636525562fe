mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(dealflow_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = dealflow_db::PoolConfig::from_app_config(&config);
    let pool = dealflow_db::connect_pool(&config.database_url, pool_config).await?;
    dealflow_db::run_migrations(&pool).await?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;
    let catalog = Arc::new(dealflow_catalog::CatalogClient::new(
        config.catalog_api_key.clone(),
        config.fetch_timeout_secs,
        &config.user_agent,
        Duration::from_millis(config.catalog_min_request_gap_ms),
    )?);
    let tagger = dealflow_ingest::AffiliateTagger::new(config.affiliate_tag.clone());
    let bus = dealflow_ingest::EventBus::new();

    let state = AppState {
        pool: pool.clone(),
        http: http.clone(),
        catalog,
        tagger,
        bus,
        crawl_concurrency: config.crawl_concurrency,
    };

    let _scheduler = scheduler::build_scheduler(pool, http, Arc::clone(&config)).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        dealflow_core::Environment::Development
    ))?;
    let app = build_app(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "dealflow server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
