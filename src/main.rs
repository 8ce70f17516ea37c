use std::net::SocketAddr;
use std::sync::Arc;

use chatline::auth::SessionKeys;
use chatline::config::AppConfig;
use chatline::db::{DbConfig, PgChatStore};
use chatline::llm::tools::{register_weather, weather::DEFAULT_FORECAST_URL};
use chatline::llm::{FunctionRegistry, GoogleProviderFactory};
use chatline::routes::configure_routes;
use chatline::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chatline=info,warp=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let db_config = DbConfig::from_connection_string(&config.database_url)?
        .with_max_pool_size(config.db_pool_size);
    let store = PgChatStore::connect(db_config).await?;
    tracing::info!("database ready");

    let providers = GoogleProviderFactory::new(config.gemini_api_base.clone())?;

    let mut tools = FunctionRegistry::new();
    if config.enable_tools {
        register_weather(&mut tools, reqwest::Client::new(), DEFAULT_FORECAST_URL);
        tracing::info!(count = tools.len(), "tools enabled");
    }

    let state = AppState::new(
        Arc::new(store),
        Arc::new(providers),
        SessionKeys::new(&config.auth_secret),
    )
    .with_tools(tools)
    .with_resumable_streams(config.resumable_streams)
    .with_smooth_delay(config.smooth_stream_delay);

    let routes = configure_routes(state);
    let addr = SocketAddr::new(config.host, config.port);

    tracing::info!(
        %addr,
        resumable_streams = config.resumable_streams,
        "starting server"
    );
    warp::serve(routes).run(addr).await;

    Ok(())
}
