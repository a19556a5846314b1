use std::sync::Arc;
use tracing::info;

use fbsearch::{http, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    info!("Starting fbsearch server");
    info!(
        "API domain: {}, web domain: {}, authenticated: {}",
        config.api_domain,
        config.web_domain,
        config.sessionid.is_some()
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("fbsearch listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
