use registration_backend::config::AppConfig;
use registration_backend::{create_router, initialize_backend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_warnings) = AppConfig::from_env();

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    for warning in &config_warnings {
        warn!("{}", warning);
    }

    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Registration server listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
