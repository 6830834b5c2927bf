use anyhow::Context;
use roof_estimator::VisionEstimator;
use roof_server::{create_app, AppState, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Roof Planner Backend Server");

    let config = ServerConfig::from_env()?;
    let estimator = VisionEstimator::from_env().context("estimation service is not configured")?;
    info!("Using estimation model {}", estimator.model());

    let app = create_app(AppState::new(estimator), &config);

    info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
