use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_llm::RagPipeline;
use docqa_server::cli::Cli;
use docqa_server::state::AppState;
use docqa_server::{build_router, startup};

const DEFAULT_LOG_FILTER: &str = "docqa=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docqa_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let config = Cli::parse().into_config();
    config.validate()?;
    config.log_summary();

    let pipeline = RagPipeline::from_config(&config)?;
    info!("LLM provider ready ({})", pipeline.provider_name());

    let state = Arc::new(AppState::new(&config, pipeline)?);

    if let Some(path) = &config.document.startup_pdf {
        startup::load_startup_pdf(&state, path).await?;
    } else {
        info!("No startup PDF configured; waiting for an upload");
    }

    let app = build_router(state, &config.server, config.document.upload_enabled);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
