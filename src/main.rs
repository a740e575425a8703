use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cedh_recommender::{
    api::{create_router, AppState},
    config::Config,
    storage::{load_snapshot, JsonFileSource},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cedh_recommender=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        corpus = %config.corpus_path,
        metadata = %config.metadata_path,
        format = ?config.metadata_format,
        "Loading snapshot"
    );

    let source = JsonFileSource::from_config(&config);
    let snapshot = load_snapshot(&source)
        .await
        .context("Failed to load corpus snapshot")?;

    let state = AppState::new(snapshot).with_shortlist_size(config.shortlist_size);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
