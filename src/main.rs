use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kifu::changelog::{ChangelogService, GameStateRepository};
use kifu::history::HistoryService;
use kifu::judge::JudgeService;
use kifu::stream::Topics;
use kifu::sync::SyncService;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kifu=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting game state consistency core");

    let topics = Topics::new();
    let store = GameStateRepository::new();

    let mut tasks = Vec::new();

    let changelog = Arc::new(ChangelogService::new(store.clone(), topics.clone()));
    tasks.extend(changelog.start());

    let judge = Arc::new(JudgeService::new(store.clone(), topics.clone()));
    tasks.push(judge.start());

    let history = Arc::new(HistoryService::new(store.clone(), topics.clone()));
    tasks.push(history.start());

    let sync = Arc::new(SyncService::new(topics.clone()));
    tasks.extend(sync.start());

    info!(tasks = tasks.len(), "all services running");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "could not listen for shutdown signal"),
    }

    for task in tasks {
        task.abort();
    }
}
