use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicator_registry::{
    actors::sweeper::SweeperHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    clock::{Clock, SystemClock},
    config::{RegistryConfig, read_config_file},
    metrics::RegistryMetrics,
    patch::load_patches,
    registry::{DocumentStore, StatusStore},
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON). Defaults are used when omitted.
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("indicator_registry", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config: RegistryConfig = match &args.file {
        Some(file) => read_config_file(file)?,
        None => RegistryConfig::default(),
    };
    config.validate()?;

    let patches = match &config.patches_glob {
        Some(pattern) => load_patches(pattern).context("failed to load patches")?,
        None => Vec::new(),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics = RegistryMetrics::new().context("failed to set up metrics")?;
    let documents = Arc::new(DocumentStore::new(config.document_ttl()?));
    let statuses = Arc::new(StatusStore::new());

    let sweeper = SweeperHandle::spawn(
        Arc::clone(&documents),
        Arc::clone(&clock),
        Some(metrics.clone()),
        config.sweep_interval(),
    );

    let state = ApiState::new(documents, statuses, patches, clock, metrics);
    let addr = spawn_api_server(ApiConfig::from(&config), state).await?;

    info!(
        %addr,
        ttl_secs = config.document_ttl_secs,
        sweep_interval_secs = config.sweep_interval_secs,
        "indicator registry running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutting down");
    sweeper.shutdown().await?;

    Ok(())
}
