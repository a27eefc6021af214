use clap::Parser;
use indicator_registry::{
    actors::agent::AgentHandle,
    config::{AgentConfig, read_config_file},
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON)
    #[arg(short)]
    file: String,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("indicator_registry", LevelFilter::DEBUG),
        ("registry_agent", LevelFilter::DEBUG),
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

    let config: AgentConfig = read_config_file(&args.file)?;
    config.validate()?;

    info!(
        registry = %config.registry_uri,
        documents = %config.documents_glob,
        interval_secs = config.interval_secs,
        "starting registry agent"
    );

    let agent = AgentHandle::spawn(&config)?;

    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    agent.shutdown().await?;

    Ok(())
}
