use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use threat_aggregator::{server, AppConfig, ThreatAggregator};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "threat-aggregator", version, about = "Security news feed classifier and dashboard API")]
struct Cli {
    /// SQLite URL, overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Seed for the classifier's random base score
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API (default)
    Serve,
    /// Run a single scan and print the report
    Scan,
    /// Print the current aggregate statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "threat_aggregator=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.seed.is_some() {
        config.classifier_seed = cli.seed;
    }

    info!("Starting threat aggregator (database: {})", config.database_url);

    let aggregator = Arc::new(
        ThreatAggregator::from_config(&config)
            .await
            .with_context(|| format!("failed to open store at {}", config.database_url))?,
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(&config, aggregator).await?,
        Command::Scan => {
            let report = aggregator.scan().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Stats => {
            let stats = aggregator.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
