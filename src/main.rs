use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use spy_levels::config::{now_eastern, parse_eastern_time, AppConfig};
use spy_levels::polygon::DEFAULT_BASE_URL;
use spy_levels::report::{ConsoleReporter, LevelReport, Reporter};
use spy_levels::store::{StateStore, DEFAULT_DATA_FILE};
use spy_levels::trading_core::{LevelUpdater, UpdateOutcome};

#[derive(Parser, Debug)]
#[command(name = "spy-levels")]
#[command(about = "SPY 4H ATR(14) fibonacci level calculator")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Polygon.io API key
    #[arg(long, global = true, env = "POLYGON_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Polygon.io API base URL
    #[arg(long, global = true, env = "POLYGON_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// JSON file holding candle history and the latest levels
    #[arg(long, global = true, env = "SPY_LEVELS_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch bars, recompute ATR and levels, and save them (default)
    Update {
        /// Treat the run as happening at this ET time ("YYYY-MM-DD HH:MM")
        #[arg(long)]
        at: Option<String>,
    },

    /// Print the levels from the last saved update
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spy_levels=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig {
        api_key: args.api_key,
        base_url: args.base_url,
        data_file: args.data_file,
    };

    match args.command.unwrap_or(Commands::Update { at: None }) {
        Commands::Update { at } => run_update(&config, at.as_deref()).await,
        Commands::Show => show_levels(&config),
    }
}

async fn run_update(config: &AppConfig, at: Option<&str>) -> Result<()> {
    // Configuration errors abort before anything is fetched
    let client = config.polygon_client()?;
    let now = match at {
        Some(at) => parse_eastern_time(at)?,
        None => now_eastern(),
    };

    let updater = LevelUpdater::new(client, config.state_store(), ConsoleReporter);
    match updater.run(now).await? {
        UpdateOutcome::Updated(report) => {
            info!("Levels saved to {:?}", config.data_file);
            info!("{} levels, reference close {:.2}", report.levels.len(), report.reference_close);
        }
        UpdateOutcome::Skipped(reason) => {
            info!("No update performed: {}", reason);
        }
    }

    Ok(())
}

fn show_levels(config: &AppConfig) -> Result<()> {
    let state = config.state_store().load()?;
    match LevelReport::from_state(&state) {
        Some(report) => ConsoleReporter.emit(&report),
        None => println!("No levels stored in {:?}", config.data_file),
    }
    Ok(())
}
