use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use melodex::config::{AppConfig, CliConfig, FileConfig};
use melodex::fetch::{ArtistUpdater, SourceApiClient};
use melodex::ingest::{ArtistIngestor, BatchImporter};
use melodex::rank_cache::RankCacheUpdater;
use melodex::store::SqliteGateway;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(about = "Music catalog ingestion pipeline")]
struct CliArgs {
    /// Path to the SQLite database file.
    #[clap(long)]
    pub db_path: Option<PathBuf>,

    /// Optional TOML config file. Values in it override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Pause in milliseconds between items during batch work.
    #[clap(long, default_value_t = 500)]
    pub pacing_ms: u64,

    /// Number of entries kept per rank cache table.
    #[clap(long, default_value_t = 100)]
    pub rank_cache_limit: usize,

    /// Source API client id for the update command.
    #[clap(long)]
    pub client_id: Option<String>,

    /// Source API client secret for the update command.
    #[clap(long)]
    pub client_secret: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema (or validate an existing one).
    Init,
    /// Import artist payloads from a JSON file (an array of payload objects).
    Import {
        /// Path to the JSON file to import.
        file: PathBuf,
    },
    /// Fetch fresh payloads from the source API and ingest them.
    Update {
        /// Artist ids to update.
        #[clap(required = true)]
        ids: Vec<String>,
    },
    /// Rebuild the artist and track rank cache tables.
    RankCache,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db_path.clone(),
        pacing_ms: cli_args.pacing_ms,
        rank_cache_limit: cli_args.rank_cache_limit,
        client_id: cli_args.client_id.clone(),
        client_secret: cli_args.client_secret.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite database at {:?}...", config.db_path);
    let gateway = Arc::new(SqliteGateway::open(&config.db_path)?);
    let pacing = Duration::from_millis(config.pacing_ms);

    match cli_args.command {
        Command::Init => {
            // Opening already created or validated the schema.
            info!("Database at {:?} is ready", config.db_path);
        }
        Command::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read import file: {:?}", file))?;
            let items: Vec<Value> = serde_json::from_str(&content)
                .with_context(|| format!("Import file is not a JSON array: {:?}", file))?;
            info!("Importing {} payloads from {:?}", items.len(), file);

            let importer = BatchImporter::new(ArtistIngestor::new(gateway), pacing);
            let report = importer.import_values(&items);

            for item in &report.failed {
                warn!("Failed to import '{}' ({}): {}", item.name, item.id, item.error);
            }
            info!(
                "Import finished: {}/{} imported, {} failed, {} skipped",
                report.successful.len(),
                report.total(),
                report.failed.len(),
                report.skipped
            );
        }
        Command::Update { ids } => {
            if config.source_api.client_id.is_empty() || config.source_api.client_secret.is_empty()
            {
                bail!("source API credentials are required for update (client_id/client_secret)");
            }
            let source = SourceApiClient::new(config.source_api.clone())?;
            let updater =
                ArtistUpdater::new(Box::new(source), ArtistIngestor::new(gateway), pacing);

            let outcomes = updater.update_artists(&ids);
            let failed = outcomes.iter().filter(|o| !o.success).count();
            info!(
                "Update finished: {}/{} artists updated, {} failed",
                outcomes.len() - failed,
                outcomes.len(),
                failed
            );
        }
        Command::RankCache => {
            let updater = RankCacheUpdater::new(gateway, config.rank_cache_limit);
            let report = updater.run_all();
            for outcome in &report.outcomes {
                match &outcome.error {
                    None => info!("Rank cache for {}: {} entries", outcome.metric, outcome.entries),
                    Some(e) => warn!("Rank cache for {} failed: {}", outcome.metric, e),
                }
            }
        }
    }

    Ok(())
}
