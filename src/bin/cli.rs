//! Confluence sync CLI
//!
//! Local execution entry point: runs the connector against a local
//! state directory standing in for the host crawl database.

use std::path::PathBuf;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use confluence_sync::{
    connector::{AuthorityConnector, Interrupt, ProcessActivities, RepositoryConnector},
    error::{AppError, Result},
    models::Config,
    pipeline::{ConnectorError, IngestableRecord},
    storage::{LocalStateStore, StateStore, SyncState},
};

/// Confluence crawl/sync connector
#[derive(Parser, Debug)]
#[command(
    name = "confluence-sync",
    version,
    about = "Crawls Confluence spaces and synchronizes pages into a search index"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check connectivity to the configured server
    Check,

    /// Run one crawl cycle: seed, then process every document
    Crawl {
        /// Space key to crawl (overrides the configured job space)
        #[arg(long)]
        space: Option<String>,

        /// Directory holding sync state and ingested records
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,
    },

    /// Resolve the spaces a user may view
    Authorize {
        /// Username to resolve authorities for
        username: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Processing activities backed by the local state store.
struct StoreActivities<'a> {
    store: &'a LocalStateStore,
    state: &'a mut SyncState,
    ingested: usize,
    retained: usize,
    deleted: usize,
}

#[async_trait]
impl ProcessActivities for StoreActivities<'_> {
    async fn ingest(&mut self, id: &str, marker: &str, record: IngestableRecord) -> Result<()> {
        self.store.write_record(&record).await?;
        self.state.set_marker(id, marker);
        self.ingested += 1;
        Ok(())
    }

    async fn retain(&mut self, _id: &str) -> Result<()> {
        self.retained += 1;
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<()> {
        self.store.remove_record(id).await?;
        self.state.remove(id);
        self.deleted += 1;
        Ok(())
    }
}

fn to_app_error(err: ConnectorError) -> AppError {
    match err {
        ConnectorError::Fatal(err) => err,
        ConnectorError::Interrupted(message) => AppError::interrupted(message),
        ConnectorError::Retry(interruption) => AppError::remote("crawl", interruption),
    }
}

async fn run_crawl(config: &Config, space: Option<String>, state_dir: PathBuf) -> Result<()> {
    let store = LocalStateStore::new(&state_dir);
    let mut state = store.load_state().await?;
    let mut connector = RepositoryConnector::new(config);
    let interrupt = Interrupt::new();

    let space = space.as_deref().or(config.job.space_filter());
    match space {
        Some(space) => log::info!("Crawling space {space}"),
        None => log::info!("Crawling all spaces"),
    }

    let mut seeds: Vec<String> = Vec::new();
    connector
        .add_seeds(space, None, &mut seeds)
        .await
        .map_err(to_app_error)?;
    log::info!("Seeded {} documents", seeds.len());

    let snapshot = state.clone();
    let mut activities = StoreActivities {
        store: &store,
        state: &mut state,
        ingested: 0,
        retained: 0,
        deleted: 0,
    };
    connector
        .process_documents(&seeds, &snapshot, &mut activities, &interrupt)
        .await
        .map_err(to_app_error)?;

    log::info!(
        "Crawl complete: {} ingested, {} retained, {} deleted",
        activities.ingested,
        activities.retained,
        activities.deleted
    );

    store.save_state(&state).await?;
    log::info!("State saved to {}", state_dir.display());

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;
    config.validate()?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Check => {
            let mut connector = RepositoryConnector::new(&config);
            println!("{}", connector.check().await);
        }

        Command::Crawl { space, state_dir } => {
            run_crawl(&config, space, state_dir).await?;
        }

        Command::Authorize { username } => {
            let mut connector = AuthorityConnector::new(&config);
            let record = connector.authorize(&username).await;

            if record.spaces.is_empty() {
                println!("{}: no viewable spaces", record.username);
            } else {
                println!("{}:", record.username);
                for space in &record.spaces {
                    println!("  {space}");
                }
            }
        }
    }

    Ok(())
}
