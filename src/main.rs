use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod directory_store;
mod dispatch;
mod enrichment;
mod listing;
mod llm;
mod server;
mod slug;
mod sqlite_persistence;

use config::{AppConfig, CliConfig, FileConfig};
use directory_store::{DirectoryStore, SqliteDirectoryStore};
use dispatch::{DispatcherConfig, EventDispatcher, EventHandler};
use enrichment::{EnrichmentWorkflow, GitHubClient};
use listing::ListingCache;
use llm::OpenAiProvider;
use server::{run_server, RequestsLoggingLevel, ServerConfig};
use server::state::ServerState;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => path_buf,
        Err(e) => return Err(e).with_context(|| format!("Error resolving path: {}", s)),
    };
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database file.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to an optional TOML config file; its values override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3005)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Bearer token required by the admin routes. Admin routes reject
    /// everything when unset.
    #[clap(long)]
    pub admin_token: Option<String>,

    /// Listing cache time-to-live in seconds.
    #[clap(long, default_value_t = 86_400)]
    pub cache_ttl_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
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
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path).context("Failed to load config file")?)
        }
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        admin_token: cli_args.admin_token,
        cache_ttl_secs: cli_args.cache_ttl_sec,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening directory database at {:?}...",
        app_config.directory_db_path()
    );
    let store: Arc<dyn DirectoryStore> =
        Arc::new(SqliteDirectoryStore::new(app_config.directory_db_path())?);

    let cache = Arc::new(ListingCache::new(app_config.cache_ttl));

    let repo_host = Arc::new(GitHubClient::new(app_config.github_token.clone()));
    if app_config.github_token.is_none() {
        info!("No GitHub token configured, using unauthenticated API limits");
    }

    let llm = match &app_config.llm.api_key_command {
        Some(command) => Arc::new(OpenAiProvider::with_key_command(
            app_config.llm.base_url.clone(),
            app_config.llm.model.clone(),
            command.clone(),
        )),
        None => Arc::new(OpenAiProvider::new(
            app_config.llm.base_url.clone(),
            app_config.llm.model.clone(),
            app_config.llm.api_key.clone(),
        )),
    };
    info!(
        "LLM provider: {} at {}",
        app_config.llm.model, app_config.llm.base_url
    );

    let workflow: Arc<dyn EventHandler> = Arc::new(
        EnrichmentWorkflow::new(store.clone(), repo_host, llm).with_cache(cache.clone()),
    );

    let shutdown = CancellationToken::new();

    let dispatcher_config = DispatcherConfig {
        max_attempts: app_config.dispatcher.max_attempts,
        retry_delay: app_config.dispatcher.retry_delay,
    };
    let (dispatcher, dispatcher_handle) = EventDispatcher::new(
        dispatcher_config,
        store.clone(),
        vec![workflow],
        shutdown.clone(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let state = ServerState {
        config: ServerConfig {
            requests_logging_level: app_config.logging_level.clone(),
            admin_token: app_config.admin_token.clone(),
            submissions_per_hour: 10,
        },
        start_time: Instant::now(),
        store,
        cache,
        dispatcher: dispatcher_handle,
        hash: env!("GIT_HASH").to_string(),
    };

    if state.config.admin_token.is_none() {
        info!("No admin token configured, admin routes are disabled");
    }

    // Ctrl-C flips the token; server and dispatcher both drain on it.
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, shutting down");
            signal_shutdown.cancel();
        }
    });

    info!("Ready to serve at port {}!", app_config.port);
    let result = run_server(state, app_config.port, shutdown.clone()).await;

    shutdown.cancel();
    let _ = dispatcher_task.await;
    result
}
