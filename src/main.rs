use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use advice_card::config::{AdviceConfig, ConfigError};
use advice_card::controller::{AdviceController, ClickOutcome};
use advice_card::fetch::{AdviceSource, FetchError, HttpAdviceClient};
use advice_card::store::{AdviceStore, FileStore, StoreError};
use advice_card::view::CardView;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("could not save advice: {0}")]
    Store(#[from] StoreError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "advice-card", about = "A little card of advice from the Advice Slip API")]
struct Cli {
    /// Advice endpoint; overrides `ADVICE_ENDPOINT`.
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory holding the cached advice; overrides `ADVICE_CACHE_DIR`.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Interactive card: enter for new advice, q to quit.
    #[default]
    Show,
    /// Fetch one advice, cache it, print it.
    Once,
    /// Print the cached advice without touching the network.
    Cached,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "advice-card failed");
            eprintln!("advice-card: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = match std::env::var("ADVICE_LOG") {
        Ok(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    // Logs go to stderr; stdout belongs to the card.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = AdviceConfig::from_env()?;
    if let Some(endpoint) = cli.endpoint.as_deref() {
        config = config.with_endpoint(endpoint)?;
    }
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    debug!(endpoint = %config.endpoint, cache_dir = %config.cache_dir.display(), "configuration loaded");

    let store = AdviceStore::new(Arc::new(FileStore::new(&config.cache_dir)), config.storage_key.clone());

    match cli.command.unwrap_or_default() {
        Command::Cached => render(&CardView::ready(&store.load()), false),
        Command::Once => {
            let client = HttpAdviceClient::new(config.endpoint.clone(), config.http)?;
            let record = client.fetch_advice().await?;
            store.save(&record)?;
            render(&CardView::ready(&record), false)
        }
        Command::Show => {
            let client = HttpAdviceClient::new(config.endpoint.clone(), config.http)?;
            let controller = AdviceController::new(Arc::new(client), store, config.timings);
            run_interactive(controller).await
        }
    }
}

/// Host the card until the user quits or stdin closes.
async fn run_interactive(controller: AdviceController) -> Result<(), CliError> {
    let clear = std::io::stdout().is_terminal();
    let mut changes = controller.subscribe();
    render(&controller.view(), clear)?;

    let mount = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.mount().await })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = CardView::from(&*changes.borrow_and_update());
                render(&view, clear)?;
            }
            line = lines.next_line() => {
                let Some(input) = line? else {
                    break;
                };
                match input.trim() {
                    "q" | "quit" => break,
                    "" | "n" | "new" => click(&controller),
                    other => debug!(input = other, "unrecognized input"),
                }
            }
        }
    }

    mount.abort();
    Ok(())
}

/// Fire a click without waiting for it; clicks during a cycle are dropped.
fn click(controller: &AdviceController) {
    let controller = controller.clone();
    tokio::spawn(async move {
        match controller.request_new().await {
            ClickOutcome::Ignored => debug!("click ignored, card busy"),
            ClickOutcome::Committed(record) => debug!(id = record.id, "click committed"),
            ClickOutcome::Failed => debug!("click failed, fallback shown"),
        }
    });
}

fn render(view: &CardView, clear: bool) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    if clear {
        write!(out, "\x1b[2J\x1b[H")?;
    }
    write!(out, "{view}")?;
    out.flush()?;
    Ok(())
}
