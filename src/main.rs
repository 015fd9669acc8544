//! Sharkfacts: random shark facts for chat webhooks.
//!
//! This is the application entry point. It resolves configuration from a
//! config file or the environment, initializes logging from it, loads the
//! fact file, and only then starts the async runtime to serve the webhook
//! route until shut down.

use std::path::PathBuf;

use clap::Parser;

use sharkfacts::config::{self, ConfigMode};
use sharkfacts::{create_router, logging, AppError, AppState, FactStore};

/// Sharkfacts: random shark facts for chat webhooks
#[derive(Parser, Debug)]
#[command(name = "sharkfacts", version, about)]
struct Args {
    /// Where configuration comes from
    #[arg(short, long, value_enum, default_value_t = ConfigMode::File)]
    source: ConfigMode,

    /// Config file path (file source only; skips the default search)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter override (e.g., "sharkfacts=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // Single-threaded until `serve`: the env source writes resolved values
    // back into the process environment.
    let config = config::resolve(args.source, args.config)?;

    logging::init(&config.logging, args.log_level)?;
    tracing::info!(
        source = ?args.source,
        fact_file = %config.fact_file.display(),
        bind_ip = %config.bind_ip,
        bind_port = config.bind_port,
        sinks = config.logging.sinks.len(),
        "Loaded configuration"
    );

    let facts = FactStore::load(&config.fact_file)?;
    let addr = config.bind_addr()?;

    let state = AppState::new(config, facts);
    let app = create_router(state);

    sharkfacts::http::serve(app, addr)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
