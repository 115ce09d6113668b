//! netsleuthctl - connectivity diagnostics for ISE/DNAC environments.
//!
//! One invocation per identity: correlate the user's authentication
//! sessions with wireless client health and print a diagnostic report.

use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use netsleuth_common::config::FAILURE_DB_FILE;
use netsleuth_common::{
    report, Correlator, DnacClient, EngineConfig, EngineError, EnvConfig, FailureStore, IseClient,
};
use netsleuthctl::errors::{EXIT_DISCOVERY_FAILED, EXIT_GENERAL_ERROR, EXIT_SETUP_FAILED};

#[derive(Parser)]
#[command(name = "netsleuthctl")]
#[command(about = "Correlate a user's network sessions and client health", long_about = None)]
#[command(version)]
struct Cli {
    /// Identity (account name) to diagnose
    identity: Option<String>,

    /// Emit the machine-readable JSON payload instead of the console report
    #[arg(long)]
    json: bool,

    /// Directory holding env_config.txt, mykey.key, and failure_db
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Maximum concurrent upstream requests per wave
    #[arg(long)]
    max_in_flight: Option<usize>,
}

fn print_usage() {
    let banner = "HOW TO USE NETSLEUTHCTL";
    println!("{banner}");
    println!("{}", "=".repeat(banner.len()));
    println!("Pass the identity to diagnose as the only argument.");
    println!("e.g. netsleuthctl jdoe");
}

/// Everything that can fail here is a fatal-setup condition: it happens
/// before the first network call.
fn build_correlator(cli: &Cli) -> Result<Correlator<IseClient, DnacClient>> {
    let env = EnvConfig::load(&cli.config_dir).context("loading environment configuration")?;

    let mut config = EngineConfig::default();
    if let Some(limit) = cli.max_in_flight {
        config.max_in_flight = limit;
    }

    let store = FailureStore::open(&cli.config_dir.join(FAILURE_DB_FILE))
        .context("opening failure lookup store")?;

    let ise = IseClient::new(&env, &config).context("building session source client")?;
    let dnac = DnacClient::new(&env, &config).context("building health source client")?;

    Ok(Correlator::new(
        Arc::new(ise),
        Arc::new(dnac),
        Arc::new(store),
        config,
    ))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // No identity is a usage request, not an error.
    let Some(identity) = cli.identity.clone().filter(|i| !i.trim().is_empty()) else {
        print_usage();
        return;
    };

    let correlator = match build_correlator(&cli) {
        Ok(correlator) => correlator,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            eprintln!("Run the environment builder to (re)create the configuration.");
            exit(EXIT_SETUP_FAILED);
        }
    };

    match correlator.run_diagnostic(&identity).await {
        Ok(diagnostic) => {
            if cli.json {
                match serde_json::to_string_pretty(&diagnostic) {
                    Ok(payload) => println!("{payload}"),
                    Err(e) => {
                        eprintln!("ERROR: could not serialize report: {e}");
                        exit(EXIT_GENERAL_ERROR);
                    }
                }
            } else {
                print!("{}", report::render_text(&diagnostic));
            }
        }
        Err(e @ EngineError::Discovery(_)) => {
            eprintln!("ERROR: {e}");
            exit(EXIT_DISCOVERY_FAILED);
        }
    }
}
