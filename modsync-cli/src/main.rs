//! modsync - add MetaModule modules missing from a VCV Rack Library account
//!
//! Scrapes the MetaModule plugin listing, logs in to the VCV Rack Library,
//! and adds every listed module the account does not hold yet.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use modsync_core::config::{Credentials, SyncConfig};
use modsync_core::pipeline;

mod report;

/// Exit status when `--strict` is set and some adds failed
const EXIT_ADD_FAILURES: i32 = 2;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "modsync",
    about = "Add MetaModule modules missing from a VCV Rack Library account",
    version
)]
struct Cli {
    /// VCV Rack Library email
    #[clap(env = "MODSYNC_EMAIL")]
    email: String,

    /// VCV Rack Library password
    #[clap(env = "MODSYNC_PASSWORD", hide_env_values = true)]
    password: String,

    /// Configuration file (defaults to modsync.yaml in the platform config directory)
    #[clap(long)]
    config: Option<PathBuf>,

    /// MetaModule plugin listing URL
    #[clap(long)]
    plugins_url: Option<String>,

    /// MetaModule module listing URL
    #[clap(long)]
    module_listing_url: Option<String>,

    /// VCV Rack Library token URL
    #[clap(long)]
    token_url: Option<String>,

    /// VCV Rack Library modules URL
    #[clap(long)]
    library_modules_url: Option<String>,

    /// Per-request timeout in seconds
    #[clap(long)]
    timeout: Option<u64>,

    /// Only sync these plugins (repeatable)
    #[clap(long = "plugin", value_name = "SLUG")]
    plugins: Vec<String>,

    /// Show what would be added without adding anything
    #[clap(long)]
    dry_run: bool,

    /// Exit with status 2 if any module could not be added
    #[clap(long)]
    strict: bool,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,

    /// Verbose output (same as --log-level debug)
    #[clap(short, long)]
    verbose: bool,

    /// Set log level
    #[clap(long, default_value = "info")]
    log_level: LogLevel,
}

impl Cli {
    /// Layer CLI flags over the loaded configuration
    fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(url) = &self.plugins_url {
            config.source.plugins_url = url.clone();
        }
        if let Some(url) = &self.module_listing_url {
            config.source.modules_url = url.clone();
        }
        if let Some(url) = &self.token_url {
            config.library.token_url = url.clone();
        }
        if let Some(url) = &self.library_modules_url {
            config.library.modules_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if !self.plugins.is_empty() {
            config.plugins = self.plugins.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(&self.email, &self.password)
    }

    fn filter_directive(&self) -> &'static str {
        if self.verbose {
            LogLevel::Debug.to_filter_directive()
        } else {
            self.log_level.to_filter_directive()
        }
    }
}

/// Initialize tracing
///
/// `RUST_LOG` wins when set; otherwise the level comes from the flags.
fn initialize_tracing(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries the report
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.filter_directive());

    let mut config =
        SyncConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    debug!("Resolved configuration: {:?}", config);

    let report = match pipeline::run(&config, &cli.credentials()).await {
        Ok(report) => report,
        Err(e) => {
            error!("Fatal: {}", e);
            eprintln!("\nError: {e}");
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render(&report));
    }

    if cli.strict && report.has_failures() {
        std::process::exit(EXIT_ADD_FAILURES);
    }

    Ok(())
}
