//! Email Reputation Agent CLI.

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zentinel_agent_email_reputation::{BatchExecutor, Config, EmailValidator, ReputationStore};

#[derive(Parser, Debug)]
#[command(name = "zentinel-agent-email-reputation")]
#[command(about = "Email reputation agent for Zentinel - flag disposable, undeliverable and malformed addresses")]
#[command(version)]
struct Args {
    /// Addresses to validate (read from stdin, one per line, when omitted)
    addresses: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "email-reputation.yaml")]
    config: PathBuf,

    /// Run deep mailbox verification
    #[arg(long)]
    deep: bool,

    /// Do not reject domains without MX records
    #[arg(long)]
    no_mx: bool,

    /// Skip the realtime disposable oracle
    #[arg(long)]
    no_realtime: bool,

    /// Bypass the result cache
    #[arg(long)]
    no_cache: bool,

    /// Maximum concurrent validations (overrides settings.concurrency)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Refresh every blocklist source, report, and exit
    #[arg(long)]
    refresh: bool,

    /// Add domains to the discovered-domain file and exit
    #[arg(long, value_name = "DOMAIN", num_args = 1..)]
    add_discovered: Vec<String>,
}

async fn read_stdin_addresses() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut addresses = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            addresses.push(line.to_string());
        }
    }

    Ok(addresses)
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        info!(config = %path.display(), "Loading configuration");
        Config::load(path)
    } else {
        warn!(config = %path.display(), "Configuration file not found, using defaults");
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging; stdout carries results
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args.config)?;

    // Handle --validate
    if args.validate {
        config.validate()?;
        info!("Configuration is valid");
        return Ok(());
    }

    if args.refresh || !args.add_discovered.is_empty() {
        let store = ReputationStore::new(&config.reputation)?;

        if !args.add_discovered.is_empty() {
            let added = store.discovered().add(&args.add_discovered).await?;
            info!(added, path = %store.discovered().path().display(), "Discovered domains updated");
        }

        if args.refresh {
            for report in store.refresh_now().await {
                match report.result {
                    Ok(count) => info!(source = %report.source, domains = count, "Source refreshed"),
                    Err(e) => warn!(source = %report.source, error = %e, "Source refresh failed"),
                }
            }
            for stats in store.stats() {
                info!(
                    source = %stats.name,
                    domains = stats.domains,
                    fallback = stats.fallback_domains,
                    loaded = stats.loaded,
                    version = stats.version,
                    "Source status"
                );
            }
        }

        return Ok(());
    }

    let addresses = if args.addresses.is_empty() {
        read_stdin_addresses().await?
    } else {
        args.addresses.clone()
    };

    let mut options = config.validate_options();
    options.deep = args.deep;
    options.check_mx &= !args.no_mx;
    options.realtime_disposable &= !args.no_realtime;
    options.use_cache &= !args.no_cache;

    let validator = Arc::new(EmailValidator::from_config(&config).await?);
    let concurrency = args.concurrency.unwrap_or(config.settings.concurrency);
    let executor = BatchExecutor::new(validator, concurrency)
        .with_fatal_policy(config.settings.fatal_policy);

    let report = executor.run(&addresses, &options).await?;

    for (address, result) in addresses.iter().zip(&report.results) {
        let line = match result {
            Ok(result) => serde_json::to_string(result)?,
            Err(e) => json!({ "email": address, "error": e.to_string() }).to_string(),
        };
        println!("{}", line);
    }
    println!("{}", json!({ "summary": report.summary }));

    Ok(())
}
