//! chainanchor CLI — resolve anchoring transactions from the terminal.
//!
//! Usage:
//! ```bash
//! # Resolve an anchoring transaction to its canonical record
//! chainanchor resolve --chain ethsepolia --tx 0x…
//!
//! # Require six confirmations, JSON logs on stderr
//! RUST_LOG=chainanchor_core=debug chainanchor resolve --chain bitcoin --tx … \
//!     --min-confirmations 6 --json-logs
//!
//! # List supported chains and their explorers
//! chainanchor chains
//! ```

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chainanchor_core::{ExplorerRegistry, ResolveError, ResolverConfig, SupportedChain};
use chainanchor_explorers::default_registry;
use chainanchor_http::HttpTransportClient;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "resolve" => cmd_resolve(&args[2..]).await,
        "chains" => cmd_chains(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("chainanchor {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainanchor {}", env!("CARGO_PKG_VERSION"));
    println!("Resolve certificate anchoring transactions across block explorers\n");
    println!("USAGE:");
    println!("    chainanchor <COMMAND>\n");
    println!("COMMANDS:");
    println!("    resolve    Look up a transaction and print its anchoring record");
    println!("    chains     List supported chains and their explorers");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("RESOLVE FLAGS:");
    println!("    --chain <CHAIN>            Chain code, e.g. ethmain, bitcoin  [required]");
    println!("    --tx <ID>                  Transaction id                     [required]");
    println!("    --min-confirmations <N>    Override CHAINANCHOR_MIN_CONFIRMATIONS");
    println!("    --config <FILE>            JSON config instead of the environment");
    println!("    --json-logs                Emit JSON logs on stderr\n");
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                       Log filter (default: warn)");
    println!("    ETHERSCAN_API_KEY              Etherscan V2 API key");
    println!("    CHAINANCHOR_MIN_CONFIRMATIONS  Minimum confirmations (default: 1)");
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn load_config(args: &[String]) -> Result<ResolverConfig> {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            ResolverConfig::from_json_str(&raw).with_context(|| format!("parsing {path}"))?
        }
        None => ResolverConfig::from_env()?,
    };
    if let Some(min) = parse_flag(args, "--min-confirmations") {
        let min = min
            .parse()
            .with_context(|| format!("--min-confirmations must be a non-negative integer, got {min}"))?;
        config = config.with_minimum_confirmations(min);
    }
    Ok(config)
}

fn build_registry(config: &ResolverConfig) -> Result<ExplorerRegistry> {
    let transport = HttpTransportClient::from_resolver_config(config)?;
    Ok(default_registry(Arc::new(transport), config))
}

async fn cmd_resolve(args: &[String]) -> Result<()> {
    init_tracing(has_flag(args, "--json-logs"));

    let chain: SupportedChain = parse_flag(args, "--chain")
        .ok_or_else(|| anyhow!("--chain is required"))?
        .parse()?;
    let tx = parse_flag(args, "--tx").ok_or_else(|| anyhow!("--tx is required"))?;

    let config = load_config(args)?;
    let registry = build_registry(&config)?;

    match registry.resolve(chain, &tx).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(ResolveError::UnableToGetRemoteHash { failures, .. }) => {
            for failure in &failures {
                eprintln!("  {}: {}", failure.service, failure.error);
            }
            Err(anyhow!("Unable to get remote hash for {tx} on {chain}"))
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_chains(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let registry = build_registry(&config)?;

    println!("Supported chains:\n");
    for chain in SupportedChain::ALL {
        let info = chain.info();
        let explorers: Vec<String> = registry
            .backends_for(chain)
            .iter()
            .map(|b| format!("{} ({})", b.service_name, b.priority))
            .collect();
        let explorers = if explorers.is_empty() {
            "none".to_string()
        } else {
            explorers.join(", ")
        };
        println!("  {:<16} {}{}", info.code, info.name, if info.test { " [test]" } else { "" });
        println!("  {:<16} Explorers: {explorers}", "");
    }
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
