use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use vmnet_ipam::config_loader::{build_registry, load_config};
use vmnet_ipam::ip::{PoolRegistry, PoolSummary};

/// Inspect and exercise IPv4 address pools for VM provisioning
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pool configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Output format for reports
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Summarize every configured pool
    List,
    /// Show one pool with its used, excluded and next available addresses
    Show {
        /// Pool name
        pool: String,
        /// Maximum number of available addresses to list
        #[arg(long, default_value_t = 16)]
        limit: usize,
    },
    /// Allocate addresses from a freshly created pool and print them
    Allocate {
        /// Pool name
        pool: String,
        /// Number of addresses to allocate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Yaml,
}

/// Detailed view of a single pool
#[derive(Serialize)]
struct PoolReport {
    #[serde(flatten)]
    summary: PoolSummary,
    used: Vec<Ipv4Addr>,
    excluded: Vec<Ipv4Addr>,
    next_available: Vec<Ipv4Addr>,
}

/// Result of an `allocate` run
#[derive(Serialize)]
struct AllocationReport {
    allocated: Vec<Ipv4Addr>,
    pool: PoolSummary,
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(rendered)
}

fn run(registry: &PoolRegistry, command: &Command, format: OutputFormat) -> Result<String> {
    match command {
        Command::List => render(&registry.summaries(), format),
        Command::Show { pool, limit } => {
            let pool = registry.get_pool(pool)?;
            let report = PoolReport {
                summary: pool.summary(),
                used: pool.used_ips(),
                excluded: pool.excluded_ips(),
                next_available: pool.available_ips_head(*limit),
            };
            render(&report, format)
        }
        Command::Allocate { pool, count } => {
            let pool = registry.get_pool(pool)?;
            let allocated = (0..*count)
                .map(|_| pool.allocate())
                .collect::<Result<Vec<_>, _>>()
                .wrap_err_with(|| {
                    format!("Failed to allocate {} addresses from pool '{}'", count, pool.name())
                })?;
            info!("Allocated {} addresses from pool {}", allocated.len(), pool.name());
            let report = AllocationReport {
                allocated,
                pool: pool.summary(),
            };
            render(&report, format)
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // The configured level is only a default; RUST_LOG still wins
    let config = load_config(&args.config)?;
    env_logger::Builder::from_env(Env::default().default_filter_or(config.general().log_level()))
        .init();

    info!("Configuration file: {:?}", args.config);

    let registry = build_registry(&config)?;
    let output = run(&registry, &args.command, args.format)?;
    println!("{}", output);

    Ok(())
}
