//! # Catalog CLI Entry Point
//!
//! Command-line front end for the catalog client.
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Initialize tracing (logging)
//! 3. Load configuration (file → environment → `--offline`)
//! 4. Open the offline store & run migrations
//! 5. Start connectivity and the submission coordinator
//! 6. Run the subcommand
//! 7. Shut the coordinator down

mod commands;
mod state;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use catalog_sync::ClientConfig;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Browse and add catalog products, with an offline queue")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "CATALOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Never touch the network; every new product is queued
    #[arg(long, global = true)]
    pub offline: bool,

    /// Output format for command results
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List products from the server
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a product (queued when offline)
    Add(AddArgs),

    /// Show products waiting in the offline queue
    Pending,

    /// Show connectivity, queue and catalog status
    Status,

    /// Wait for connectivity and replay the offline queue once
    Sync(SyncArgs),

    /// Stay running and replay whenever connectivity returns (Ctrl-C to stop)
    Watch,
}

#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive filter on name or type
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only favorites
    #[arg(short, long)]
    pub favorites: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Product name
    #[arg(short, long)]
    pub name: String,

    /// Product type (Product, Service, Electronics, Stationery, Grocery, Clothing, Other)
    #[arg(short = 't', long = "type", default_value = "")]
    pub product_type: String,

    /// Price (non-negative)
    #[arg(short, long)]
    pub price: f64,

    /// Tax percentage
    #[arg(long, default_value_t = 0.0)]
    pub tax: f64,

    /// JPEG file to upload with the product
    #[arg(short, long)]
    pub image: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Seconds to wait for connectivity before giving up
    #[arg(long, default_value_t = 30)]
    pub wait_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = ClientConfig::load(cli.config.clone())?;
    let app = AppState::start(config, cli.offline).await?;

    let result = commands::run(&app, cli.command, cli.output).await;

    app.shutdown().await;
    result
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Verbose output
/// - `RUST_LOG=info` - Normal operation
/// - `RUST_LOG=catalog_sync=trace` - Trace the coordinator
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalog=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::parse_from([
            "catalog", "--offline", "add", "--name", "Pen", "--type", "Stationery", "--price",
            "10", "--tax", "5",
        ]);
        assert!(cli.offline);
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.name, "Pen");
        assert_eq!(args.product_type, "Stationery");
        assert_eq!(args.price, 10.0);
        assert!(args.image.is_none());
    }

    #[test]
    fn test_parse_list_json() {
        let cli = Cli::parse_from(["catalog", "list", "--search", "pen", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::List(ListArgs { search: Some(_), .. })));
    }
}
