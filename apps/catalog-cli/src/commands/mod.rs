//! # Subcommands
//!
//! ```text
//! commands/
//! ├── mod.rs      ◄─── dispatch + output helpers
//! ├── product.rs  ◄─── list, add
//! └── sync.rs     ◄─── pending, status, sync, watch
//! ```

pub mod product;
pub mod sync;

use serde::Serialize;

use crate::state::AppState;
use crate::{Commands, OutputFormat};

/// Runs one subcommand against the started application.
pub async fn run(app: &AppState, command: Commands, output: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => product::list(app, args, output).await,
        Commands::Add(args) => product::add(app, args, output).await,
        Commands::Pending => sync::pending(app, output).await,
        Commands::Status => sync::status(app, output).await,
        Commands::Sync(args) => sync::sync(app, args, output).await,
        Commands::Watch => sync::watch(app).await,
    }
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
