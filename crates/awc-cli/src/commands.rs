//! CLI command definitions.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a workflow into a CI document
    Compile {
        /// Path to workflow file
        path: PathBuf,

        /// Output file (defaults to <name>.lock.yml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a workflow compiles
    Validate {
        /// Path to workflow file
        path: PathBuf,
    },

    /// Print jobs in execution order
    Order {
        /// Path to workflow file
        path: PathBuf,
    },

    /// Print the agent's allowed-tools string
    Permissions {
        /// Path to workflow file
        path: PathBuf,
    },

    /// Print the JSON schema of workflow files
    Schema,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Key
        key: String,

        /// Value
        value: String,
    },
}
