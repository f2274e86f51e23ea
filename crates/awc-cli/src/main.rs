//! Agentic workflow compiler CLI entrypoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;


use commands::{Commands, ConfigCommands};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "awc")]
#[command(author, version, about = "Agentic workflow compiler", long_about = None)]
struct Cli {
    /// Log compilation details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CliConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Compile { path, output } => handlers::compile(&config, &path, output)?,
        Commands::Validate { path } => handlers::validate(&config, &path)?,
        Commands::Order { path } => handlers::order(&config, &path)?,
        Commands::Permissions { path } => handlers::permissions(&config, &path)?,
        Commands::Schema => handlers::schema()?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
