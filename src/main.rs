use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod db;
mod models;
mod sheets;
mod sync;

use commands::{
    AuthCommand, ConfigCommand, MealCommand, SheetCommand, SyncCommand, TargetCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "meallog")]
#[command(version)]
#[command(about = "Offline-first meal logger that syncs through Google Sheets", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and browse meals
    Meal(MealCommand),

    /// Daily macro targets
    Target(TargetCommand),

    /// Manage the linked spreadsheet
    Sheet(SheetCommand),

    /// Sync with the linked spreadsheet
    Sync(SyncCommand),

    /// Manage the cached Google credential
    Auth(AuthCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Commands::Meal(cmd) => cmd.run(&config),
        Commands::Target(cmd) => cmd.run(&config),
        Commands::Sheet(cmd) => cmd.run(&config),
        Commands::Sync(cmd) => cmd.run(&config),
        Commands::Auth(cmd) => cmd.run(&config),
        Commands::Config(cmd) => cmd.run(&config),
    }
}
