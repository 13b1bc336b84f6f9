//! Linescape CLI - Command-line interface
//!
//! Renders repository line maps from a tile server and converts between the
//! line, grid cell and tile coordinate spaces.

mod commands;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use linescape::config::{config_file_path, ConfigFile};

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "linescape")]
#[command(version, about = "Every line of a Git repository as a zoomable map", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.linescape/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one frame once its tiles have arrived and save it as PNG
    Render(commands::render::RenderArgs),

    /// Drive the frame loop until Ctrl+C, reporting progress
    Run(commands::run::RunArgs),

    /// Convert between line, grid cell and tile coordinates
    Locate(commands::locate::LocateArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_file_path);

    let result = match cli.command {
        Commands::Render(args) => {
            load_config(&config_path).and_then(|config| commands::render::run(args, config))
        }
        Commands::Run(args) => {
            load_config(&config_path).and_then(|config| commands::run::run(args, config))
        }
        Commands::Locate(args) => commands::locate::run(args),
        Commands::Config(command) => commands::config::run(command, &config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(path)?)
}
