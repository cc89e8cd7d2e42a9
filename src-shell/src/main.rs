//! Setlist - load, reorder, export and publish playlist listings.
//!
//! This is the terminal entry point. All session behaviour lives in
//! `setlist-core`; this binary parses arguments, sets up logging and wires a
//! [`shell::TerminalShell`] to a [`SessionController`].

mod error;
mod logging;
mod shell;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use setlist_core::{AppConfig, ConfigManager, Error, Result, SessionController};
use tracing::{Level, debug, info, warn};

use crate::logging::LoggingConfig;
use crate::shell::{TerminalShell, parse_position, run_interactive};

#[derive(Parser)]
#[command(name = "setlist")]
#[command(about = "Load, reorder, export and publish playlist listings")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/setlist/config.json)
    #[arg(long, global = true, env = "SETLIST_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for rotated log files
    #[arg(long, global = true, env = "SETLIST_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print command errors as JSON
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a playlist and print its rows
    Show {
        /// Playlist file (csv, txt)
        file: PathBuf,
    },
    /// Load a playlist, apply edits and export it
    Export {
        /// Playlist file (csv, txt)
        file: PathBuf,
        /// Output file; the extension selects the format
        output: PathBuf,
        /// Move the track at position FROM to position TO (1-based, repeatable)
        #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
        moves: Vec<(usize, usize)>,
        /// Override the session name
        #[arg(long)]
        name: Option<String>,
        /// Override the session date
        #[arg(long)]
        date: Option<String>,
    },
    /// Load a playlist and publish its label and date
    Publish {
        /// Playlist file (csv, txt)
        file: PathBuf,
        /// Label to send (default from config)
        #[arg(long)]
        label: Option<String>,
        /// Date to send (default: the playlist date)
        #[arg(long)]
        date: Option<String>,
    },
    /// Start the line-driven session shell
    Interactive {
        /// Playlist to open on start
        file: Option<PathBuf>,
    },
}

/// Parse `FROM:TO` positions into 0-based indices.
fn parse_move(raw: &str) -> std::result::Result<(usize, usize), String> {
    let (from, to) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{raw}'"))?;
    let from = parse_position(from).map_err(|e| e.to_string())?;
    let to = parse_position(to).map_err(|e| e.to_string())?;
    Ok((from, to))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LoggingConfig::auto();
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_log_directory(dir.clone());
    }
    if cli.verbose {
        log_config = log_config.with_console_level(Level::DEBUG);
    }
    let _guard = match logging::init(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {e}");
            None
        }
    };

    info!("Starting setlist {}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error::map_err(&e, cli.json_errors));
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path.to_path_buf())?,
        None => ConfigManager::new()?,
    };
    debug!("Using config {}", manager.path().display());
    Ok(manager.config().clone())
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut controller = SessionController::new(&config);
    let stdout = io::stdout();

    match &cli.command {
        Command::Show { file } => {
            let mut shell = TerminalShell::new(stdout.lock()).with_failures(false);
            controller.open(file, &mut shell)?;
        }
        Command::Export {
            file,
            output,
            moves,
            name,
            date,
        } => {
            let mut shell = TerminalShell::new(stdout.lock())
                .with_tables(false)
                .with_failures(false);
            controller.open(file, &mut shell)?;
            if let Some(name) = name {
                controller.set_name(name, &mut shell);
            }
            if let Some(date) = date {
                controller.set_date(date, &mut shell);
            }
            for &(from, to) in moves {
                controller.move_track(from, to, &mut shell)?;
            }
            controller.save(output, &mut shell)?;
        }
        Command::Publish { file, label, date } => {
            let mut shell = TerminalShell::new(stdout.lock())
                .with_tables(false)
                .with_failures(false);
            controller.open(file, &mut shell)?;
            let label = label
                .clone()
                .unwrap_or_else(|| controller.publish_label().to_string());
            let date = date
                .clone()
                .unwrap_or_else(|| controller.session().date().to_string());
            controller.publish_with(&label, &date, &mut shell)?;
        }
        Command::Interactive { file } => {
            let mut shell = TerminalShell::new(stdout.lock());
            if let Some(file) = file
                && let Err(e) = controller.open(file, &mut shell)
            {
                warn!("Initial open failed: {}", e);
            }
            run_interactive(&mut controller, io::stdin().lock(), &mut shell)?;
            shell.into_inner().flush().map_err(Error::from)?;
        }
    }

    Ok(())
}
