//! hoopline - resumable NBA stats acquisition
//!
//! Downloads one season of rosters, game logs, shot charts, play by play
//! and advanced box scores, one file per entity. Safe to interrupt and
//! rerun: anything already on disk is never fetched again.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;
use hoopline_core::RunError;

#[derive(Parser)]
#[command(name = "hoopline")]
#[command(about = "Resumable, rate-limited NBA stats acquisition")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./hoopline.toml or ~/.config/hoopline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch everything for one season, resuming from what is on disk
    Run(cmd::run::RunArgs),
    /// Show cached entry counts
    Status(cmd::status::StatusArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let progress = Arc::new(hoopline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, stage lines show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = is_tty && !cli.debug;
    hoopline_core::init_logging(quiet, cli.debug, multi);

    if let Err(e) = hoopline_core::install_signal_handlers() {
        log::warn!("signal handlers not installed: {e}");
    }

    match run(cli, &progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<RunError>().is_some_and(RunError::is_interrupted) => {
            log::warn!("{e:#}; rerun to resume");
            ExitCode::from(130)
        }
        Err(e) => {
            log::error!("Fatal error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli, progress: &hoopline_core::SharedProgress) -> Result<()> {
    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Run(args) => cmd::run::run(args, &config, progress),
        Command::Status(args) => cmd::status::run(args, &config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Data directory",
                &config.output.data_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Request delay",
                &format!("{}s", config.pacing.request_delay_secs),
            ]);
            table.add_row(vec![
                "Failure cooldown",
                &format!("{}s", config.pacing.failure_cooldown_secs),
            ]);
            table.add_row(vec![
                "Max attempts",
                &config
                    .pacing
                    .max_attempts
                    .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            ]);
            table.add_row(vec!["Stats API URL", &config.http.base_url]);
            table.add_row(vec!["Timeout", &format!("{}s", config.http.timeout_secs)]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
