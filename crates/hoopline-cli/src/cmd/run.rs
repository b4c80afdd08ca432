//! `hoopline run` - fetch every entity kind for one season

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use hoopline_core::{SharedProgress, fmt_num};
use hoopline_nba::{NbaStatsClient, Pipeline, PipelineSummary, Season};
use hoopline_store::EntityStore;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Season start year (2019 = 2019-20); also the partition name
    pub season: Season,

    /// Data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Seconds to sleep before every request
    #[arg(long)]
    pub request_delay: Option<u64>,

    /// Seconds to wait after a failed request before retrying it
    #[arg(long)]
    pub failure_cooldown: Option<u64>,

    /// Abort after this many consecutive failures for one id (0 = never)
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

pub fn run(args: RunArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let mut pacing_config = config.pacing;
    if let Some(secs) = args.request_delay {
        pacing_config.request_delay_secs = secs;
    }
    if let Some(secs) = args.failure_cooldown {
        pacing_config.failure_cooldown_secs = secs;
    }
    if let Some(n) = args.max_attempts {
        pacing_config.max_attempts = Some(n);
    }
    let pacing = pacing_config.to_pacing();

    let data_dir = args
        .data_dir
        .unwrap_or_else(|| config.output.data_dir.clone());
    let store = EntityStore::new(&data_dir)
        .with_context(|| format!("failed to open data dir {}", data_dir.display()))?;
    let client = NbaStatsClient::new(&config.http.to_client_config())
        .context("failed to build stats client")?;

    log::info!(
        "season {} into {} (delay {}s, cooldown {}s, max attempts {})",
        args.season,
        store.partition_dir(args.season.partition()).display(),
        pacing.request_delay.as_secs(),
        pacing.failure_cooldown.as_secs(),
        pacing
            .max_attempts
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
    );

    let summary = Pipeline::new(&store, &client, pacing)
        .with_progress(progress.clone())
        .run(&args.season)
        .with_context(|| format!("season {} did not complete", args.season))?;

    progress.println(format!("\n{}", summary_table(&summary)));
    Ok(())
}

fn summary_table(summary: &PipelineSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Stage").fg(Color::Cyan),
            Cell::new("Ids").fg(Color::Cyan),
            Cell::new("Cached").fg(Color::Cyan),
            Cell::new("Fetched").fg(Color::Cyan),
            Cell::new("Retries").fg(Color::Cyan),
            Cell::new("Time").fg(Color::Cyan),
        ]);

    for (kind, s) in &summary.stages {
        table.add_row(vec![
            kind.label().to_string(),
            fmt_num(s.total),
            fmt_num(s.skipped),
            fmt_num(s.fetched),
            fmt_num(s.failed_attempts),
            format!("{:.1}s", s.elapsed.as_secs_f64()),
        ]);
    }
    table
}
