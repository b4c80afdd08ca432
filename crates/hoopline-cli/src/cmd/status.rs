//! `hoopline status` - cached entry counts per season and kind

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use hoopline_core::fmt_num;
use hoopline_nba::Season;
use hoopline_store::{EntityKind, EntityStore};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Season to inspect (default: every season in the data dir)
    pub season: Option<Season>,

    /// Data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: StatusArgs, config: &Config) -> Result<()> {
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| config.output.data_dir.clone());
    let store = EntityStore::new(&data_dir)
        .with_context(|| format!("failed to open data dir {}", data_dir.display()))?;

    let partitions = match args.season {
        Some(season) => vec![season.partition().clone()],
        None => store.partitions()?,
    };
    if partitions.is_empty() {
        eprintln!("No seasons in {}.", data_dir.display());
        return Ok(());
    }

    let mut header = vec![Cell::new("Season").fg(Color::Cyan)];
    header.extend(
        EntityKind::ALL
            .iter()
            .map(|k| Cell::new(k.label()).fg(Color::Cyan)),
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);

    for partition in &partitions {
        let mut row = vec![partition.to_string()];
        for kind in EntityKind::ALL {
            row.push(fmt_num(store.count(partition, kind)?));
        }
        table.add_row(row);
    }

    println!("{table}");
    Ok(())
}
