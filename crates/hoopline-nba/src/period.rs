//! Per-period time windows for range-based box scores
//!
//! Game clock offsets are in tenths of a second: four 12-minute quarters,
//! then 5-minute overtimes.

use std::collections::BTreeSet;

use hoopline_store::{EntityId, RecordSet};

/// Play-by-play column holding the period number.
pub const PERIOD_COLUMN: &str = "PERIOD";

const QUARTER_SECS: u64 = 720;
const OVERTIME_SECS: u64 = 300;

/// Game clock offset at the start of `period` (1-based), in tenths of a second.
///
/// Computed in `u64`, so any `u32` period (and the one after it) fits.
pub fn time_at_period(period: u32) -> u64 {
    clock_offset(u64::from(period))
}

fn clock_offset(period: u64) -> u64 {
    if period > 5 {
        (QUARTER_SECS * 4 + (period - 5) * OVERTIME_SECS) * 10
    } else {
        QUARTER_SECS * period.saturating_sub(1) * 10
    }
}

/// `StartRange`/`EndRange` pair covering one period, trimmed 0.5s at each end
/// so the boundaries never bleed into neighbouring periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub period: u32,
    pub start_range: u64,
    pub end_range: u64,
}

impl PeriodWindow {
    pub fn for_period(period: u32) -> Self {
        Self {
            period,
            start_range: time_at_period(period) + 5,
            end_range: clock_offset(u64::from(period) + 1).saturating_sub(5),
        }
    }
}

/// Distinct positive periods present in a play-by-play record set.
pub fn distinct_periods(play_by_play: &RecordSet) -> BTreeSet<u32> {
    let Some(cells) = play_by_play.column(PERIOD_COLUMN) else {
        return BTreeSet::new();
    };
    cells
        .filter_map(|v| match v {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter_map(|p| u32::try_from(p).ok())
        .filter(|p| *p >= 1)
        .collect()
}

/// Entity id for one (game, period) box score, e.g. `0021900050_3`.
pub fn period_entity_id(game_id: &EntityId, period: u32) -> EntityId {
    EntityId::new(format!("{game_id}_{period}"))
}
