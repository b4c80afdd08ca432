//! hoopline NBA - season-scoped acquisition from stats.nba.com
//!
//! Fetches rosters, player game logs, shot charts, play by play and
//! advanced box scores (whole game and per period) into an
//! [`EntityStore`](hoopline_store::EntityStore), one file per entity.
//!
//! # Example
//!
//! ```ignore
//! use hoopline_core::Pacing;
//! use hoopline_nba::{ClientConfig, NbaStatsClient, Pipeline, Season};
//! use hoopline_store::EntityStore;
//!
//! let store = EntityStore::new("data".as_ref())?;
//! let client = NbaStatsClient::new(&ClientConfig::default())?;
//! let season: Season = "2019".parse()?;
//! let summary = Pipeline::new(&store, &client, Pacing::default()).run(&season)?;
//! println!("fetched {}", summary.total().fetched);
//! ```

pub mod client;
pub mod config;
pub mod period;
pub mod pipeline;
pub mod roster;
pub mod season;
pub mod source;

// Re-exports
pub use client::NbaStatsClient;
pub use config::ClientConfig;
pub use period::{PeriodWindow, time_at_period};
pub use pipeline::{Pipeline, PipelineSummary};
pub use season::{InvalidSeason, Season};
pub use source::StatsSource;
