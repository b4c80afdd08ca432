//! Stage pipeline: roster -> game logs -> shot charts -> play by play ->
//! box scores -> per-period box scores
//!
//! Stages run strictly in that order for one season. Later stages derive
//! their work lists from what earlier stages stored, so a stage only starts
//! once the one it reads from has finished.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use indicatif::ProgressBar;

use hoopline_core::{
    BatchRunner, BatchSummary, FetchError, Pacing, RunError, SharedProgress, finish_bar,
};
use hoopline_store::{EntityId, EntityKind, EntityStore, derive_ids};

use crate::period::{PeriodWindow, distinct_periods, period_entity_id};
use crate::roster::{PERSON_ID_COLUMN, active_players};
use crate::season::Season;
use crate::source::StatsSource;

/// Single roster entry per season.
pub const ROSTER_ID: &str = "players";
/// Game log column listing the games a player appeared in.
pub const GAME_ID_COLUMN: &str = "Game_ID";

/// Per-stage results of a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub stages: Vec<(EntityKind, BatchSummary)>,
}

impl PipelineSummary {
    pub fn total(&self) -> BatchSummary {
        let mut total = BatchSummary::default();
        for (_, s) in &self.stages {
            total.merge(s);
        }
        total
    }

    pub fn stage(&self, kind: EntityKind) -> Option<&BatchSummary> {
        self.stages.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }
}

/// Ordered acquisition of every entity kind for one season.
pub struct Pipeline<'a, T, S = fn(Duration)> {
    runner: BatchRunner<'a, S>,
    source: &'a T,
}

impl<'a, T: StatsSource> Pipeline<'a, T> {
    pub fn new(store: &'a EntityStore, source: &'a T, pacing: Pacing) -> Self {
        Self {
            runner: BatchRunner::new(store, pacing),
            source,
        }
    }
}

impl<'a, T: StatsSource, S: Fn(Duration)> Pipeline<'a, T, S> {
    /// Replace the sleep function used for pacing and cooldowns.
    pub fn with_sleeper<U: Fn(Duration)>(self, sleep: U) -> Pipeline<'a, T, U> {
        Pipeline {
            runner: self.runner.with_sleeper(sleep),
            source: self.source,
        }
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.runner = self.runner.with_progress(progress);
        self
    }

    /// Stop between ids once `flag` is set instead of on the process flag.
    pub fn with_shutdown(mut self, flag: &'a AtomicBool) -> Self {
        self.runner = self.runner.with_shutdown(flag);
        self
    }

    /// Run all stages in order, stopping at the first fatal error.
    pub fn run(&self, season: &Season) -> Result<PipelineSummary, RunError> {
        let mut summary = PipelineSummary::default();
        for kind in EntityKind::ALL {
            let stage = self.run_stage(kind, season)?;
            log::info!(
                "[{}] {kind}: {} fetched, {} cached, {} failed attempts",
                season.partition(),
                stage.fetched,
                stage.skipped,
                stage.failed_attempts
            );
            summary.stages.push((kind, stage));
        }
        Ok(summary)
    }

    /// Run one stage. Its upstream stage must already be complete.
    pub fn run_stage(&self, kind: EntityKind, season: &Season) -> Result<BatchSummary, RunError> {
        let partition = season.partition();
        let store = self.runner.store();
        store
            .cleanup_tmp(partition, kind)
            .map_err(|e| RunError::store(partition, kind, None, e))?;

        let source = self.source;
        match kind {
            EntityKind::Roster => {
                let work = [EntityId::new(ROSTER_ID)];
                self.runner.run(partition, kind, &work, |_| {
                    source
                        .all_players(season)
                        .and_then(|players| active_players(players, season.year()))
                })
            }
            EntityKind::GameLog => {
                let work = self.work_list(kind, season, EntityKind::Roster, PERSON_ID_COLUMN)?;
                self.runner.run(partition, kind, &work, |id| {
                    source.player_game_log(season, id)
                })
            }
            EntityKind::ShotChart => {
                let work = self.work_list(kind, season, EntityKind::Roster, PERSON_ID_COLUMN)?;
                self.runner.run(partition, kind, &work, |id| {
                    source.shot_chart_detail(season, id)
                })
            }
            EntityKind::PlayByPlay => {
                let work = self.work_list(kind, season, EntityKind::GameLog, GAME_ID_COLUMN)?;
                self.runner
                    .run(partition, kind, &work, |id| source.play_by_play(id))
            }
            EntityKind::BoxScore => {
                let work = self.work_list(kind, season, EntityKind::GameLog, GAME_ID_COLUMN)?;
                self.runner
                    .run(partition, kind, &work, |id| source.box_score_advanced(id))
            }
            EntityKind::PeriodBoxScore => self.period_box_scores(season),
        }
    }

    /// Two-level stage: game ids from the game logs, then one entry per
    /// period found in that game's stored play by play. All games share one
    /// progress bar whose length grows as periods are discovered.
    fn period_box_scores(&self, season: &Season) -> Result<BatchSummary, RunError> {
        let kind = EntityKind::PeriodBoxScore;
        let games = self.work_list(kind, season, EntityKind::GameLog, GAME_ID_COLUMN)?;

        let pb = self.runner.stage_bar(kind, 0);
        let result = self.period_batches(season, &games, &pb);
        finish_bar(&pb, &result);
        result
    }

    fn period_batches(
        &self,
        season: &Season,
        games: &[EntityId],
        pb: &ProgressBar,
    ) -> Result<BatchSummary, RunError> {
        let kind = EntityKind::PeriodBoxScore;
        let partition = season.partition();
        let store = self.runner.store();

        let mut summary = BatchSummary::default();
        for game in games {
            let pbp = store
                .get(partition, EntityKind::PlayByPlay, game)
                .map_err(|e| RunError::store(partition, kind, Some(game), e))?;

            let targets: Vec<(EntityId, PeriodWindow)> = distinct_periods(&pbp)
                .into_iter()
                .map(|p| (period_entity_id(game, p), PeriodWindow::for_period(p)))
                .collect();
            let work: Vec<EntityId> = targets.iter().map(|(id, _)| id.clone()).collect();

            pb.inc_length(work.len() as u64);
            let batch = self.runner.run_with_bar(partition, kind, &work, pb, |id| {
                let window = targets
                    .iter()
                    .find_map(|(t, w)| (t == id).then_some(*w))
                    .ok_or_else(|| FetchError::decode(format!("no period window for {id}")))?;
                self.source.box_score_advanced_range(game, window)
            })?;
            summary.merge(&batch);
        }
        Ok(summary)
    }

    fn work_list(
        &self,
        stage: EntityKind,
        season: &Season,
        upstream: EntityKind,
        column: &str,
    ) -> Result<Vec<EntityId>, RunError> {
        let ids = derive_ids(self.runner.store(), season.partition(), upstream, column)
            .map_err(|source| RunError::Dependency { stage, source })?;
        log::info!(
            "[{}] {stage}: {} ids from {upstream} {column}",
            season.partition(),
            ids.len()
        );
        Ok(ids.into_iter().collect())
    }
}
