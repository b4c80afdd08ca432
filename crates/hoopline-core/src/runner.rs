//! Resilient batch runner
//!
//! Drives a work list of entity ids through the store and a fetch function.
//! The store is the only progress marker: an id whose entry exists is
//! skipped without a request, so a rerun after a crash or Ctrl-C picks up
//! exactly where the last one stopped.
//!
//! Every fetch error gets the same fixed cooldown and the same id is tried
//! again. There is no backoff, and unless `max_attempts` is set, no cap: a
//! permanently failing id stalls the stage rather than being skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget};

use hoopline_store::{EntityId, EntityKind, EntityStore, Partition, RecordSet};

use crate::error::{FetchError, RunError};
use crate::progress::SharedProgress;
use crate::shutdown::shutdown_flag;

/// Delays and retry cap for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Slept before every fetch attempt, first try or retry.
    pub request_delay: Duration,
    /// Slept after a failed attempt before retrying the same id.
    pub failure_cooldown: Duration,
    /// Consecutive failures for one id before the run aborts. `None` = forever.
    pub max_attempts: Option<u32>,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(3),
            failure_cooldown: Duration::from_secs(300),
            max_attempts: None,
        }
    }
}

/// Counters for one batch (or several, via [`BatchSummary::merge`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    /// Already cached at the time they were reached.
    pub skipped: usize,
    /// Fetched and stored by this run.
    pub fetched: usize,
    /// Failed attempts that were retried.
    pub failed_attempts: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn merge(&mut self, other: &BatchSummary) {
        self.total += other.total;
        self.skipped += other.skipped;
        self.fetched += other.fetched;
        self.failed_attempts += other.failed_attempts;
        self.elapsed += other.elapsed;
    }
}

/// Outcome of one attempt on the id under the cursor.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Advance,
    Retry(Duration),
}

/// Runs work lists against one store, one id at a time.
///
/// `S` performs the pacing and cooldown sleeps; it is `std::thread::sleep`
/// unless replaced with [`BatchRunner::with_sleeper`]. The runner stops
/// between ids once `shutdown` is set, which defaults to the process flag
/// raised by the signal handlers.
pub struct BatchRunner<'a, S = fn(Duration)> {
    store: &'a EntityStore,
    pacing: Pacing,
    sleep: S,
    shutdown: &'a AtomicBool,
    progress: Option<SharedProgress>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(store: &'a EntityStore, pacing: Pacing) -> Self {
        Self {
            store,
            pacing,
            sleep: std::thread::sleep,
            shutdown: shutdown_flag(),
            progress: None,
        }
    }
}

impl<'a, S: Fn(Duration)> BatchRunner<'a, S> {
    /// Replace the sleep function.
    pub fn with_sleeper<T: Fn(Duration)>(self, sleep: T) -> BatchRunner<'a, T> {
        BatchRunner {
            store: self.store,
            pacing: self.pacing,
            sleep,
            shutdown: self.shutdown,
            progress: self.progress,
        }
    }

    /// Watch `flag` instead of the process shutdown flag.
    pub fn with_shutdown(mut self, flag: &'a AtomicBool) -> Self {
        self.shutdown = flag;
        self
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn store(&self) -> &'a EntityStore {
        self.store
    }

    /// Spinner line for one stage; hidden without a progress context.
    pub fn stage_bar(&self, kind: EntityKind, total: usize) -> ProgressBar {
        match &self.progress {
            Some(progress) => progress.stage_bar(kind.label(), total),
            None => ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden()),
        }
    }

    /// Process `work` for `kind`, fetching every id that is not yet stored.
    ///
    /// Ids are attempted in slice order. A failed id keeps the cursor in
    /// place until it succeeds. Returns once the cursor passes the last id,
    /// or on the first fatal error.
    pub fn run<F>(
        &self,
        partition: &Partition,
        kind: EntityKind,
        work: &[EntityId],
        fetch_one: F,
    ) -> Result<BatchSummary, RunError>
    where
        F: FnMut(&EntityId) -> Result<RecordSet, FetchError>,
    {
        let pb = self.stage_bar(kind, work.len());
        let result = self.run_with_bar(partition, kind, work, &pb, fetch_one);
        finish_bar(&pb, &result);
        result
    }

    /// Same as [`run`](Self::run), reporting into a bar owned by the caller.
    ///
    /// The bar is advanced once per id but never finished, so one bar can
    /// span several batches of the same stage.
    pub fn run_with_bar<F>(
        &self,
        partition: &Partition,
        kind: EntityKind,
        work: &[EntityId],
        pb: &ProgressBar,
        mut fetch_one: F,
    ) -> Result<BatchSummary, RunError>
    where
        F: FnMut(&EntityId) -> Result<RecordSet, FetchError>,
    {
        let start = Instant::now();
        let mut summary = BatchSummary {
            total: work.len(),
            ..Default::default()
        };

        let mut i = 0;
        let mut attempts = 0u32;
        while i < work.len() {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(RunError::Interrupted {
                    partition: partition.clone(),
                    kind,
                });
            }

            let id = &work[i];
            if self.store.exists(partition, kind, id) {
                log::debug!("[{partition}] {kind} {id}: cached, skipping");
                summary.skipped += 1;
                attempts = 0;
                i += 1;
                pb.inc(1);
                continue;
            }

            attempts += 1;
            match self.attempt(partition, kind, id, attempts, &mut fetch_one)? {
                Step::Advance => {
                    summary.fetched += 1;
                    attempts = 0;
                    i += 1;
                    pb.inc(1);
                }
                Step::Retry(cooldown) => {
                    summary.failed_attempts += 1;
                    pb.set_message(format!(
                        "{id} failed {attempts}x, cooling down {}s",
                        cooldown.as_secs()
                    ));
                    (self.sleep)(cooldown);
                }
            }
        }

        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    /// One paced fetch of `id`. Storage failures are fatal; fetch failures
    /// become a retry unless the attempt cap is reached.
    fn attempt<F>(
        &self,
        partition: &Partition,
        kind: EntityKind,
        id: &EntityId,
        attempt: u32,
        fetch_one: &mut F,
    ) -> Result<Step, RunError>
    where
        F: FnMut(&EntityId) -> Result<RecordSet, FetchError>,
    {
        // An id the store cannot hold would be fetched again on every run.
        self.store
            .validate_key(kind, id)
            .map_err(|e| RunError::store(partition, kind, Some(id), e))?;

        (self.sleep)(self.pacing.request_delay);
        log::info!("[{partition}] downloading {kind} for id {id}");

        match fetch_one(id) {
            Ok(record) => {
                self.store
                    .put(partition, kind, id, &record)
                    .map_err(|e| RunError::store(partition, kind, Some(id), e))?;
                Ok(Step::Advance)
            }
            Err(e) => {
                if self.pacing.max_attempts.is_some_and(|max| attempt >= max) {
                    log::error!("[{partition}] {kind} {id}: attempt {attempt} failed: {e}, giving up");
                    return Err(RunError::RetriesExhausted {
                        partition: partition.clone(),
                        kind,
                        id: id.clone(),
                        attempts: attempt,
                        last: e,
                    });
                }
                let why = if e.is_rate_limited() { "throttled" } else { "failed" };
                log::warn!(
                    "[{partition}] {kind} {id}: attempt {attempt} {why}: {e}, retrying in {}s",
                    self.pacing.failure_cooldown.as_secs()
                );
                Ok(Step::Retry(self.pacing.failure_cooldown))
            }
        }
    }
}

/// Clear a stage bar on success, leave it on screen on failure.
pub fn finish_bar<T>(pb: &ProgressBar, result: &Result<T, RunError>) {
    match result {
        Ok(_) => pb.finish_and_clear(),
        Err(e) if e.is_interrupted() => pb.abandon_with_message("interrupted"),
        Err(_) => pb.abandon(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    const DELAY: Duration = Duration::from_millis(3);
    const COOLDOWN: Duration = Duration::from_millis(300);

    fn pacing() -> Pacing {
        Pacing {
            request_delay: DELAY,
            failure_cooldown: COOLDOWN,
            max_attempts: None,
        }
    }

    fn setup() -> (tempfile::TempDir, EntityStore, Partition) {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new(dir.path()).unwrap();
        (dir, store, Partition::new("2019").unwrap())
    }

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::new(*s)).collect()
    }

    fn record(id: &EntityId) -> RecordSet {
        RecordSet::new("T", vec!["ID".into()], vec![vec![json!(id.as_str())]])
    }

    #[test]
    fn fetches_each_missing_id_once() {
        let (_dir, store, p) = setup();
        let slept = RefCell::new(Vec::new());
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|d| slept.borrow_mut().push(d));
        let calls = RefCell::new(Vec::new());

        let work = ids(&["1", "2", "3"]);
        let summary = runner
            .run(&p, EntityKind::GameLog, &work, |id| {
                calls.borrow_mut().push(id.clone());
                Ok(record(id))
            })
            .unwrap();

        assert_eq!(*calls.borrow(), work);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.skipped, 0);
        assert_eq!(*slept.borrow(), vec![DELAY; 3]);
        assert!(work.iter().all(|id| store.exists(&p, EntityKind::GameLog, id)));
    }

    #[test]
    fn second_run_fetches_nothing() {
        let (_dir, store, p) = setup();
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|_| {});
        let work = ids(&["1", "2"]);
        runner
            .run(&p, EntityKind::GameLog, &work, |id| Ok(record(id)))
            .unwrap();

        let slept = RefCell::new(0);
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|_| *slept.borrow_mut() += 1);
        let summary = runner
            .run(&p, EntityKind::GameLog, &work, |_| {
                panic!("cached ids must not be fetched")
            })
            .unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.fetched, 0);
        assert_eq!(*slept.borrow(), 0);
    }

    #[test]
    fn cached_before_run_is_skipped_even_if_repeated() {
        let (_dir, store, p) = setup();
        let x = EntityId::new("X");
        store.put(&p, EntityKind::ShotChart, &x, &record(&x)).unwrap();

        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|_| {});
        let calls = RefCell::new(0);
        let summary = runner
            .run(&p, EntityKind::ShotChart, &ids(&["X", "Y", "X"]), |id| {
                *calls.borrow_mut() += 1;
                assert_ne!(id.as_str(), "X");
                Ok(record(id))
            })
            .unwrap();

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn retries_same_id_until_success() {
        let (_dir, store, p) = setup();
        let slept = RefCell::new(Vec::new());
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|d| slept.borrow_mut().push(d));
        let calls: RefCell<HashMap<String, u32>> = RefCell::new(HashMap::new());
        let order = RefCell::new(Vec::new());

        const FAILURES: u32 = 3;
        let summary = runner
            .run(&p, EntityKind::PlayByPlay, &ids(&["A", "X", "B"]), |id| {
                order.borrow_mut().push(id.as_str().to_string());
                let mut calls = calls.borrow_mut();
                let n = calls.entry(id.as_str().to_string()).or_default();
                *n += 1;
                if id.as_str() == "X" && *n <= FAILURES {
                    Err(FetchError::Http {
                        status: Some(429),
                        message: "slow down".into(),
                    })
                } else {
                    Ok(record(id))
                }
            })
            .unwrap();

        assert_eq!(calls.borrow()["X"], FAILURES + 1);
        assert_eq!(calls.borrow()["B"], 1);
        // Cursor stays on X until it succeeds.
        assert_eq!(*order.borrow(), vec!["A", "X", "X", "X", "X", "B"]);
        let cooldowns = slept.borrow().iter().filter(|d| **d == COOLDOWN).count();
        assert_eq!(cooldowns, FAILURES as usize);
        assert_eq!(summary.failed_attempts, FAILURES as usize);
        assert_eq!(summary.fetched, 3);
    }

    #[test]
    fn pacing_delay_precedes_every_attempt() {
        let (_dir, store, p) = setup();
        let slept = RefCell::new(Vec::new());
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|d| slept.borrow_mut().push(d));
        let failed = RefCell::new(false);
        runner
            .run(&p, EntityKind::BoxScore, &ids(&["G"]), |id| {
                if !failed.replace(true) {
                    Err(FetchError::decode("empty body"))
                } else {
                    Ok(record(id))
                }
            })
            .unwrap();
        assert_eq!(*slept.borrow(), vec![DELAY, COOLDOWN, DELAY]);
    }

    #[test]
    fn attempt_cap_aborts_run() {
        let (_dir, store, p) = setup();
        let capped = Pacing {
            max_attempts: Some(2),
            ..pacing()
        };
        let runner = BatchRunner::new(&store, capped).with_sleeper(|_| {});
        let calls = RefCell::new(0);
        let err = runner
            .run(&p, EntityKind::GameLog, &ids(&["bad", "next"]), |id| {
                *calls.borrow_mut() += 1;
                assert_eq!(id.as_str(), "bad");
                Err(FetchError::decode("nope"))
            })
            .unwrap_err();

        assert_eq!(*calls.borrow(), 2);
        match err {
            RunError::RetriesExhausted { id, attempts, .. } => {
                assert_eq!(id.as_str(), "bad");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn storage_failure_is_fatal() {
        let (dir, store, p) = setup();
        // Block partition provisioning with a plain file.
        std::fs::write(dir.path().join("2019"), b"").unwrap();
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|_| {});
        let calls = RefCell::new(0);
        let err = runner
            .run(&p, EntityKind::GameLog, &ids(&["1", "2"]), |id| {
                *calls.borrow_mut() += 1;
                Ok(record(id))
            })
            .unwrap_err();

        assert_eq!(*calls.borrow(), 1);
        assert!(matches!(err, RunError::Store { id: Some(_), .. }));
    }

    #[test]
    fn empty_work_list() {
        let (_dir, store, p) = setup();
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|_| {});
        let summary = runner
            .run(&p, EntityKind::GameLog, &[], |_| unreachable!())
            .unwrap();
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn summaries_merge() {
        let mut a = BatchSummary {
            total: 2,
            skipped: 1,
            fetched: 1,
            failed_attempts: 0,
            elapsed: Duration::from_secs(1),
        };
        let b = BatchSummary {
            total: 3,
            skipped: 0,
            fetched: 3,
            failed_attempts: 2,
            elapsed: Duration::from_secs(2),
        };
        a.merge(&b);
        assert_eq!(a.total, 5);
        assert_eq!(a.fetched, 4);
        assert_eq!(a.failed_attempts, 2);
        assert_eq!(a.elapsed, Duration::from_secs(3));
    }

    #[test]
    fn default_pacing_matches_source_limits() {
        let p = Pacing::default();
        assert_eq!(p.request_delay, Duration::from_secs(3));
        assert_eq!(p.failure_cooldown, Duration::from_secs(300));
        assert!(p.max_attempts.is_none());
    }

    #[test]
    fn unstorable_id_fails_before_fetching() {
        let (_dir, store, p) = setup();
        let slept = RefCell::new(Vec::new());
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|d| slept.borrow_mut().push(d));
        let calls = RefCell::new(0);

        for _ in 0..2 {
            let err = runner
                .run(&p, EntityKind::GameLog, &ids(&["A B"]), |id| {
                    *calls.borrow_mut() += 1;
                    Ok(record(id))
                })
                .unwrap_err();
            match err {
                RunError::Store { id, source, .. } => {
                    assert_eq!(id, Some(EntityId::new("A B")));
                    assert!(matches!(source, hoopline_store::StoreError::InvalidKey { .. }));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(*calls.borrow(), 0);
        assert!(slept.borrow().is_empty());
    }

    #[test]
    fn shutdown_stops_between_ids() {
        let (_dir, store, p) = setup();
        let stop = AtomicBool::new(false);
        let runner = BatchRunner::new(&store, pacing())
            .with_sleeper(|_| {})
            .with_shutdown(&stop);
        let calls = RefCell::new(Vec::new());

        let err = runner
            .run(&p, EntityKind::PlayByPlay, &ids(&["1", "2", "3"]), |id| {
                calls.borrow_mut().push(id.clone());
                // Signal arrives while the first id is in flight.
                stop.store(true, Ordering::Relaxed);
                Ok(record(id))
            })
            .unwrap_err();

        assert!(err.is_interrupted());
        assert_eq!(*calls.borrow(), ids(&["1"]));
        assert!(store.exists(&p, EntityKind::PlayByPlay, &EntityId::new("1")));
        assert!(!store.exists(&p, EntityKind::PlayByPlay, &EntityId::new("2")));
    }

    #[test]
    fn shutdown_before_start_fetches_nothing() {
        let (_dir, store, p) = setup();
        let stop = AtomicBool::new(true);
        let runner = BatchRunner::new(&store, pacing())
            .with_sleeper(|_| {})
            .with_shutdown(&stop);
        let err = runner
            .run(&p, EntityKind::GameLog, &ids(&["1"]), |_| {
                panic!("nothing may be fetched after shutdown")
            })
            .unwrap_err();
        assert!(matches!(err, RunError::Interrupted { kind: EntityKind::GameLog, .. }));
    }

    #[test]
    fn shared_bar_spans_batches() {
        let (_dir, store, p) = setup();
        let runner = BatchRunner::new(&store, pacing()).with_sleeper(|_| {});
        let pb = runner.stage_bar(EntityKind::PeriodBoxScore, 0);

        for batch in [ids(&["G1_1", "G1_2"]), ids(&["G2_1", "G2_2", "G2_3"])] {
            pb.inc_length(batch.len() as u64);
            runner
                .run_with_bar(&p, EntityKind::PeriodBoxScore, &batch, &pb, |id| Ok(record(id)))
                .unwrap();
        }

        assert_eq!(pb.position(), 5);
        assert_eq!(pb.length(), Some(5));
        assert!(!pb.is_finished());
    }
}
