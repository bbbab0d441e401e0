use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ProcessingError, Result};
use crate::fetcher::client::{FetchError, GridFetcher};
use crate::fetcher::validator::{FileValidator, Verdict};
use crate::models::{DownloadOutcome, DownloadResult, FetchUnit};
use crate::utils::constants::DEFAULT_MAX_RETRIES;
use crate::utils::filename::grid_file_name;
use crate::utils::progress::ProgressReporter;

/// Delay before retry attempt `attempt` (1-based count of completed
/// attempts). Pure function of the attempt count: exponential from the
/// base delay, capped at 30s.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(Duration::from_secs(30))
}

/// Enumerate every fetch unit for the requested (variables x years) set:
/// one unit per variable per day, all sharing the bounding box that
/// covers the requested locations.
pub fn enumerate_units(
    variables: &[crate::models::VariableSpec],
    bounds: crate::models::GridBounds,
    start_year: i32,
    end_year: i32,
) -> Result<Vec<FetchUnit>> {
    use chrono::NaiveDate;

    if start_year > end_year {
        return Err(ProcessingError::Config(format!(
            "Start year {} is after end year {}",
            start_year, end_year
        )));
    }
    // Fail early on years the archive does not cover.
    crate::models::fetch_unit::stream_number(start_year)?;

    let mut units = Vec::new();
    for variable in variables {
        for year in start_year..=end_year {
            let mut date = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year start");
            let end = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year end");
            while date <= end {
                units.push(FetchUnit::new(variable.clone(), date, bounds));
                date = date.succ_opt().expect("date within range");
            }
        }
    }

    Ok(units)
}

struct Pending {
    unit: FetchUnit,
    dest: PathBuf,
    /// Completed (failed) attempts so far.
    attempt: u32,
}

/// Terminal outcomes for every scheduled fetch unit.
#[derive(Debug)]
pub struct DownloadReport {
    pub results: Vec<DownloadResult>,
}

impl DownloadReport {
    pub fn successes(&self) -> impl Iterator<Item = &DownloadResult> {
        self.results.iter().filter(|r| r.outcome.is_success())
    }

    pub fn permanent_failures(&self) -> impl Iterator<Item = &DownloadResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, DownloadOutcome::PermanentFailure(_)))
    }

    pub fn generate_summary(&self) -> String {
        let succeeded = self.successes().count();
        let failed: Vec<&DownloadResult> = self.permanent_failures().collect();
        let resumed = self
            .results
            .iter()
            .filter(|r| r.outcome.is_success() && r.attempts == 0)
            .count();

        let mut summary = String::new();
        summary.push_str("=== Download Report ===\n");
        summary.push_str(&format!("Total units: {}\n", self.results.len()));
        summary.push_str(&format!(
            "Succeeded: {} ({} already on disk)\n",
            succeeded, resumed
        ));
        summary.push_str(&format!("Permanently failed: {}\n", failed.len()));

        if !failed.is_empty() {
            summary.push_str("\nFailed units:\n");
            for result in &failed {
                let reason = match &result.outcome {
                    DownloadOutcome::PermanentFailure(reason) => reason.as_str(),
                    _ => unreachable!(),
                };
                summary.push_str(&format!(
                    "  {} after {} attempt(s): {}\n",
                    result.unit.label(),
                    result.attempts,
                    reason
                ));
            }
        }

        summary
    }
}

/// Runs all fetch units under bounded parallelism with retry.
///
/// A work queue is seeded with every unit not already valid on disk;
/// `max_concurrent` workers pull from it, fetch, validate, and either
/// finalize the unit or push it back with an incremented attempt count.
/// Every unit ends in exactly one terminal outcome.
pub struct DownloadScheduler<F: GridFetcher> {
    fetcher: F,
    validator: FileValidator,
    max_concurrent: usize,
    max_retries: u32,
    retry_base_delay: Duration,
    cancel: CancellationToken,
}

impl<F: GridFetcher> DownloadScheduler<F> {
    pub fn new(fetcher: F, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            validator: FileValidator::new(),
            max_concurrent: max_concurrent.max(1),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(500),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Drive all units to a terminal outcome. Raw files land under
    /// `raw_dir/{variable name}/`; units whose file already validates are
    /// recorded as successes without touching the network.
    pub async fn run(
        &self,
        units: Vec<FetchUnit>,
        raw_dir: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<DownloadReport> {
        let mut results: Vec<DownloadResult> = Vec::with_capacity(units.len());
        let mut queue: VecDeque<Pending> = VecDeque::new();

        for unit in units {
            let dest = match self.dest_path(raw_dir, &unit) {
                Ok(dest) => dest,
                Err(e) => {
                    // A unit we cannot even name on disk is a malformed
                    // request, not a network flake.
                    results.push(DownloadResult {
                        unit,
                        outcome: DownloadOutcome::PermanentFailure(e.to_string()),
                        attempts: 0,
                    });
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    continue;
                }
            };

            if dest.exists() {
                if self
                    .validator
                    .validate(&dest, &unit.variable.field_id)
                    .is_valid()
                {
                    info!(unit = %unit.label(), "already on disk, skipping");
                    results.push(DownloadResult {
                        unit,
                        outcome: DownloadOutcome::Success(dest),
                        attempts: 0,
                    });
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    continue;
                }
                warn!(unit = %unit.label(), "removing stale invalid file");
                std::fs::remove_file(&dest)?;
            }

            queue.push_back(Pending {
                unit,
                dest,
                attempt: 0,
            });
        }

        let remaining = AtomicUsize::new(queue.len());
        let queue = Mutex::new(queue);
        let results = Mutex::new(results);

        let workers: Vec<_> = (0..self.max_concurrent)
            .map(|_| self.worker(&queue, &results, &remaining, progress))
            .collect();
        futures_util::future::join_all(workers).await;

        if self.cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let mut results = results.into_inner();
        results.sort_by(|a, b| a.unit.label().cmp(&b.unit.label()));
        Ok(DownloadReport { results })
    }

    fn dest_path(&self, raw_dir: &Path, unit: &FetchUnit) -> Result<PathBuf> {
        let dir = raw_dir.join(&unit.variable.name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(grid_file_name(unit)?))
    }

    async fn worker(
        &self,
        queue: &Mutex<VecDeque<Pending>>,
        results: &Mutex<Vec<DownloadResult>>,
        remaining: &AtomicUsize,
        progress: Option<&ProgressReporter>,
    ) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let pending = queue.lock().await.pop_front();
            let Some(mut pending) = pending else {
                if remaining.load(Ordering::SeqCst) == 0 {
                    break;
                }
                // Other workers may still requeue failed units.
                tokio::time::sleep(Duration::from_millis(20)).await;
                continue;
            };

            if pending.attempt > 0 {
                let delay = backoff_delay(pending.attempt, self.retry_base_delay);
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let attempt = pending.attempt + 1;
            let fetched = tokio::select! {
                _ = self.cancel.cancelled() => break,
                outcome = self.fetcher.fetch(&pending.unit, &pending.dest) => outcome,
            };

            let outcome = match fetched {
                Ok(()) => {
                    match self
                        .validator
                        .validate(&pending.dest, &pending.unit.variable.field_id)
                    {
                        Verdict::Valid => {
                            Some(DownloadOutcome::Success(pending.dest.clone()))
                        }
                        Verdict::Invalid(reason) => {
                            // Stale partial files must not collide with a
                            // re-fetch.
                            let _ = std::fs::remove_file(&pending.dest);
                            warn!(unit = %pending.unit.label(), %reason, "invalid download");
                            self.transient_outcome(&reason, attempt)
                        }
                    }
                }
                Err(FetchError::Permanent(reason)) => {
                    Some(DownloadOutcome::PermanentFailure(reason))
                }
                Err(FetchError::Transient(reason)) => {
                    warn!(unit = %pending.unit.label(), %reason, attempt, "fetch failed");
                    self.transient_outcome(&reason, attempt)
                }
            };

            match outcome {
                Some(outcome) => {
                    results.lock().await.push(DownloadResult {
                        unit: pending.unit,
                        outcome,
                        attempts: attempt,
                    });
                    remaining.fetch_sub(1, Ordering::SeqCst);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                }
                None => {
                    pending.attempt = attempt;
                    queue.lock().await.push_back(pending);
                }
            }
        }
    }

    /// `Some(PermanentFailure)` once the retry budget is spent, `None` to
    /// requeue.
    fn transient_outcome(&self, reason: &str, attempt: u32) -> Option<DownloadOutcome> {
        if attempt > self.max_retries {
            Some(DownloadOutcome::PermanentFailure(format!(
                "retries exhausted after {} attempts: {}",
                attempt, reason
            )))
        } else {
            None
        }
    }
}
