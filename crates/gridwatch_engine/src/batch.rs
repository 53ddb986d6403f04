//! Bounded-concurrency weather loading.
//!
//! Cities are fetched in consecutive groups of `group_size`. All fetches of a
//! group run concurrently and the whole group settles before the next one
//! starts, so at most `group_size` requests are ever in flight against the
//! rate-limited upstream.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use gridwatch_core::{BatchProgress, CityEntity};
use gridwatch_logging::{gw_debug, gw_error, gw_info, gw_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::fetch::WeatherLookup;
use crate::{BatchEvent, BatchReport, CityResult, FailureKind, FetchOutcome};

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub group_size: usize,
    pub group_pause: Duration,
    /// Upper bound for a single lookup; a hung request becomes a timeout failure.
    pub fetch_timeout: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            group_size: 5,
            group_pause: Duration::from_millis(1000),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: BatchEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<BatchEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<BatchEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: BatchEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn record(&self, success: bool, total: usize) -> BatchProgress {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let processed = self.processed.fetch_add(1, Ordering::AcqRel) + 1;
        BatchProgress {
            total,
            processed,
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn snapshot(&self, total: usize) -> BatchProgress {
        BatchProgress {
            total,
            processed: self.processed.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct BatchFetcher {
    lookup: Arc<dyn WeatherLookup>,
    settings: BatchSettings,
}

impl BatchFetcher {
    pub fn new(lookup: Arc<dyn WeatherLookup>, settings: BatchSettings) -> Self {
        Self { lookup, settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Loads every city, group by group. Per-city failures are recorded in
    /// the report and never stop the batch; cancellation stops it at the next
    /// suspension point and drops the fetches still in flight. Cities that
    /// settled before the cancellation stay in the report.
    pub async fn run(
        &self,
        cities: &[CityEntity],
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = cities.len();
        let group_size = self.settings.group_size.max(1);
        let group_count = total.div_ceil(group_size);
        let counters = Counters::default();
        let mut results = Vec::with_capacity(total);

        gw_info!(
            "Loading weather for {} cities in {} groups of up to {}",
            total,
            group_count,
            group_size
        );

        for (group_index, group) in cities.chunks(group_size).enumerate() {
            let counters = &counters;
            let mut pending: FuturesUnordered<_> = group
                .iter()
                .enumerate()
                .map(|(offset, city)| {
                    let index = group_index * group_size + offset;
                    async move { (index, self.fetch_one(index, city, total, counters, sink).await) }
                })
                .collect();

            // A cancelled report holds every city already counted in its progress.
            let mut settled = Vec::with_capacity(group.len());
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        drop(pending);
                        append_in_order(&mut results, settled);
                        return cancelled_report(results, counters.snapshot(total), sink);
                    }
                    next = pending.next() => match next {
                        Some(result) => settled.push(result),
                        None => break,
                    },
                }
            }
            append_in_order(&mut results, settled);

            let is_last = group_index + 1 == group_count;
            if !is_last && !self.settings.group_pause.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return cancelled_report(results, counters.snapshot(total), sink);
                    }
                    _ = tokio::time::sleep(self.settings.group_pause) => {}
                }
            }
        }

        let progress = counters.snapshot(total);
        gw_info!(
            "Weather load finished: {} ok, {} failed",
            progress.succeeded,
            progress.failed
        );
        sink.emit(BatchEvent::Completed(progress));
        BatchReport {
            results,
            progress,
            cancelled: false,
        }
    }

    async fn fetch_one(
        &self,
        index: usize,
        city: &CityEntity,
        total: usize,
        counters: &Counters,
        sink: &dyn ProgressSink,
    ) -> CityResult {
        let lookup = self.lookup.current_weather(city);
        let outcome: FetchOutcome =
            match tokio::time::timeout(self.settings.fetch_timeout, lookup).await {
                Ok(Ok(record)) => Ok(record),
                Ok(Err(err)) => {
                    gw_warn!("Skipping {} - lookup failed: {}", city.label(), err);
                    Err(err.kind)
                }
                Err(_) => {
                    gw_warn!(
                        "Skipping {} - no answer within {:?}",
                        city.label(),
                        self.settings.fetch_timeout
                    );
                    Err(FailureKind::Timeout)
                }
            };

        let progress = counters.record(outcome.is_ok(), total);
        sink.emit(BatchEvent::CitySettled {
            index,
            city: city.clone(),
            outcome: outcome.clone(),
            progress,
        });
        CityResult {
            city: city.clone(),
            outcome,
        }
    }
}

fn append_in_order(results: &mut Vec<CityResult>, mut settled: Vec<(usize, CityResult)>) {
    settled.sort_unstable_by_key(|(index, _)| *index);
    results.extend(settled.into_iter().map(|(_, result)| result));
}

fn cancelled_report(
    results: Vec<CityResult>,
    progress: BatchProgress,
    sink: &dyn ProgressSink,
) -> BatchReport {
    gw_info!(
        "Weather load cancelled after {}/{} cities",
        progress.processed,
        progress.total
    );
    sink.emit(BatchEvent::Cancelled(progress));
    BatchReport {
        results,
        progress,
        cancelled: true,
    }
}

/// Runs weather loads as sessions. Starting a new load abandons the previous
/// one: its in-flight fetches are cancelled and anything it still emits is
/// discarded.
pub struct WeatherLoader {
    fetcher: Arc<BatchFetcher>,
    generation: Arc<AtomicU64>,
    current: Mutex<Option<CancellationToken>>,
}

impl WeatherLoader {
    pub fn new(lookup: Arc<dyn WeatherLookup>, settings: BatchSettings) -> Self {
        Self {
            fetcher: Arc::new(BatchFetcher::new(lookup, settings)),
            generation: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
        }
    }

    /// Starts loading `cities` on the current tokio runtime.
    pub fn begin(&self, cities: Vec<CityEntity>) -> LoadSession {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(cancel.clone());
        if let Some(previous) = previous {
            gw_debug!("Abandoning weather load {}", generation - 1);
            previous.cancel();
        }

        let (tx, events) = mpsc::unbounded_channel();
        let sink = SessionSink {
            generation,
            current: Arc::clone(&self.generation),
            inner: ChannelProgressSink::new(tx),
        };
        let total = cities.len();
        let fetcher = Arc::clone(&self.fetcher);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { fetcher.run(&cities, &sink, &task_cancel).await });

        LoadSession {
            generation,
            total,
            events,
            cancel,
            task: Some(task),
            report: None,
        }
    }

    /// Cancels the running load, if any.
    pub fn cancel(&self) {
        if let Some(current) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            current.cancel();
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

struct SessionSink {
    generation: u64,
    current: Arc<AtomicU64>,
    inner: ChannelProgressSink,
}

impl ProgressSink for SessionSink {
    fn emit(&self, event: BatchEvent) {
        if self.current.load(Ordering::Acquire) != self.generation {
            gw_debug!("Dropping event from abandoned weather load {}", self.generation);
            return;
        }
        self.inner.emit(event);
    }
}

/// One running load. Dropping the session cancels it.
pub struct LoadSession {
    generation: u64,
    total: usize,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<BatchReport>>,
    report: Option<BatchReport>,
}

impl LoadSession {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Next progress event; `None` once the load has ended or was abandoned.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the load to end and returns its report. Later calls return
    /// the same report.
    pub async fn finish(&mut self) -> BatchReport {
        if let Some(report) = &self.report {
            return report.clone();
        }
        let report = match self.task.take() {
            Some(task) => match task.await {
                Ok(report) => report,
                Err(err) => {
                    gw_error!("Weather load {} failed to run: {}", self.generation, err);
                    self.empty_report()
                }
            },
            None => self.empty_report(),
        };
        self.report = Some(report.clone());
        report
    }

    fn empty_report(&self) -> BatchReport {
        BatchReport {
            results: Vec::new(),
            progress: BatchProgress::new(self.total),
            cancelled: true,
        }
    }
}

impl Drop for LoadSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
