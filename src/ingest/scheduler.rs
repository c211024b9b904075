// src/ingest/scheduler.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ingest::observe::{IngestObserver, NoopObserver};
use crate::ingest::types::{FetchError, Item, SnapshotSource};
use crate::ingest::writer::{CacheWriter, PutOutcome};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(20);

struct Slot {
    source: Arc<dyn SnapshotSource>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the fetch task ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub launched: usize,
    /// Sources skipped because their previous fetch had not finished.
    pub skipped: usize,
    /// Items that reached the writer.
    pub delivered: usize,
    pub stored: usize,
}

/// Fans fetches out on every tick and funnels the resulting items through a
/// single channel into the [`CacheWriter`].
pub struct Scheduler {
    slots: Vec<Slot>,
    writer: Arc<CacheWriter>,
    observer: Arc<dyn IngestObserver>,
    period: Duration,
    fetch_timeout: Option<Duration>,
}

impl Scheduler {
    pub fn new(sources: Vec<Arc<dyn SnapshotSource>>, writer: Arc<CacheWriter>) -> Self {
        let slots = sources
            .into_iter()
            .map(|source| Slot {
                source,
                in_flight: Arc::new(AtomicBool::new(false)),
            })
            .collect();
        Self {
            slots,
            writer,
            observer: Arc::new(NoopObserver),
            period: DEFAULT_PERIOD,
            fetch_timeout: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn IngestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Deadline for a single fetch. Defaults to the period, so a hung
    /// request releases its feed by the next tick.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
            .unwrap_or(self.period)
            .max(Duration::from_millis(1))
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.source.name()).collect()
    }

    fn channel_capacity(&self) -> usize {
        self.slots.len().max(1)
    }

    /// Launch one task per idle source. Returns (launched, skipped).
    fn dispatch(&self, tx: &mpsc::Sender<Item>, cancel: &CancellationToken) -> (usize, usize) {
        self.observer.cycle_started();
        let (mut launched, mut skipped) = (0, 0);
        let deadline = self.fetch_timeout();

        for slot in &self.slots {
            let name = slot.source.name();
            if slot.in_flight.swap(true, Ordering::AcqRel) {
                tracing::debug!(target: "ingest", source = name, "previous fetch still running, skipping");
                self.observer.fetch_skipped(name);
                skipped += 1;
                continue;
            }

            let guard = InFlightGuard(slot.in_flight.clone());
            let source = slot.source.clone();
            let observer = self.observer.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let _guard = guard;
                let res = tokio::select! {
                    _ = cancel.cancelled() => None,
                    r = tokio::time::timeout(deadline, source.fetch()) => Some(
                        r.unwrap_or_else(|_| Err(FetchError::Timeout { feed: name, after: deadline })),
                    ),
                };
                match res {
                    Some(Ok(item)) => {
                        observer.fetch_succeeded(name, &item.key);
                        // Receiver only goes away once the scheduler is gone.
                        let _ = tx.send(item).await;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            target: "ingest",
                            source = name,
                            kind = e.kind(),
                            error = %e,
                            "fetch failed"
                        );
                        observer.fetch_failed(name, &e);
                    }
                    None => {
                        tracing::debug!(target: "ingest", source = name, "fetch cancelled");
                    }
                }
            });
            launched += 1;
        }

        (launched, skipped)
    }

    /// Run one fan-out/fan-in cycle to completion.
    pub async fn run_cycle(&self) -> CycleReport {
        let (tx, mut rx) = mpsc::channel(self.channel_capacity());
        let (launched, skipped) = self.dispatch(&tx, &CancellationToken::new());
        drop(tx);

        let mut report = CycleReport {
            launched,
            skipped,
            ..CycleReport::default()
        };
        while let Some(item) = rx.recv().await {
            report.delivered += 1;
            if self.writer.put_item(&item).await == PutOutcome::Stored {
                report.stored += 1;
            }
        }
        tracing::info!(
            target: "ingest",
            launched = report.launched,
            skipped = report.skipped,
            delivered = report.delivered,
            stored = report.stored,
            "ingest cycle finished"
        );
        report
    }

    /// Tick every `period` until `cancel` fires. The first tick is immediate.
    ///
    /// On cancellation no new fetches start, in-flight fetches are abandoned,
    /// and items already produced are still written before returning.
    pub async fn run(&self, cancel: CancellationToken) {
        let (tx, mut rx) = mpsc::channel(self.channel_capacity());
        // interval() panics on a zero period.
        let mut ticker = tokio::time::interval(self.period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            target: "ingest",
            period_secs = self.period.as_secs_f64(),
            sources = ?self.source_names(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let (launched, skipped) = self.dispatch(&tx, &cancel);
                    tracing::debug!(target: "ingest", launched, skipped, "tick");
                }
                Some(item) = rx.recv() => {
                    self.writer.put_item(&item).await;
                }
            }
        }

        drop(tx);
        let mut drained = 0usize;
        while let Some(item) = rx.recv().await {
            self.writer.put_item(&item).await;
            drained += 1;
        }
        tracing::info!(target: "ingest", drained, "scheduler stopped");
    }
}
