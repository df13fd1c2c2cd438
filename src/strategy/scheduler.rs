//! Periodic driver for alignment cycles.

use super::cycle::AlignmentCycle;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Runs one cycle immediately, then one per interval, until shut down.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Drive `cycle` until `shutdown` turns true or its sender is dropped.
    ///
    /// Cycles run back to back on this task, never concurrently. Ticks
    /// missed while a cycle overruns are skipped rather than queued. A cycle
    /// in flight starts no further step once shutdown is observed, and no
    /// new cycle starts. Returns the number of cycles run.
    pub async fn run(&self, cycle: &mut AlignmentCycle, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = 0u64;

        info!(
            instance = %cycle.instance_id(),
            interval_secs = self.interval.as_secs(),
            "Alignment scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown sender dropped, stopping scheduler");
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            if *shutdown.borrow() {
                break;
            }

            let report = cycle.run_until(&shutdown).await;
            cycles += 1;
            info!(
                cycle = cycles,
                outcome = ?report.outcome,
                planned = report.planned.len(),
                submitted = report.submitted.len(),
                "Alignment cycle finished"
            );
        }

        info!(cycles, "Alignment scheduler stopped");
        cycles
    }

    /// Run the scheduler as the single background task owning `cycle`.
    pub fn spawn(self, mut cycle: AlignmentCycle, shutdown: watch::Receiver<bool>) -> JoinHandle<u64> {
        tokio::spawn(async move { self.run(&mut cycle, shutdown).await })
    }
}
