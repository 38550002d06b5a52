//! Counters for the running pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters updated by the pipeline threads.
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_captured: AtomicU64,
    frames_dropped: AtomicU64,
    inferences: AtomicU64,
    inference_failures: AtomicU64,
    last_latency_us: AtomicU64,
    total_latency_us: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_captured(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inference_completed(&self, latency: Duration) {
        let us = latency.as_micros().min(u64::MAX as u128) as u64;
        self.last_latency_us.store(us, Ordering::Relaxed);
        self.total_latency_us.fetch_add(us, Ordering::Relaxed);
        self.inferences.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inference_failed(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        for counter in [
            &self.frames_captured,
            &self.frames_dropped,
            &self.inferences,
            &self.inference_failures,
            &self.last_latency_us,
            &self.total_latency_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inferences = self.inferences.load(Ordering::Relaxed);
        let (last, average) = if inferences == 0 {
            (None, None)
        } else {
            let total = self.total_latency_us.load(Ordering::Relaxed);
            (
                Some(Duration::from_micros(
                    self.last_latency_us.load(Ordering::Relaxed),
                )),
                Some(Duration::from_micros(total / inferences)),
            )
        };
        StatsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            inferences,
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            last_latency: last,
            average_latency: average,
        }
    }
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub inferences: u64,
    pub inference_failures: u64,
    pub last_latency: Option<Duration>,
    pub average_latency: Option<Duration>,
}
