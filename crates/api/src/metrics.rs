use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_analyses: AtomicUsize,
    successful_analyses: AtomicUsize,
    rejected_analyses: AtomicUsize,
    failed_analyses: AtomicUsize,

    // Timing (in microseconds), successful runs only
    total_analysis_time_us: AtomicU64,

    // Counts
    total_documents_retrieved: AtomicUsize,
    total_files_skipped: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_analyses: AtomicUsize::new(0),
            successful_analyses: AtomicUsize::new(0),
            rejected_analyses: AtomicUsize::new(0),
            failed_analyses: AtomicUsize::new(0),
            total_analysis_time_us: AtomicU64::new(0),
            total_documents_retrieved: AtomicUsize::new(0),
            total_files_skipped: AtomicUsize::new(0),
        })
    }

    pub fn record_success(&self, duration: Duration, retrieved: usize, skipped: usize) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        self.successful_analyses.fetch_add(1, Ordering::Relaxed);
        self.total_analysis_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_documents_retrieved.fetch_add(retrieved, Ordering::Relaxed);
        self.total_files_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    /// A run stopped by an input precondition.
    pub fn record_rejected(&self) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        self.rejected_analyses.fetch_add(1, Ordering::Relaxed);
    }

    /// A run stopped by a service, output or timeout failure.
    pub fn record_failure(&self) {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);
        self.failed_analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let successful = self.successful_analyses.load(Ordering::Relaxed);
        let total_us = self.total_analysis_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_analyses: self.total_analyses.load(Ordering::Relaxed),
            successful_analyses: successful,
            rejected_analyses: self.rejected_analyses.load(Ordering::Relaxed),
            failed_analyses: self.failed_analyses.load(Ordering::Relaxed),
            avg_analysis_time_ms: if successful > 0 {
                total_us / successful as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
            total_documents_retrieved: self.total_documents_retrieved.load(Ordering::Relaxed),
            total_files_skipped: self.total_files_skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_analyses: usize,
    pub successful_analyses: usize,
    pub rejected_analyses: usize,
    pub failed_analyses: usize,
    pub avg_analysis_time_ms: f64,
    pub total_documents_retrieved: usize,
    pub total_files_skipped: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
