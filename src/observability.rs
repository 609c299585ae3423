//! Logging setup and request counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "qrpages=info,tower_http=info";

/// Install the global `tracing` subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Outcome counters for `POST /generate-qr/`
#[derive(Debug, Default)]
pub struct Metrics {
    generated: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generated(&self) {
        self.generated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "generated", "Metric incremented");
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "rejected", "Metric incremented");
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            generated: self.generated.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub generated: u64,
    pub rejected: u64,
    pub failed: u64,
}
