//! Standardized metrics for the offloading controller

use crate::LATENCY_BUCKETS;
use offload_core::{OffloadObserver, Venue};
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, IntCounter, Opts};
use std::time::Duration;

/// Per-venue offloading metrics
#[derive(Debug, Clone)]
pub struct OffloadMetrics {
    /// Recorded executions per venue
    pub decisions_total: CounterVec,

    /// Measured execution latency per venue
    pub execution_seconds: HistogramVec,

    /// Current history length per venue
    pub history_size: GaugeVec,

    /// Keyword occurrences in canonical results
    pub keyword_hits_total: IntCounter,
}

impl OffloadMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let metrics = Self {
            decisions_total: CounterVec::new(
                Opts::new(
                    "edge_offload_decisions_total",
                    "Executions recorded per venue",
                ),
                &["venue"],
            )?,
            execution_seconds: HistogramVec::new(
                HistogramOpts::new(
                    "edge_offload_execution_seconds",
                    "Measured execution latency per venue",
                )
                .buckets(LATENCY_BUCKETS.to_vec()),
                &["venue"],
            )?,
            history_size: GaugeVec::new(
                Opts::new(
                    "edge_offload_history_size",
                    "Samples currently retained per venue",
                ),
                &["venue"],
            )?,
            keyword_hits_total: IntCounter::new(
                "edge_offload_keyword_hits_total",
                "Keyword occurrences found in canonical results",
            )?,
        };

        // Expose every venue series from the start
        for venue in Venue::ALL {
            metrics.decisions_total.with_label_values(&[venue.as_str()]);
            metrics.history_size.with_label_values(&[venue.as_str()]);
        }

        Ok(metrics)
    }

    /// Register all metrics with the given registry
    pub fn register(&self, registry: &prometheus::Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.decisions_total.clone()))?;
        registry.register(Box::new(self.execution_seconds.clone()))?;
        registry.register(Box::new(self.history_size.clone()))?;
        registry.register(Box::new(self.keyword_hits_total.clone()))?;
        Ok(())
    }

    /// Count keyword occurrences in a canonical result
    pub fn record_keyword_hits(&self, hits: u64) {
        if hits > 0 {
            self.keyword_hits_total.inc_by(hits);
        }
    }

    pub fn decisions(&self, venue: Venue) -> f64 {
        self.decisions_total.with_label_values(&[venue.as_str()]).get()
    }

    pub fn history_len(&self, venue: Venue) -> f64 {
        self.history_size.with_label_values(&[venue.as_str()]).get()
    }
}

impl OffloadObserver for OffloadMetrics {
    fn observe_record(&self, venue: Venue, latency: Duration, history_len: usize) {
        let label = [venue.as_str()];
        self.decisions_total.with_label_values(&label).inc();
        self.execution_seconds
            .with_label_values(&label)
            .observe(latency.as_secs_f64());
        self.history_size
            .with_label_values(&label)
            .set(history_len as f64);
    }
}
