//! Instrumentation collected during table layout passes.

use std::time::{Duration, Instant};

/// Counters and timings for one layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutMetrics {
    /// Rows whose preferred height and children were laid out
    pub rows_laid_out: usize,

    /// Rows rebound to a different item (recycled)
    pub rows_rebound: usize,

    /// Dirty markers attached to a row
    pub markers_attached: usize,

    /// Dirty markers detached from a row
    pub markers_detached: usize,

    /// Expansion contents attached to a row
    pub contents_attached: usize,

    /// Expansion contents detached from a row
    pub contents_detached: usize,

    /// Cells whose row index no longer addressed an item
    pub stale_indices: usize,

    /// Child-list batches applied to rows
    pub child_batches: usize,

    /// Wall time of the pass
    pub layout_time: Duration,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the pass changed no row's child list.
    pub fn is_stable(&self) -> bool {
        self.child_batches == 0
    }

    /// Format metrics as a single log line.
    pub fn format_summary(&self) -> String {
        format!(
            "Layout: {:.2}ms | rows {} ({} rebound) | markers +{} -{} | content +{} -{} | stale {} | batches {}",
            self.layout_time.as_secs_f64() * 1000.0,
            self.rows_laid_out,
            self.rows_rebound,
            self.markers_attached,
            self.markers_detached,
            self.contents_attached,
            self.contents_detached,
            self.stale_indices,
            self.child_batches,
        )
    }
}

/// Helper for timing a section of a pass.
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_pass() {
        let mut metrics = LayoutMetrics::new();
        assert!(metrics.is_stable());
        metrics.child_batches = 1;
        assert!(!metrics.is_stable());
    }

    #[test]
    fn test_summary_mentions_counts() {
        let metrics = LayoutMetrics {
            markers_attached: 2,
            stale_indices: 1,
            ..Default::default()
        };
        let summary = metrics.format_summary();
        assert!(summary.contains("markers +2 -0"));
        assert!(summary.contains("stale 1"));
    }
}
