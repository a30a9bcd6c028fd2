use std::time::Duration;

use serde::Serialize;

/// Timing measurements for the competing concurrency paths.
///
/// Each field is overwritten independently by the operation that produced it;
/// absent measurements read as zero. The two parallel-fetch timings are kept
/// separate on purpose: they benchmark two aggregation patterns rather than
/// compute a single answer.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub parallel_all: Duration,
    pub parallel_settled: Duration,
    pub worker_time: Duration,
    pub main_thread_time: Duration,
}

impl PipelineMetrics {
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            parallel_all_ms: as_millis(self.parallel_all),
            parallel_settled_ms: as_millis(self.parallel_settled),
            worker_time_ms: as_millis(self.worker_time),
            main_thread_time_ms: as_millis(self.main_thread_time),
        }
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Millisecond view of the metrics, for display and JSON output
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub parallel_all_ms: f64,
    pub parallel_settled_ms: f64,
    pub worker_time_ms: f64,
    pub main_thread_time_ms: f64,
}
