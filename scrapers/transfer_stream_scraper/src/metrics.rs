use serde::Serialize;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FetchMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub bytes_received: u64,
    pub avg_response_time_ms: f64,
    pub rate_limiter_wait_ms: f64,
    pub last_error: Option<String>,
}

/// Shared counters for every request a fetcher issues. Cloning shares state.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<FetchMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request_start(&self) -> RequestTracker {
        RequestTracker {
            start_time: Instant::now(),
            collector: self.clone(),
        }
    }

    pub fn record_rate_limit_wait(&self, waited: Duration) {
        let mut metrics = self.lock();
        metrics.rate_limiter_wait_ms += waited.as_micros() as f64 / 1000.0;
    }

    pub fn snapshot(&self) -> FetchMetrics {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FetchMetrics> {
        self.metrics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct RequestTracker {
    start_time: Instant,
    collector: MetricsCollector,
}

impl RequestTracker {
    pub fn succeeded(self, bytes: usize) {
        let elapsed = self.start_time.elapsed();
        let mut metrics = self.collector.lock();
        metrics.successful_requests += 1;
        metrics.bytes_received += bytes as u64;
        Self::record(&mut metrics, elapsed);
    }

    pub fn failed(self, error: &str) {
        let elapsed = self.start_time.elapsed();
        let mut metrics = self.collector.lock();
        metrics.failed_requests += 1;
        metrics.last_error = Some(error.to_string());
        Self::record(&mut metrics, elapsed);
    }

    fn record(metrics: &mut FetchMetrics, elapsed: Duration) {
        metrics.total_requests += 1;
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        // Running mean over all requests.
        metrics.avg_response_time_ms +=
            (elapsed_ms - metrics.avg_response_time_ms) / metrics.total_requests as f64;
    }
}
