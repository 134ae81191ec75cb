//! Request metrics and statistics tracking for the prediction service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for served predictions
pub struct ServiceMetrics {
    /// Total requests served successfully
    pub requests_served: AtomicU64,
    /// Total requests that failed (validation or inference)
    pub requests_failed: AtomicU64,
    /// Request handling times (in microseconds)
    latencies_us: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_served: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            latencies_us: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully served request
    pub fn record_request(&self, elapsed: Duration) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies_us.write() {
            latencies.push(elapsed.as_micros() as u64);
            // Keep only recent samples for memory efficiency
            if latencies.len() > 10000 {
                latencies.drain(0..5000);
            }
        }
    }

    /// Record a failed request
    pub fn record_error(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get request latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let latencies = self.latencies_us.read().unwrap();
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = latencies.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.requests_served.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();

        info!(
            served = served,
            failed = failed,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Service metrics"
        );
        if latency.count > 0 {
            info!(
                mean_us = latency.mean_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                p99_us = latency.p99_us,
                max_us = latency.max_us,
                "Request latency"
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that prints metric summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
