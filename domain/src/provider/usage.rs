//! Cumulative usage counters for providers and models.

use serde::{Deserialize, Serialize};

/// Request/token totals plus a rolling average latency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageCounters {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    /// Rolling average wall-clock latency in milliseconds.
    pub avg_latency_ms: f64,
}

impl UsageCounters {
    /// Fold one completed request into the totals.
    pub fn record(&mut self, prompt_tokens: u64, completion_tokens: u64, latency_ms: u64) {
        self.requests += 1;
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        // Incremental mean: avg += (sample - avg) / n
        self.avg_latency_ms += (latency_ms as f64 - self.avg_latency_ms) / self.requests as f64;
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates_totals() {
        let mut usage = UsageCounters::default();
        usage.record(100, 50, 200);
        usage.record(30, 20, 400);
        assert_eq!(usage.requests, 2);
        assert_eq!(usage.prompt_tokens, 130);
        assert_eq!(usage.completion_tokens, 70);
        assert_eq!(usage.total_tokens(), 200);
    }

    #[test]
    fn test_rolling_average_latency() {
        let mut usage = UsageCounters::default();
        usage.record(0, 0, 100);
        assert_eq!(usage.avg_latency_ms, 100.0);
        usage.record(0, 0, 300);
        assert_eq!(usage.avg_latency_ms, 200.0);
        usage.record(0, 0, 200);
        assert_eq!(usage.avg_latency_ms, 200.0);
    }
}
