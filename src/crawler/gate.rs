//! Per-host politeness gate
//!
//! Enforces a minimum interval between requests to the same host. The
//! single-threaded engine awaits the gate before every fetch; a future
//! worker-pool variant can share one gate per host and keep the same
//! guarantee without a global sleep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Interval scheduler keyed by host
pub struct HostGate {
    interval: Duration,
    last_request: HashMap<String, Instant>,
}

impl HostGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: HashMap::new(),
        }
    }

    /// Waits until the host's interval has elapsed, then claims the slot
    pub async fn wait(&mut self, host: &str) {
        if let Some(last) = self.last_request.get(host) {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last_request.insert(host.to_string(), Instant::now());
    }

    /// Time remaining before the host accepts another request
    pub fn time_until_ready(&self, host: &str) -> Duration {
        self.last_request
            .get(host)
            .map(|last| self.interval.saturating_sub(last.elapsed()))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let mut gate = HostGate::new(Duration::from_secs(10));
        let start = Instant::now();
        gate.wait("example.com").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let mut gate = HostGate::new(Duration::from_millis(50));
        gate.wait("example.com").await;

        let start = Instant::now();
        gate.wait("example.com").await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_hosts_are_independent() {
        let mut gate = HostGate::new(Duration::from_secs(10));
        gate.wait("a.com").await;

        let start = Instant::now();
        gate.wait("b.com").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_time_until_ready() {
        let gate = HostGate::new(Duration::from_secs(1));
        assert_eq!(gate.time_until_ready("new.com"), Duration::ZERO);
    }
}
