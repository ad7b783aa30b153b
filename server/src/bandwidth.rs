use crate::RECENT_WINDOW;
use crate::counters::CounterProvider;
use crate::error::Result;
use common::EventLog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthSample {
    pub timestamp: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// Polled bandwidth history: every call records one sample.
#[derive(Clone)]
pub struct BandwidthHistory {
    provider: Arc<dyn CounterProvider>,
    log: EventLog<BandwidthSample>,
}

impl BandwidthHistory {
    pub fn new(provider: Arc<dyn CounterProvider>, log: EventLog<BandwidthSample>) -> Self {
        Self { provider, log }
    }

    /// Take a fresh snapshot, append it, and return the latest window.
    /// Nothing is appended when the counters cannot be read.
    pub fn record(&self) -> Result<Vec<BandwidthSample>> {
        let counters = self.provider.snapshot()?;
        let sample = BandwidthSample {
            timestamp: common::local_timestamp(),
            bytes_sent: counters.bytes_sent,
            bytes_recv: counters.bytes_recv,
        };
        debug!(
            "Recording bandwidth sample: sent={} recv={}",
            sample.bytes_sent, sample.bytes_recv
        );
        Ok(self.log.append_and_recent(sample, RECENT_WINDOW))
    }

    pub fn recent(&self, n: usize) -> Vec<BandwidthSample> {
        self.log.recent(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::NetworkCounters;
    use crate::error::ServerError;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct SteppingProvider {
        calls: AtomicU64,
    }

    impl CounterProvider for SteppingProvider {
        fn snapshot(&self) -> Result<NetworkCounters> {
            let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
            Ok(NetworkCounters {
                bytes_sent: n * 100,
                bytes_recv: n * 1_000,
                ..NetworkCounters::default()
            })
        }
    }

    struct BrokenProvider;

    impl CounterProvider for BrokenProvider {
        fn snapshot(&self) -> Result<NetworkCounters> {
            Err(ServerError::Provider("unreadable".to_string()))
        }
    }

    fn history() -> BandwidthHistory {
        BandwidthHistory::new(
            Arc::new(SteppingProvider {
                calls: AtomicU64::new(0),
            }),
            EventLog::new(),
        )
    }

    #[test]
    fn first_record_returns_single_sample() {
        let history = history();
        let samples = history.record().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].bytes_sent, 100);
        assert_eq!(samples[0].bytes_recv, 1_000);
    }

    #[test]
    fn record_returns_last_ten_oldest_first() {
        let history = history();
        let mut last = Vec::new();
        for _ in 0..12 {
            last = history.record().unwrap();
        }
        assert_eq!(last.len(), 10);
        let sent: Vec<u64> = last.iter().map(|s| s.bytes_sent).collect();
        assert_eq!(sent, (3..=12).map(|n| n * 100).collect::<Vec<_>>());
    }

    #[test]
    fn provider_failure_appends_nothing() {
        let log = EventLog::new();
        let history = BandwidthHistory::new(Arc::new(BrokenProvider), log.clone());
        assert!(matches!(history.record(), Err(ServerError::Provider(_))));
        assert!(log.is_empty());
    }
}
