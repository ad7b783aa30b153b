use common::EventLog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The closed set of simulated event kinds, in draw order.
pub const EVENT_TYPES: [&str; 4] = [
    "Failed login attempt",
    "Unauthorized access attempt",
    "Suspicious IP detected",
    "Brute force attack detected",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub timestamp: String,
    pub event: String,
    pub severity: Severity,
}

/// Produces security events. The random source stands in for a real
/// telemetry pipeline.
pub trait SecurityEventSource: Send + Sync {
    fn next_event(&self) -> SecurityEvent;
}

/// Uniform, independent draws over [`EVENT_TYPES`] and [`Severity::ALL`].
pub struct RandomEventSource;

impl SecurityEventSource for RandomEventSource {
    fn next_event(&self) -> SecurityEvent {
        use rand::prelude::*;
        let mut rng = rand::rng();
        let event = EVENT_TYPES
            .choose(&mut rng)
            .copied()
            .unwrap_or(EVENT_TYPES[0]);
        let severity = Severity::ALL
            .choose(&mut rng)
            .copied()
            .unwrap_or(Severity::Low);

        SecurityEvent {
            timestamp: common::local_timestamp(),
            event: event.to_string(),
            severity,
        }
    }
}

#[derive(Clone)]
pub struct SecurityFeed {
    source: Arc<dyn SecurityEventSource>,
    log: EventLog<SecurityEvent>,
}

impl SecurityFeed {
    pub fn new(source: Arc<dyn SecurityEventSource>, log: EventLog<SecurityEvent>) -> Self {
        Self { source, log }
    }

    pub fn simulated(log: EventLog<SecurityEvent>) -> Self {
        Self::new(Arc::new(RandomEventSource), log)
    }

    /// Draw one event, append it, and hand back the appended value.
    pub fn generate_event(&self) -> SecurityEvent {
        let event = self.source.next_event();
        debug!("Generated security event: {} ({})", event.event, event.severity);
        self.log.append(event.clone());
        event
    }

    /// Draw one event and return the latest `n` entries, which always end
    /// with the event just drawn.
    pub fn generate_recent(&self, n: usize) -> Vec<SecurityEvent> {
        let event = self.source.next_event();
        debug!("Generated security event: {} ({})", event.event, event.severity);
        self.log.append_and_recent(event, n)
    }

    pub fn recent(&self, n: usize) -> Vec<SecurityEvent> {
        self.log.recent(n)
    }
}
