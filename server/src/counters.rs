use crate::config::CounterSource;
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use sysinfo::Networks;
use tracing::debug;

const PROC_NET_DEV: &str = "/proc/net/dev";

/// Host-wide cumulative interface counters, summed over every interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
}

impl NetworkCounters {
    fn accumulate(&mut self, other: &NetworkCounters) {
        self.bytes_sent = self.bytes_sent.saturating_add(other.bytes_sent);
        self.bytes_recv = self.bytes_recv.saturating_add(other.bytes_recv);
        self.packets_sent = self.packets_sent.saturating_add(other.packets_sent);
        self.packets_recv = self.packets_recv.saturating_add(other.packets_recv);
        self.errin = self.errin.saturating_add(other.errin);
        self.errout = self.errout.saturating_add(other.errout);
        self.dropin = self.dropin.saturating_add(other.dropin);
        self.dropout = self.dropout.saturating_add(other.dropout);
    }
}

/// Point-in-time source of network counters.
pub trait CounterProvider: Send + Sync {
    fn snapshot(&self) -> Result<NetworkCounters>;
}

/// Reads the kernel's per-interface table.
pub struct ProcNetDevProvider {
    path: PathBuf,
}

impl ProcNetDevProvider {
    pub fn new() -> Self {
        Self::with_path(PROC_NET_DEV)
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcNetDevProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterProvider for ProcNetDevProvider {
    fn snapshot(&self) -> Result<NetworkCounters> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ServerError::Provider(format!("failed to read {}: {e}", self.path.display()))
        })?;
        Ok(parse_proc_net_dev(&content))
    }
}

/// Sums every interface row of a `/proc/net/dev` dump.
///
/// Receive columns 0..=3 are bytes, packets, errs, drop; transmit columns
/// 8..=11 follow the same order. Header and malformed rows are skipped.
pub fn parse_proc_net_dev(content: &str) -> NetworkCounters {
    let mut total = NetworkCounters::default();

    for line in content.lines() {
        let Some((iface, stats)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<u64> = stats
            .split_whitespace()
            .filter_map(|s| s.parse::<u64>().ok())
            .collect();
        if fields.len() < 16 {
            debug!("Skipping malformed /proc/net/dev row for {}", iface.trim());
            continue;
        }

        total.accumulate(&NetworkCounters {
            bytes_recv: fields[0],
            packets_recv: fields[1],
            errin: fields[2],
            dropin: fields[3],
            bytes_sent: fields[8],
            packets_sent: fields[9],
            errout: fields[10],
            dropout: fields[11],
        });
    }

    total
}

/// Portable provider. `sysinfo` has no drop counters, so those stay 0.
pub struct SysinfoProvider;

impl CounterProvider for SysinfoProvider {
    fn snapshot(&self) -> Result<NetworkCounters> {
        let networks = Networks::new_with_refreshed_list();
        let mut total = NetworkCounters::default();
        for (_interface_name, data) in &networks {
            total.accumulate(&NetworkCounters {
                bytes_sent: data.total_transmitted(),
                bytes_recv: data.total_received(),
                packets_sent: data.total_packets_transmitted(),
                packets_recv: data.total_packets_received(),
                errin: data.total_errors_on_received(),
                errout: data.total_errors_on_transmitted(),
                dropin: 0,
                dropout: 0,
            });
        }
        Ok(total)
    }
}

pub fn provider_for(source: CounterSource) -> Arc<dyn CounterProvider> {
    match source {
        CounterSource::Procfs => Arc::new(ProcNetDevProvider::new()),
        CounterSource::Sysinfo => Arc::new(SysinfoProvider),
        CounterSource::Auto if cfg!(target_os = "linux") => Arc::new(ProcNetDevProvider::new()),
        CounterSource::Auto => Arc::new(SysinfoProvider),
    }
}
