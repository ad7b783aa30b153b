use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Entries kept in memory when no explicit retention is configured.
pub const DEFAULT_RETENTION: usize = 1_000;

/// Append-only, in-memory history that only exposes a last-N view.
///
/// Clones share the same sequence. The backing store is capped at a rolling
/// retention window; the oldest entry is dropped once the cap is reached.
#[derive(Clone)]
pub struct EventLog<T> {
    inner: Arc<Mutex<EventLogInner<T>>>,
}

struct EventLogInner<T> {
    entries: VecDeque<T>,
    retention: usize,
}

impl<T: Clone> EventLog<T> {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// A zero retention would make every append vanish, so it is raised to 1.
    pub fn with_retention(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            inner: Arc::new(Mutex::new(EventLogInner {
                entries: VecDeque::with_capacity(retention.min(DEFAULT_RETENTION)),
                retention,
            })),
        }
    }

    pub fn append(&self, entry: T) {
        self.inner.lock().push(entry);
    }

    /// The last `min(n, len)` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<T> {
        self.inner.lock().tail(n)
    }

    /// Append and read the last `n` under one lock, so the returned view
    /// always ends with `entry` even while other callers append.
    pub fn append_and_recent(&self, entry: T, n: usize) -> Vec<T> {
        let mut inner = self.inner.lock();
        inner.push(entry);
        inner.tail(n)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Maximum number of entries kept in memory.
    pub fn capacity(&self) -> usize {
        self.inner.lock().retention
    }
}

impl<T: Clone> EventLogInner<T> {
    fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.retention {
            self.entries.pop_front();
        }
    }

    fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

impl<T: Clone> Default for EventLog<T> {
    fn default() -> Self {
        Self::new()
    }
}
