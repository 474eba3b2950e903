use super::logging_models::{LogEntry, LogFilter, LogKind};
use crate::core::clock::Clock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// How many entries the registry keeps unless told otherwise.
pub const DEFAULT_LOG_RETENTION: usize = 100;

/// Append-only, bounded event log backing the dashboard's log page.
///
/// Entries are kept in insertion order, which is also chronological order
/// because every timestamp comes from the registry's own clock at append
/// time. Once `capacity` is reached the oldest entry is dropped.
pub struct LogRegistry {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl LogRegistry {
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            clock,
        }
    }

    // A panic while holding the lock can't leave the deque half-written, so
    // a poisoned lock is still safe to use.
    fn entries(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, entry: LogEntry) {
        let mut entries = self.entries();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Timestamp and append an entry in one go.
    pub fn record(&self, kind: LogKind, guild_id: Option<u64>, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(kind = %kind, ?guild_id, "{}", message);
        self.append(LogEntry {
            timestamp: self.clock.now(),
            kind,
            message,
            guild_id,
        });
    }

    /// Entries oldest-first. With `guild_id` set, only that guild's entries and
    /// entries that aren't tied to any guild are returned.
    pub fn list(&self, filter: LogFilter, guild_id: Option<u64>) -> Vec<LogEntry> {
        self.entries()
            .iter()
            .filter(|e| filter.matches(e))
            .filter(|e| match guild_id {
                Some(id) => e.guild_id.is_none() || e.guild_id == Some(id),
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }
}
