//! Persistence-call trace capture
//!
//! The store records every statement it runs into a `QueryLog` while
//! capture is enabled. The profiler holds a clone of the same handle and
//! resets/drains it around each record.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One persistence-layer call captured while capture mode is on.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTrace {
    /// Statement text as sent to the store
    pub statement: String,
    /// Wall time spent in the call
    pub elapsed: Duration,
    /// Call site that issued the statement
    pub trace: String,
}

/// A shared, cloneable trace collector.
///
/// Clones share state. Recording is a no-op until `enable()` is called.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    enabled: Arc<AtomicBool>,
    entries: Arc<Mutex<Vec<QueryTrace>>>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn on capture for the rest of the run.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Append a trace if capture is enabled.
    pub fn record(&self, trace: QueryTrace) {
        if self.is_enabled() {
            self.entries.lock().unwrap().push(trace);
        }
    }

    /// Discard everything captured so far.
    pub fn reset(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Drain the captured traces in call order.
    pub fn take(&self) -> Vec<QueryTrace> {
        std::mem::take(&mut *self.entries.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(sql: &str) -> QueryTrace {
        QueryTrace {
            statement: sql.to_string(),
            elapsed: Duration::from_micros(5),
            trace: "test".to_string(),
        }
    }

    #[test]
    fn disabled_log_drops_traces() {
        let log = QueryLog::new();
        log.record(trace("SELECT 1"));
        assert!(log.is_empty());
    }

    #[test]
    fn enabled_log_keeps_call_order() {
        let log = QueryLog::new();
        log.enable();
        log.record(trace("SELECT 1"));
        log.record(trace("SELECT 2"));
        let taken = log.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].statement, "SELECT 1");
        assert!(log.is_empty());
    }

    #[test]
    fn cloned_log_shares_state() {
        let log = QueryLog::new();
        let clone = log.clone();
        clone.enable();
        log.record(trace("SELECT 1"));
        assert_eq!(clone.len(), 1);
        clone.reset();
        assert!(log.is_empty());
    }
}
