//! Operator-facing log of every request issued by a client.
//!
//! Entries are written regardless of outcome and are only ever displayed;
//! nothing in the search or media logic reads them back.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Default number of entries retained before the oldest are dropped.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// A single logged request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLogEntry {
    pub at: DateTime<Utc>,
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestLogEntry {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            at: Utc::now(),
            method: method.to_string(),
            url: url.to_string(),
            params: None,
            body: None,
        }
    }
}

impl fmt::Display for RequestLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-> Request: {} {}", self.method, self.url)?;
        if let Some(params) = &self.params {
            let pretty = serde_json::to_string_pretty(params).map_err(|_| fmt::Error)?;
            writeln!(f, "   Params: {}", pretty)?;
        }
        if let Some(body) = &self.body {
            let pretty = serde_json::to_string_pretty(body).map_err(|_| fmt::Error)?;
            writeln!(f, "   JSON Body:\n{}", pretty)?;
        }
        Ok(())
    }
}

/// Shared, bounded request log. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct RequestLog {
    entries: Arc<Mutex<VecDeque<RequestLogEntry>>>,
    capacity: usize,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RequestLogEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, entry: RequestLogEntry) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of the current entries, oldest first.
    pub fn entries(&self) -> Vec<RequestLogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new()
    }
}
