//! Append-only bounded activity log shared across the session.
//!
//! The log is the user-visible event trail: every pipeline step and bridge
//! transition appends here. Entries are never mutated after the fact, only
//! appended and eventually evicted past the cap. Each append is also
//! mirrored to [`tracing`] at the matching level, the way the reference
//! front-end mirrored entries to the browser console.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Local;

/// Maximum number of retained entries; older entries are evicted silently.
pub const MAX_LOG_ENTRIES: usize = 200;

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Routine progress information.
    Info,
    /// A step completed successfully.
    Success,
    /// Something unexpected that did not abort the operation.
    Warning,
    /// A failure; every pipeline error produces at least one of these.
    Error,
}

impl LogLevel {
    /// Lowercase name, matching the reference UI's level strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A single timestamped log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Unique id, monotonic in generation order.
    pub id: u64,
    /// Human-readable local time of day.
    pub timestamp: String,
    /// Entry severity.
    pub level: LogLevel,
    /// The message text.
    pub message: String,
}

/// Clone-shareable handle to the bounded activity log.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: RwLock<VecDeque<LogEntry>>,
    next_id: AtomicU64,
}

impl ActivityLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the front, evicting past [`MAX_LOG_ENTRIES`].
    pub fn add(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Error => tracing::error!(target: "amadeus_wallet::activity", "{message}"),
            LogLevel::Warning => tracing::warn!(target: "amadeus_wallet::activity", "{message}"),
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(target: "amadeus_wallet::activity", "{message}");
            }
        }

        let entry = LogEntry {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        };
        let mut entries = self.inner.entries.write().expect("activity log lock");
        entries.push_front(entry);
        entries.truncate(MAX_LOG_ENTRIES);
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.inner.entries.write().expect("activity log lock").clear();
    }

    /// Snapshot of the entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner
            .entries
            .read()
            .expect("activity log lock")
            .iter()
            .cloned()
            .collect()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().expect("activity log lock").len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
