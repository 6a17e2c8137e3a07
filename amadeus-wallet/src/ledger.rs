//! Local record of transactions this session has initiated.
//!
//! The ledger tracks what this demo signed, independent of the node's own
//! record. Entries are keyed by transaction hash; status updates are no-ops
//! for unknown hashes because submission results may race with a cleared
//! ledger.

use std::sync::{Arc, RwLock};

use chrono::Local;

/// Lifecycle status of a locally tracked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Signed and recorded, submission outcome not yet known.
    Pending,
    /// Accepted by the node (or sign-only, for custom calls).
    Success,
    /// Submission failed; the entry stays in the ledger.
    Error,
}

impl TxStatus {
    /// Lowercase name, matching the reference UI's status strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A locally tracked transaction.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// Transaction hash assigned by the provider; unique at insertion time.
    pub hash: String,
    /// Human-readable description of what was signed.
    pub description: String,
    /// Current lifecycle status.
    pub status: TxStatus,
    /// Human-readable local time of creation.
    pub timestamp: String,
}

impl LedgerEntry {
    /// Create an entry timestamped now.
    #[must_use]
    pub fn new(hash: impl Into<String>, description: impl Into<String>, status: TxStatus) -> Self {
        Self {
            hash: hash.into(),
            description: description.into(),
            status,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Clone-shareable handle to the transaction ledger.
#[derive(Debug, Clone, Default)]
pub struct TransactionLedger {
    inner: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl TransactionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry at the front (newest first).
    pub fn add(&self, entry: LedgerEntry) {
        self.inner.write().expect("ledger lock").insert(0, entry);
    }

    /// Replace the status of every entry with the given hash.
    ///
    /// Unknown hashes are a no-op, not an error.
    pub fn update_status(&self, hash: &str, status: TxStatus) {
        let mut entries = self.inner.write().expect("ledger lock");
        for entry in entries.iter_mut().filter(|e| e.hash == hash) {
            entry.status = status;
        }
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.inner.write().expect("ledger lock").clear();
    }

    /// Snapshot of the entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.inner.read().expect("ledger lock").clone()
    }

    /// Number of tracked transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("ledger lock").len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Abbreviate a hash for display, e.g. `0xabcd...f00d`.
///
/// Hashes short enough to show in full are returned unchanged.
#[must_use]
pub fn format_hash(hash: &str, start_len: usize, end_len: usize) -> String {
    if hash.len() <= start_len + end_len {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..start_len], &hash[hash.len() - end_len..])
}
