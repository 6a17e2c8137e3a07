//! Integration core for the Amadeus browser wallet.
//!
//! This crate implements the non-UI half of the Amadeus wallet demo: it
//! tracks an externally-injected wallet provider, signs token transfers and
//! arbitrary contract calls through it, and submits the resulting packed
//! payloads to an Amadeus node over HTTP.
//!
//! # Architecture
//!
//! ```text
//! WalletSession (command surface)
//!   ├── ProviderBridge   → WalletProvider (injected capability)
//!   │     └── WalletState published via tokio::sync::watch
//!   ├── SubmissionClient → POST {endpoint}/tx/submit
//!   ├── ActivityLog      → bounded, newest-first event log
//!   └── TransactionLedger → local record of signed transactions
//! ```
//!
//! The wallet provider itself is an external collaborator. It is consumed
//! through the [`WalletProvider`] trait and handed in through a
//! [`ProviderSource`], so the whole pipeline runs against a substitute
//! implementation in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use amadeus_wallet::{ProviderSource, WalletSession};
//!
//! let session = WalletSession::new(source);
//! session.start().await;
//!
//! session.connect().await?;
//! session.transfer("", "1.5", None).await?;
//! ```

pub mod amount;
pub mod bridge;
pub mod error;
pub mod ledger;
pub mod log;
pub mod provider;
pub mod session;
pub mod submit;

pub use amount::{AMA_DECIMALS, from_atomic_units, to_atomic_units};
pub use bridge::{ProviderBridge, ProviderStatus, REFRESH_INTERVAL, WalletState};
pub use error::{Error, Result};
pub use ledger::{LedgerEntry, TransactionLedger, TxStatus, format_hash};
pub use log::{ActivityLog, LogEntry, LogLevel, MAX_LOG_ENTRIES};
pub use provider::{
    ProviderEvent, ProviderSource, SignRequest, SignedTransaction, WalletProvider,
};
pub use session::{AMA_TOKEN, WalletSession};
pub use submit::{DEFAULT_API_URL, SubmissionClient};
