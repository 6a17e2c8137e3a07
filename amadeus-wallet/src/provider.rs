//! The wallet capability surface consumed by the bridge.
//!
//! The browser extension injects a provider object into the page; this crate
//! never reaches for an ambient global. Instead the capability is modeled as
//! the [`WalletProvider`] trait and handed to the bridge through a
//! [`ProviderSource`], which makes the whole lifecycle testable with a
//! substitute implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

/// Parameters for a provider signing request.
///
/// Serializes in the camelCase shape the Amadeus extension expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// Target contract name, e.g. `"Coin"`.
    pub contract: String,
    /// Method to invoke on the contract.
    pub method: String,
    /// Positional call arguments.
    pub args: Vec<serde_json::Value>,
    /// Human-readable description shown in the wallet prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A signed, packed transaction produced by the provider.
///
/// The packed payload is an opaque byte blob; it is forwarded to the node
/// unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    /// Unique transaction hash assigned by the provider.
    pub tx_hash: String,
    /// Opaque binary encoding of the signed transaction.
    pub tx_packed: Vec<u8>,
}

/// Events pushed by the provider after it has been recognized.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The authorized account set changed; an empty list means the wallet
    /// is locked.
    AccountsChanged(Vec<String>),
}

/// The capability object exposed by the Amadeus wallet.
///
/// Implementations wrap whatever transport reaches the real extension; the
/// bridge only assumes these five operations. All methods may suspend for as
/// long as the wallet needs (for example while the user decides on an
/// authorization prompt) — no timeout is applied here.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether the wallet currently considers this session connected.
    async fn is_connected(&self) -> Result<bool>;

    /// The already-authorized account, if any.
    async fn get_account(&self) -> Result<Option<String>>;

    /// Prompt the user for account access; returns the authorized accounts.
    async fn request_accounts(&self) -> Result<Vec<String>>;

    /// Sign a contract call, returning the hash and packed payload.
    async fn sign_transaction(&self, request: SignRequest) -> Result<SignedTransaction>;

    /// Subscribe to provider events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Where providers come from.
///
/// A source is probed at bridge startup and again whenever the embedder
/// reports that a late-loading provider finished initializing (see
/// [`ProviderBridge::provider_ready`](crate::bridge::ProviderBridge::provider_ready)).
pub trait ProviderSource: Send + Sync {
    /// Return the provider if one is currently present.
    fn detect(&self) -> Option<Arc<dyn WalletProvider>>;
}

impl<F> ProviderSource for F
where
    F: Fn() -> Option<Arc<dyn WalletProvider>> + Send + Sync,
{
    fn detect(&self) -> Option<Arc<dyn WalletProvider>> {
        self()
    }
}
