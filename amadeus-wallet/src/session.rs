//! End-to-end pipelines: token transfers and custom contract calls.
//!
//! [`WalletSession`] is the command surface a presentation layer drives. It
//! wires the provider bridge, the amount codec, the submission client, and
//! the two stores together; it contains every piece of orchestration so the
//! UI above it stays logic-free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use crate::amount::to_atomic_units;
use crate::bridge::{ProviderBridge, WalletState};
use crate::error::{Error, Result};
use crate::ledger::{LedgerEntry, TransactionLedger, TxStatus};
use crate::log::{ActivityLog, LogLevel};
use crate::provider::{ProviderSource, SignRequest, WalletProvider};
use crate::submit::{DEFAULT_API_URL, SubmissionClient};

/// Token symbol moved by the transfer pipeline.
pub const AMA_TOKEN: &str = "AMA";

const COIN_CONTRACT: &str = "Coin";
const TRANSFER_METHOD: &str = "transfer";

/// Clears the `submitting` flag on every exit path.
struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// A wallet demo session: bridge, stores, submission client, and the
/// pipelines over them.
///
/// The `submitting` flag is advisory: the presentation layer disables its
/// controls while it is set, but nothing here enforces mutual exclusion. A
/// second programmatic invocation while busy stays logically safe because
/// ledger updates are keyed by transaction hash.
pub struct WalletSession {
    bridge: Arc<ProviderBridge>,
    log: ActivityLog,
    ledger: TransactionLedger,
    client: SubmissionClient,
    endpoint: RwLock<String>,
    submitting: AtomicBool,
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("endpoint", &self.endpoint())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WalletSession {
    /// Create a session over the given provider source.
    ///
    /// The endpoint defaults to [`DEFAULT_API_URL`]. Call
    /// [`start`](Self::start) from within a Tokio runtime before issuing
    /// commands.
    #[must_use]
    pub fn new(source: Arc<dyn ProviderSource>) -> Self {
        let log = ActivityLog::new();
        let bridge = Arc::new(ProviderBridge::new(source, log.clone()));
        Self {
            bridge,
            log,
            ledger: TransactionLedger::new(),
            client: SubmissionClient::new(),
            endpoint: RwLock::new(DEFAULT_API_URL.to_string()),
            submitting: AtomicBool::new(false),
        }
    }

    /// Run provider detection.
    pub async fn start(&self) {
        self.bridge.start().await;
    }

    /// Transfer AMA tokens.
    ///
    /// A blank recipient resolves to the connected account (self-transfer).
    /// The amount is converted to atomic units, signed as
    /// `Coin.transfer(recipient, atomic, "AMA")`, recorded in the ledger as
    /// pending, and then submitted to the configured node. Submission
    /// failure leaves the ledger entry in error status.
    ///
    /// Returns the transaction hash.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] without an active account,
    /// [`Error::InvalidAmount`] for a bad amount, signing errors from the
    /// provider, and [`Error::Submission`]/[`Error::Network`] from the node.
    /// Every failure also produces an error-level activity log entry.
    pub async fn transfer(
        &self,
        recipient: &str,
        amount: &str,
        description: Option<&str>,
    ) -> Result<String> {
        let _busy = SubmitGuard::acquire(&self.submitting);
        let result = self.transfer_inner(recipient, amount, description).await;
        if let Err(e) = &result {
            self.log.add(LogLevel::Error, e.to_string());
        }
        result
    }

    async fn transfer_inner(
        &self,
        recipient: &str,
        amount: &str,
        description: Option<&str>,
    ) -> Result<String> {
        let (account, provider) = self.require_connection().await?;

        let trimmed = recipient.trim();
        let recipient = if trimmed.is_empty() {
            account
        } else {
            trimmed.to_string()
        };
        let atomic = to_atomic_units(amount)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(
                || format!("Transfer {amount} {AMA_TOKEN}"),
                ToString::to_string,
            );

        self.log
            .add(LogLevel::Info, format!("Preparing transfer to {recipient}"));
        self.log
            .add(LogLevel::Info, format!("Amount ({AMA_TOKEN}): {amount}"));
        self.log
            .add(LogLevel::Info, format!("Atomic amount: {atomic}"));

        let signed = provider
            .sign_transaction(SignRequest {
                contract: COIN_CONTRACT.to_string(),
                method: TRANSFER_METHOD.to_string(),
                args: vec![
                    recipient.into(),
                    atomic.to_string().into(),
                    AMA_TOKEN.into(),
                ],
                description: Some(description.clone()),
            })
            .await?;

        self.log.add(
            LogLevel::Success,
            format!("Transaction signed. Hash: {}", signed.tx_hash),
        );
        self.log.add(
            LogLevel::Info,
            format!("Packed payload bytes: {}", signed.tx_packed.len()),
        );

        // Recorded before submission so the entry survives a failed submit.
        self.ledger
            .add(LedgerEntry::new(&signed.tx_hash, &description, TxStatus::Pending));

        let endpoint = self.endpoint();
        match self
            .client
            .submit(&signed.tx_packed, &signed.tx_hash, &endpoint, &self.log)
            .await
        {
            Ok(_) => {
                self.ledger.update_status(&signed.tx_hash, TxStatus::Success);
                Ok(signed.tx_hash)
            }
            Err(e) => {
                self.ledger.update_status(&signed.tx_hash, TxStatus::Error);
                self.log
                    .add(LogLevel::Error, format!("Network submission failed: {e}"));
                Err(e)
            }
        }
    }

    /// Sign an arbitrary contract call without submitting it.
    ///
    /// Arguments arrive already parsed; validating that user input is
    /// array-shaped is the caller's job. The ledger entry is recorded with
    /// success status immediately since no submission follows.
    ///
    /// Returns the transaction hash.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] without an active account, plus whatever the
    /// provider surfaced while signing. Every failure also produces an
    /// error-level activity log entry.
    pub async fn custom_call(
        &self,
        contract: &str,
        method: &str,
        args: Vec<serde_json::Value>,
        description: Option<&str>,
    ) -> Result<String> {
        let _busy = SubmitGuard::acquire(&self.submitting);
        let result = self
            .custom_call_inner(contract, method, args, description)
            .await;
        if let Err(e) = &result {
            self.log.add(LogLevel::Error, e.to_string());
        }
        result
    }

    async fn custom_call_inner(
        &self,
        contract: &str,
        method: &str,
        args: Vec<serde_json::Value>,
        description: Option<&str>,
    ) -> Result<String> {
        let (_, provider) = self.require_connection().await?;

        let contract = contract.trim();
        let method = method.trim();
        let description = description.filter(|d| !d.trim().is_empty()).map_or_else(
            || format!("{contract}.{method}"),
            ToString::to_string,
        );

        let signed = provider
            .sign_transaction(SignRequest {
                contract: contract.to_string(),
                method: method.to_string(),
                args,
                description: Some(description),
            })
            .await?;

        self.log.add(
            LogLevel::Success,
            format!("Custom call signed. Hash: {}", signed.tx_hash),
        );
        self.log.add(
            LogLevel::Info,
            format!("Packed payload bytes: {}", signed.tx_packed.len()),
        );

        // Sign-only: no network submission step.
        self.ledger.add(LedgerEntry::new(
            &signed.tx_hash,
            format!("{contract}.{method} (custom)"),
            TxStatus::Success,
        ));
        Ok(signed.tx_hash)
    }

    async fn require_connection(&self) -> Result<(String, Arc<dyn WalletProvider>)> {
        let account = self.bridge.state().account.ok_or(Error::NotConnected)?;
        let provider = self.bridge.provider().await.ok_or(Error::NotConnected)?;
        Ok((account, provider))
    }

    /// Request account access from the provider.
    ///
    /// # Errors
    ///
    /// See [`ProviderBridge::connect`].
    pub async fn connect(&self) -> Result<()> {
        self.bridge.connect().await
    }

    /// Clear the active account locally.
    pub fn disconnect(&self) {
        self.bridge.disconnect();
    }

    /// Forward a provider-initialized notification to the bridge.
    pub async fn provider_ready(&self) {
        self.bridge.provider_ready().await;
    }

    /// Forward a visibility-regained notification to the bridge.
    pub async fn refresh(&self) {
        self.bridge.refresh().await;
    }

    /// Current connection state snapshot.
    #[must_use]
    pub fn state(&self) -> WalletState {
        self.bridge.state()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.bridge.subscribe()
    }

    /// The provider bridge.
    #[must_use]
    pub fn bridge(&self) -> &Arc<ProviderBridge> {
        &self.bridge
    }

    /// The shared activity log.
    #[must_use]
    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// The transaction ledger.
    #[must_use]
    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    /// The configured node endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.endpoint.read().expect("endpoint lock").clone()
    }

    /// Replace the node endpoint. No validation is applied beyond the
    /// trailing-slash trim at use time.
    pub fn set_endpoint(&self, endpoint: impl Into<String>) {
        *self.endpoint.write().expect("endpoint lock") = endpoint.into();
    }

    /// Whether a transfer or custom call is in flight (advisory).
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Empty the activity log.
    pub fn clear_logs(&self) {
        self.log.clear();
    }

    /// Empty the transaction ledger.
    pub fn clear_transactions(&self) {
        self.ledger.clear();
    }
}
