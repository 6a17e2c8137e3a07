//! Provider lifecycle management.
//!
//! The bridge owns everything about the externally-injected wallet
//! capability: detection, the account/unlock state attached to it, event
//! subscriptions, and the periodic re-query that recovers from state drift
//! (for example the user locking the wallet in another tab without an event
//! this session observed). Polling on top of event subscription is
//! deliberate belt-and-suspenders against missed notifications.
//!
//! All connection state is written exclusively here and published through a
//! [`watch`] channel; every other component reads snapshots.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::log::{ActivityLog, LogLevel};
use crate::provider::{ProviderEvent, ProviderSource, WalletProvider};

/// Interval between background account/connection re-queries.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// Detection lifecycle of the injected provider.
///
/// Detection is monotonic within a session: once `Available`, the status
/// never reverts, even if a later probe comes up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    /// Initial state; detection has not concluded.
    #[default]
    Checking,
    /// No provider observed; a ready notification can still upgrade this.
    NotFound,
    /// A provider has been recognized.
    Available,
}

impl ProviderStatus {
    /// Lowercase name, matching the reference UI's status strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::NotFound => "not-found",
            Self::Available => "available",
        }
    }
}

/// Snapshot of the bridge-owned connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    /// Provider detection status.
    pub status: ProviderStatus,
    /// The active account, if any.
    pub account: Option<String>,
    /// Whether the wallet reports itself unlocked.
    pub unlocked: bool,
    /// Whether a `connect()` request is outstanding.
    pub connecting: bool,
}

impl WalletState {
    /// Whether an account is active.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

struct Shared {
    source: Arc<dyn ProviderSource>,
    provider: RwLock<Option<Arc<dyn WalletProvider>>>,
    state: watch::Sender<WalletState>,
    log: ActivityLog,
    cancelled: AtomicBool,
    // Bumped whenever a provider is (re)installed; async results carrying a
    // stale epoch are discarded instead of overwriting newer state.
    epoch: AtomicU64,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut WalletState)) {
        self.state.send_modify(f);
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.epoch.load(Ordering::SeqCst) != epoch
    }

    fn apply_accounts(&self, accounts: &[String]) {
        if let Some(first) = accounts.first() {
            tracing::debug!(account = %first, "provider accounts changed");
            let first = first.clone();
            self.update(|s| {
                s.account = Some(first);
                s.unlocked = true;
            });
        } else {
            tracing::debug!("provider reported an empty account set");
            self.update(|s| {
                s.account = None;
                s.unlocked = false;
            });
        }
    }
}

/// Clears the `connecting` flag on every exit path, early returns and
/// errors included.
struct BusyGuard<'a> {
    shared: &'a Shared,
}

impl<'a> BusyGuard<'a> {
    fn acquire(shared: &'a Shared) -> Self {
        shared.update(|s| s.connecting = true);
        Self { shared }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.shared.update(|s| s.connecting = false);
    }
}

/// Detects, tracks, and polls the injected wallet provider.
///
/// Create with [`ProviderBridge::new`], then call [`start`](Self::start)
/// from within a Tokio runtime. The embedder forwards two ambient signals
/// the library cannot observe on its own: [`provider_ready`](Self::provider_ready)
/// when a late-loading provider announces itself, and
/// [`refresh`](Self::refresh) when the hosting surface becomes visible
/// again after being hidden.
pub struct ProviderBridge {
    shared: Arc<Shared>,
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for ProviderBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBridge")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ProviderBridge {
    /// Create a bridge over the given provider source.
    ///
    /// No detection happens until [`start`](Self::start).
    #[must_use]
    pub fn new(source: Arc<dyn ProviderSource>, log: ActivityLog) -> Self {
        let (state, _) = watch::channel(WalletState::default());
        Self {
            shared: Arc::new(Shared {
                source,
                provider: RwLock::new(None),
                state,
                log,
                cancelled: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
            tasks: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Run initial detection and, if a provider is found, begin tracking it.
    pub async fn start(&self) {
        self.detect().await;
    }

    /// Re-run detection after a late-loading provider announced itself.
    pub async fn provider_ready(&self) {
        self.detect().await;
    }

    async fn detect(&self) {
        match self.shared.source.detect() {
            Some(provider) => self.install(provider).await,
            None => {
                tracing::debug!("no wallet provider detected");
                self.shared.update(|s| {
                    // Detection is monotonic: never downgrade from Available.
                    if s.status != ProviderStatus::Available {
                        s.status = ProviderStatus::NotFound;
                    }
                });
            }
        }
    }

    async fn install(&self, provider: Arc<dyn WalletProvider>) {
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.shared.provider.write().await = Some(Arc::clone(&provider));
        self.shared.update(|s| s.status = ProviderStatus::Available);
        self.shared.log.add(LogLevel::Info, "Amadeus provider detected");

        // An already-authorized account is picked up here, without connect().
        match query(provider.as_ref()).await {
            Ok((unlocked, account)) => {
                if !self.shared.is_stale(epoch) {
                    self.shared.update(|s| {
                        s.unlocked = unlocked;
                        if account.is_some() {
                            s.account = account;
                        }
                    });
                }
            }
            Err(e) => {
                // Absorbed: the account stays unset rather than propagating.
                self.shared.log.add(
                    LogLevel::Error,
                    format!("Failed to get account from Amadeus provider: {e}"),
                );
            }
        }

        // Subscribed here, not inside the task, so events fired between
        // install and the task's first poll are not lost.
        let events = provider.subscribe();
        let mut tasks = self.tasks.lock().expect("bridge task lock");
        tasks.push(tokio::spawn(event_loop(
            Arc::clone(&self.shared),
            events,
            epoch,
        )));
        tasks.push(tokio::spawn(refresh_loop(
            Arc::clone(&self.shared),
            provider,
            epoch,
        )));
    }

    /// Re-query account and connection state immediately.
    ///
    /// The embedder calls this when its surface becomes visible again; it is
    /// the on-demand twin of the periodic refresh and shares its semantics,
    /// including clearing the account when the query fails.
    pub async fn refresh(&self) {
        let Some(provider) = self.shared.provider.read().await.clone() else {
            return;
        };
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        refresh_once(&self.shared, provider.as_ref(), epoch).await;
    }

    /// Request account access from the provider.
    ///
    /// The `connecting` flag in [`WalletState`] is set while the request is
    /// outstanding and cleared on every exit path. A non-empty result sets
    /// the first account as active and marks the wallet unlocked; an empty
    /// result changes nothing and is not an error.
    ///
    /// # Errors
    ///
    /// [`Error::ProviderUnavailable`] when no provider is recognized;
    /// otherwise whatever the provider's `request_accounts` surfaced.
    pub async fn connect(&self) -> Result<()> {
        let provider = self
            .shared
            .provider
            .read()
            .await
            .clone()
            .ok_or(Error::ProviderUnavailable)?;

        let _busy = BusyGuard::acquire(&self.shared);
        match provider.request_accounts().await {
            Ok(accounts) => {
                if let Some(first) = accounts.first() {
                    let first = first.clone();
                    self.shared.update(|s| {
                        s.account = Some(first.clone());
                        s.unlocked = true;
                    });
                    self.shared
                        .log
                        .add(LogLevel::Success, format!("Wallet connected: {first}"));
                }
                Ok(())
            }
            Err(e) => {
                self.shared
                    .log
                    .add(LogLevel::Error, format!("Connect failed: {e}"));
                Err(e)
            }
        }
    }

    /// Clear the active account and unlock flag.
    ///
    /// Purely local and idempotent. The provider is not notified and may
    /// still consider the account authorized, so a later
    /// [`connect`](Self::connect) can re-authorize without a fresh prompt.
    pub fn disconnect(&self) {
        self.shared.update(|s| {
            s.account = None;
            s.unlocked = false;
        });
        self.shared
            .log
            .add(LogLevel::Info, "Wallet disconnected (local state cleared)");
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> WalletState {
        self.shared.state.borrow().clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.shared.state.subscribe()
    }

    /// The recognized provider, if any.
    pub async fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.shared.provider.read().await.clone()
    }

    /// The activity log this bridge reports into.
    #[must_use]
    pub fn log(&self) -> &ActivityLog {
        &self.shared.log
    }

    /// Cancel background tasks deterministically.
    ///
    /// After this returns no further state writes happen from the refresh or
    /// event paths, even if a poll was mid-flight.
    pub fn shutdown(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl Drop for ProviderBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn query(provider: &dyn WalletProvider) -> Result<(bool, Option<String>)> {
    let connected = provider.is_connected().await?;
    let account = provider.get_account().await?;
    Ok((connected, account))
}

async fn event_loop(
    shared: Arc<Shared>,
    mut events: broadcast::Receiver<ProviderEvent>,
    epoch: u64,
) {
    loop {
        match events.recv().await {
            Ok(ProviderEvent::AccountsChanged(accounts)) => {
                if shared.is_stale(epoch) {
                    break;
                }
                shared.apply_accounts(&accounts);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "provider event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn refresh_loop(shared: Arc<Shared>, provider: Arc<dyn WalletProvider>, epoch: u64) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately and install() already queried.
    interval.tick().await;
    loop {
        interval.tick().await;
        if shared.is_stale(epoch) {
            break;
        }
        refresh_once(&shared, provider.as_ref(), epoch).await;
    }
}

async fn refresh_once(shared: &Shared, provider: &dyn WalletProvider, epoch: u64) {
    let result = query(provider).await;
    // Checked after the await so a late-resolving poll never overwrites
    // state installed by a newer provider or after shutdown.
    if shared.is_stale(epoch) {
        return;
    }
    match result {
        Ok((unlocked, account)) => shared.update(|s| {
            s.unlocked = unlocked;
            s.account = account;
        }),
        Err(e) => {
            tracing::debug!(error = %e, "provider refresh failed; clearing session state");
            shared.update(|s| {
                s.unlocked = false;
                s.account = None;
            });
        }
    }
}
