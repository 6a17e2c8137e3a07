//! Shared test doubles: an in-memory wallet provider and provider sources.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use amadeus_wallet::{
    Error, ProviderEvent, ProviderSource, Result, SignRequest, SignedTransaction, WalletProvider,
    WalletState,
};

/// Configurable in-memory stand-in for the injected Amadeus provider.
pub struct MockProvider {
    account: Mutex<Option<String>>,
    connected: AtomicBool,
    fail_queries: AtomicBool,
    fail_requests: AtomicBool,
    fail_signing: AtomicBool,
    grant_on_request: Mutex<Vec<String>>,
    sign_requests: Mutex<Vec<SignRequest>>,
    sign_count: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockProvider {
    pub fn new(account: Option<&str>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            account: Mutex::new(account.map(ToString::to_string)),
            connected: AtomicBool::new(account.is_some()),
            fail_queries: AtomicBool::new(false),
            fail_requests: AtomicBool::new(false),
            fail_signing: AtomicBool::new(false),
            grant_on_request: Mutex::new(account.map(ToString::to_string).into_iter().collect()),
            sign_requests: Mutex::new(Vec::new()),
            sign_count: AtomicUsize::new(0),
            events,
        })
    }

    pub fn set_account(&self, account: Option<&str>) {
        *self.account.lock().unwrap() = account.map(ToString::to_string);
    }

    pub fn account(&self) -> Option<String> {
        self.account.lock().unwrap().clone()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Accounts granted by the next `request_accounts` call.
    pub fn grant_on_request(&self, accounts: &[&str]) {
        *self.grant_on_request.lock().unwrap() =
            accounts.iter().map(ToString::to_string).collect();
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_requests(&self, fail: bool) {
        self.fail_requests.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }

    pub fn emit_accounts_changed(&self, accounts: &[&str]) {
        let _ = self.events.send(ProviderEvent::AccountsChanged(
            accounts.iter().map(ToString::to_string).collect(),
        ));
    }

    pub fn sign_count(&self) -> usize {
        self.sign_count.load(Ordering::SeqCst)
    }

    pub fn sign_requests(&self) -> Vec<SignRequest> {
        self.sign_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn is_connected(&self) -> Result<bool> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::provider("connection query failed"));
        }
        Ok(self.connected.load(Ordering::SeqCst))
    }

    async fn get_account(&self) -> Result<Option<String>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::provider("account query failed"));
        }
        Ok(self.account.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(Error::provider("user rejected the request"));
        }
        let accounts = self.grant_on_request.lock().unwrap().clone();
        if let Some(first) = accounts.first() {
            *self.account.lock().unwrap() = Some(first.clone());
            self.connected.store(true, Ordering::SeqCst);
        }
        Ok(accounts)
    }

    async fn sign_transaction(&self, request: SignRequest) -> Result<SignedTransaction> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(Error::signing("user rejected signing"));
        }
        let n = self.sign_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.sign_requests.lock().unwrap().push(request);
        Ok(SignedTransaction {
            tx_hash: format!("0xmock{n:04}"),
            tx_packed: vec![0xAB; 32],
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Install a compact subscriber so failing tests print the mirrored
/// activity trail.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// A source that always yields the given provider.
pub fn fixed_source(provider: Arc<MockProvider>) -> Arc<dyn ProviderSource> {
    Arc::new(move || Some(Arc::clone(&provider) as Arc<dyn WalletProvider>))
}

/// A source that never yields a provider.
pub fn empty_source() -> Arc<dyn ProviderSource> {
    Arc::new(|| None::<Arc<dyn WalletProvider>>)
}

/// A source whose provider appears only after `inject`, modeling a
/// capability that finishes loading after initial detection.
pub struct LateSource {
    slot: Mutex<Option<Arc<dyn WalletProvider>>>,
}

impl LateSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(None),
        })
    }

    pub fn inject(&self, provider: Arc<dyn WalletProvider>) {
        *self.slot.lock().unwrap() = Some(provider);
    }
}

impl ProviderSource for LateSource {
    fn detect(&self) -> Option<Arc<dyn WalletProvider>> {
        self.slot.lock().unwrap().clone()
    }
}

/// Await a state snapshot matching the predicate, failing after a timeout.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<WalletState>,
    predicate: impl FnMut(&WalletState) -> bool,
) -> WalletState {
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for wallet state")
        .expect("state channel closed")
        .clone()
}
