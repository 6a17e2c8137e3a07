//! Provider bridge lifecycle tests against a substitute provider.

mod common;

use std::sync::Arc;
use std::time::Duration;

use amadeus_wallet::{ActivityLog, Error, LogLevel, ProviderBridge, ProviderSource, ProviderStatus};

use common::{LateSource, MockProvider, empty_source, fixed_source, wait_for_state};

#[tokio::test]
async fn detects_preauthorized_account_without_connect() {
    let provider = MockProvider::new(Some("Alice"));
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;

    let state = bridge.state();
    assert_eq!(state.status, ProviderStatus::Available);
    assert_eq!(state.account.as_deref(), Some("Alice"));
    assert!(state.unlocked);
    assert!(!state.connecting);
}

#[tokio::test]
async fn settles_on_not_found_without_a_provider() {
    let bridge = ProviderBridge::new(empty_source(), ActivityLog::new());
    bridge.start().await;

    let state = bridge.state();
    assert_eq!(state.status, ProviderStatus::NotFound);
    assert!(state.account.is_none());
}

#[tokio::test]
async fn late_provider_recognized_via_ready_notification() {
    let source = LateSource::new();
    let bridge = ProviderBridge::new(
        Arc::clone(&source) as Arc<dyn ProviderSource>,
        ActivityLog::new(),
    );
    bridge.start().await;
    assert_eq!(bridge.state().status, ProviderStatus::NotFound);

    source.inject(MockProvider::new(Some("Alice")));
    bridge.provider_ready().await;

    let state = bridge.state();
    assert_eq!(state.status, ProviderStatus::Available);
    assert_eq!(state.account.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn detection_query_failure_is_absorbed() {
    let provider = MockProvider::new(Some("Alice"));
    provider.set_fail_queries(true);
    let log = ActivityLog::new();
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), log.clone());
    bridge.start().await;

    // Provider recognized, but the account stays unset and the failure is
    // logged instead of propagated.
    let state = bridge.state();
    assert_eq!(state.status, ProviderStatus::Available);
    assert!(state.account.is_none());
    assert!(
        log.entries()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("Failed to get account"))
    );
}

#[tokio::test]
async fn connect_adopts_first_granted_account() {
    let provider = MockProvider::new(None);
    provider.grant_on_request(&["Bob", "Carol"]);
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;

    bridge.connect().await.unwrap();

    let state = bridge.state();
    assert_eq!(state.account.as_deref(), Some("Bob"));
    assert!(state.unlocked);
    assert!(!state.connecting);
}

#[tokio::test]
async fn connect_without_provider_is_rejected() {
    let bridge = ProviderBridge::new(empty_source(), ActivityLog::new());
    bridge.start().await;

    let err = bridge.connect().await.unwrap_err();
    assert!(matches!(err, Error::ProviderUnavailable));
}

#[tokio::test]
async fn failed_connect_clears_busy_flag() {
    let provider = MockProvider::new(None);
    provider.set_fail_requests(true);
    let log = ActivityLog::new();
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), log.clone());
    bridge.start().await;

    let err = bridge.connect().await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
    assert!(!bridge.state().connecting);
    assert!(log.entries().iter().any(|e| e.level == LogLevel::Error));
}

#[tokio::test]
async fn empty_connect_result_changes_nothing() {
    let provider = MockProvider::new(None);
    provider.grant_on_request(&[]);
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;

    bridge.connect().await.unwrap();

    let state = bridge.state();
    assert!(state.account.is_none());
    assert!(!state.unlocked);
    assert!(!state.connecting);
}

#[tokio::test]
async fn accounts_changed_events_update_state() {
    let provider = MockProvider::new(None);
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;
    let mut rx = bridge.subscribe();

    provider.emit_accounts_changed(&["Carol"]);
    let state = wait_for_state(&mut rx, |s| s.account.is_some()).await;
    assert_eq!(state.account.as_deref(), Some("Carol"));
    assert!(state.unlocked);

    provider.emit_accounts_changed(&[]);
    let state = wait_for_state(&mut rx, |s| s.account.is_none()).await;
    assert!(!state.unlocked);
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_failure_clears_account() {
    let provider = MockProvider::new(Some("Alice"));
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;
    assert_eq!(bridge.state().account.as_deref(), Some("Alice"));

    provider.set_fail_queries(true);
    let mut rx = bridge.subscribe();
    let state = wait_for_state(&mut rx, |s| s.account.is_none()).await;
    assert!(!state.unlocked);
    // Recognition is monotonic even when refresh fails.
    assert_eq!(state.status, ProviderStatus::Available);
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_picks_up_drifted_unlock() {
    let provider = MockProvider::new(None);
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;

    // Wallet unlocked out of band, no event observed.
    provider.set_account(Some("Alice"));
    provider.set_connected(true);

    let mut rx = bridge.subscribe();
    let state = wait_for_state(&mut rx, |s| s.account.is_some()).await;
    assert_eq!(state.account.as_deref(), Some("Alice"));
    assert!(state.unlocked);
}

#[tokio::test]
async fn manual_refresh_recovers_drift() {
    let provider = MockProvider::new(Some("Alice"));
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;

    provider.set_account(None);
    provider.set_connected(false);
    bridge.refresh().await;

    let state = bridge.state();
    assert!(state.account.is_none());
    assert!(!state.unlocked);
}

#[tokio::test]
async fn disconnect_is_idempotent_and_local_only() {
    let provider = MockProvider::new(Some("Alice"));
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;

    bridge.disconnect();
    assert!(bridge.state().account.is_none());
    bridge.disconnect();
    assert!(bridge.state().account.is_none());

    // The provider side still considers the account authorized.
    assert_eq!(provider.account().as_deref(), Some("Alice"));
}

#[tokio::test(start_paused = true)]
async fn no_state_writes_after_shutdown() {
    let provider = MockProvider::new(Some("Alice"));
    let bridge = ProviderBridge::new(fixed_source(Arc::clone(&provider)), ActivityLog::new());
    bridge.start().await;
    bridge.shutdown();

    // Either of these would clear or change the account if the background
    // paths were still live.
    provider.set_fail_queries(true);
    provider.emit_accounts_changed(&[]);
    tokio::time::sleep(Duration::from_secs(12)).await;

    assert_eq!(bridge.state().account.as_deref(), Some("Alice"));
}
