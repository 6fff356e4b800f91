//! End-to-end panel behavior against scripted collaborators.

use std::sync::Arc;
use std::time::Duration;

use vaultdeck::mock::{MemoryStore, MockGateway, RecordingNotifier, ScriptedClipboard, StaticConfirm};
use vaultdeck::{
    CopyField, CopyStatus, CredentialKind, CredentialStore, Panel, SecretClipboard, SessionStatus,
    VaultItemDetail, VaultItemSummary, VaultdeckError,
};

struct Fixture {
    gateway: Arc<MockGateway>,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    clipboard: Arc<ScriptedClipboard>,
    panel: Panel,
}

fn fixture_with_confirm(confirm: bool) -> Fixture {
    let gateway = Arc::new(MockGateway::new());
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clipboard = Arc::new(ScriptedClipboard::working());

    let panel = Panel::new(
        gateway.clone(),
        store.clone(),
        notifier.clone(),
        Arc::new(StaticConfirm(confirm)),
        SecretClipboard::new(Box::new(clipboard.clone()), None),
    );

    Fixture {
        gateway,
        store,
        notifier,
        clipboard,
        panel,
    }
}

fn fixture() -> Fixture {
    fixture_with_confirm(true)
}

fn summary(id: &str, name: &str) -> VaultItemSummary {
    VaultItemSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

async fn unlock_with_items(fx: &Fixture, items: Vec<VaultItemSummary>) {
    fx.gateway.set_status("unlocked", Some("user@example.com"));
    fx.gateway.set_search_results(items);
    fx.panel.refresh_status().await;
    fx.panel.search("bank").await.unwrap();
}

// ---------------------------------------------------------------------------
// Command serialization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_second_command_is_rejected_while_one_is_in_flight() {
    let fx = fixture();
    *fx.gateway.delay.lock().unwrap() = Some(Duration::from_millis(100));

    let panel = Arc::new(fx.panel);
    let running = {
        let panel = panel.clone();
        tokio::spawn(async move { panel.sync_vault().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(panel.is_busy());
    assert!(matches!(panel.search("bank").await, Err(VaultdeckError::Busy)));

    running.await.unwrap().unwrap();
    assert!(!panel.is_busy());

    // The rejected search never reached the gateway.
    assert_eq!(fx.gateway.call_count("search"), 0);
}

#[tokio::test]
async fn test_slot_is_released_after_a_failed_command() {
    let fx = fixture();
    *fx.gateway.sync_error.lock().unwrap() = Some("network unreachable".to_string());

    assert!(fx.panel.sync_vault().await.is_err());
    assert!(!fx.panel.is_busy());
    assert!(fx.panel.sync_vault().await.is_err());
}

// ---------------------------------------------------------------------------
// Status tracking and cache invalidation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refresh_applies_recognized_statuses() {
    let fx = fixture();

    fx.gateway.set_status("Unlocked", Some("user@example.com"));
    let info = fx.panel.refresh_status().await;
    assert_eq!(info.status, SessionStatus::Unlocked);
    assert_eq!(info.user_email.as_deref(), Some("user@example.com"));

    fx.gateway.set_status("locked", None);
    let info = fx.panel.refresh_status().await;
    assert_eq!(info.status, SessionStatus::Locked);
}

#[tokio::test]
async fn test_transport_failure_yields_unknown_not_error() {
    let fx = fixture();
    *fx.gateway.status_error.lock().unwrap() = Some("connect timeout".to_string());

    let info = fx.panel.refresh_status().await;
    assert_eq!(info.status, SessionStatus::Unknown);
}

#[tokio::test]
async fn test_unmapped_status_keeps_raw_string() {
    let fx = fixture();
    fx.gateway.set_status("unauthenticated", None);

    let info = fx.panel.refresh_status().await;
    assert_eq!(
        info.status,
        SessionStatus::Error("unauthenticated".to_string())
    );
}

#[tokio::test]
async fn test_cache_is_cleared_on_every_non_unlocked_transition() {
    for status in ["locked", "unauthenticated"] {
        let fx = fixture();
        unlock_with_items(&fx, vec![summary("1", "bank"), summary("2", "bank2")]).await;
        fx.panel.select_item("1").await.ok();
        assert!(!fx.panel.items().is_empty());

        fx.gateway.set_status(status, None);
        fx.panel.refresh_status().await;
        assert!(fx.panel.items().is_empty());
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_refreshes_status_and_persists_email() {
    let fx = fixture();
    fx.gateway.set_status("unlocked", Some("user@example.com"));
    fx.panel.update_form(|form| {
        form.email = "user@example.com".to_string();
        form.password = "correct horse".to_string();
        form.totp_code = "123456".to_string();
        form.remember_email = true;
    });

    fx.panel.login().await.unwrap();

    assert_eq!(fx.gateway.calls(), vec!["login", "status"]);
    assert_eq!(fx.panel.session_info().status, SessionStatus::Unlocked);

    let saved = fx.store.saved_status(CredentialKind::Email).await.unwrap();
    assert_eq!(saved.value.as_deref(), Some("user@example.com"));

    // 2FA codes are single-use; the field is cleared after the attempt.
    assert!(fx.panel.form().totp_code.is_empty());
}

#[tokio::test]
async fn test_login_email_persistence_failure_is_not_fatal() {
    let fx = fixture();
    fx.gateway.set_status("unlocked", None);
    *fx.store.save_error.lock().unwrap() = Some("disk full".to_string());
    fx.panel.update_form(|form| {
        form.email = "user@example.com".to_string();
        form.password = "correct horse".to_string();
        form.remember_email = true;
    });

    fx.panel.login().await.unwrap();

    let bodies: Vec<String> = fx.notifier.messages().into_iter().map(|(_, b)| b).collect();
    assert!(bodies.iter().any(|b| b.contains("not saved")));
}

#[tokio::test]
async fn test_transient_login_failure_triggers_exactly_one_status_query() {
    let fx = fixture();
    *fx.gateway.login_error.lock().unwrap() = Some("Error: vault is locked".to_string());
    fx.panel.update_form(|form| form.password = "wrong".to_string());

    assert!(fx.panel.login().await.is_err());

    assert_eq!(fx.gateway.call_count("login"), 1);
    assert_eq!(fx.gateway.call_count("status"), 1);
    assert!(fx.panel.form().totp_code.is_empty());
}

#[tokio::test]
async fn test_permanent_login_failure_triggers_no_status_query() {
    let fx = fixture();
    *fx.gateway.login_error.lock().unwrap() = Some("invalid credentials".to_string());
    fx.panel.update_form(|form| form.password = "wrong".to_string());

    assert!(fx.panel.login().await.is_err());

    assert_eq!(fx.gateway.call_count("login"), 1);
    assert_eq!(fx.gateway.call_count("status"), 0);
}

// ---------------------------------------------------------------------------
// Sync / lock / logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sync_success_refreshes_status() {
    let fx = fixture();
    fx.gateway.set_status("unlocked", None);

    fx.panel.sync_vault().await.unwrap();
    assert_eq!(fx.gateway.calls(), vec!["sync", "status"]);
}

#[tokio::test]
async fn test_lock_clears_cache_even_when_refreshed_status_is_ambiguous() {
    let fx = fixture();
    unlock_with_items(&fx, vec![summary("1", "bank")]).await;

    // Refresh after the lock fails in transport, leaving status Unknown.
    *fx.gateway.status_error.lock().unwrap() = Some("connect timeout".to_string());
    fx.panel.lock().await.unwrap();

    assert_eq!(fx.panel.session_info().status, SessionStatus::Unknown);
    assert!(fx.panel.items().is_empty());
}

#[tokio::test]
async fn test_declined_logout_is_a_complete_noop() {
    let fx = fixture_with_confirm(false);
    unlock_with_items(&fx, vec![summary("1", "bank")]).await;
    fx.store.save(CredentialKind::Password, "hunter2").await.unwrap();
    let calls_before = fx.gateway.calls();

    let logged_out = fx.panel.logout().await.unwrap();

    assert!(!logged_out);
    assert_eq!(fx.gateway.calls(), calls_before);
    assert!(!fx.panel.items().is_empty());
    let saved = fx.store.saved_status(CredentialKind::Password).await.unwrap();
    assert!(saved.saved);
}

#[tokio::test]
async fn test_confirmed_logout_clears_credentials_items_and_form() {
    let fx = fixture();
    unlock_with_items(&fx, vec![summary("1", "bank")]).await;
    fx.store.save(CredentialKind::Password, "hunter2").await.unwrap();
    fx.store.save(CredentialKind::Email, "user@example.com").await.unwrap();
    fx.panel.update_form(|form| {
        form.email = "user@example.com".to_string();
        form.password = "hunter2".to_string();
    });
    fx.gateway.set_status("unauthenticated", None);

    let logged_out = fx.panel.logout().await.unwrap();

    assert!(logged_out);
    assert!(fx.panel.items().is_empty());
    assert!(!fx.store.saved_status(CredentialKind::Password).await.unwrap().saved);
    assert!(!fx.store.saved_status(CredentialKind::Email).await.unwrap().saved);

    let form = fx.panel.form();
    assert!(form.email.is_empty());
    assert!(form.password.is_empty());
}

#[tokio::test]
async fn test_transient_logout_failure_reconciles_status() {
    let fx = fixture();
    *fx.gateway.logout_error.lock().unwrap() = Some("Error: no active session".to_string());

    assert!(fx.panel.logout().await.is_err());
    assert_eq!(fx.gateway.call_count("status"), 1);
}

// ---------------------------------------------------------------------------
// Search and selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_blank_search_clears_cache_without_gateway_call() {
    let fx = fixture();
    unlock_with_items(&fx, vec![summary("1", "bank")]).await;
    let searches_before = fx.gateway.call_count("search");

    let results = fx.panel.search("   ").await.unwrap();

    assert!(results.is_empty());
    assert!(fx.panel.items().is_empty());
    assert_eq!(fx.gateway.call_count("search"), searches_before);
}

#[tokio::test]
async fn test_search_replaces_cache_wholesale() {
    let fx = fixture();
    fx.gateway.set_status("unlocked", None);
    fx.panel.refresh_status().await;

    fx.gateway.set_search_results(vec![summary("1", "old")]);
    fx.panel.search("old").await.unwrap();
    fx.panel.select_item("1").await.ok();

    fx.gateway
        .set_search_results(vec![summary("2", "bank"), summary("3", "bank of tests")]);
    let results = fx.panel.search("bank").await.unwrap();

    assert_eq!(results.len(), 2);
    let cache = fx.panel.items();
    assert_eq!(cache.summaries, results);
    assert!(cache.selected_id.is_none());
    assert!(cache.detail.is_none());
}

#[tokio::test]
async fn test_select_item_installs_detail() {
    let fx = fixture();
    fx.gateway.set_item(VaultItemDetail {
        id: "1".to_string(),
        name: "bank".to_string(),
        username: Some("user@example.com".to_string()),
        password: Some("hunter2".to_string()),
        totp: None,
        uris: vec!["https://bank.example".to_string()],
    });

    fx.panel.select_item("1").await.unwrap();

    let cache = fx.panel.items();
    assert_eq!(cache.selected_id.as_deref(), Some("1"));
    assert_eq!(
        cache.detail.as_ref().and_then(|d| d.password.as_deref()),
        Some("hunter2")
    );
}

#[tokio::test]
async fn test_failed_fetch_leaves_selection_with_no_detail() {
    let fx = fixture();
    *fx.gateway.get_error.lock().unwrap() = Some("Not found.".to_string());

    assert!(fx.panel.select_item("missing").await.is_err());

    let cache = fx.panel.items();
    assert_eq!(cache.selected_id.as_deref(), Some("missing"));
    assert!(cache.detail.is_none());
    // "Not found." is a domain failure: no reconciliation.
    assert_eq!(fx.gateway.call_count("status"), 0);
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_copy_of_present_field_is_verified() {
    let fx = fixture();
    fx.gateway.set_item(VaultItemDetail {
        id: "1".to_string(),
        name: "bank".to_string(),
        username: None,
        password: Some("secret123".to_string()),
        totp: None,
        uris: Vec::new(),
    });
    fx.panel.select_item("1").await.unwrap();

    let status = fx.panel.copy_field(CopyField::Password).unwrap();

    assert_eq!(status, CopyStatus::Verified);
    assert_eq!(fx.clipboard.contents().as_deref(), Some("secret123"));
}

#[tokio::test]
async fn test_copy_of_missing_field_fails_without_touching_clipboard() {
    let fx = fixture();
    fx.gateway.set_item(VaultItemDetail {
        id: "1".to_string(),
        name: "bank".to_string(),
        username: None,
        password: None,
        totp: None,
        uris: Vec::new(),
    });
    fx.panel.select_item("1").await.unwrap();

    let result = fx.panel.copy_field(CopyField::Password);

    assert!(matches!(result, Err(VaultdeckError::NothingToCopy(_))));
    assert!(fx.clipboard.contents().is_none());
}

#[tokio::test]
async fn test_copy_without_read_back_is_verified_by_policy() {
    let gateway = Arc::new(MockGateway::new());
    let clipboard = Arc::new(ScriptedClipboard::write_only());
    let panel = Panel::new(
        gateway.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(StaticConfirm(true)),
        SecretClipboard::new(Box::new(clipboard.clone()), None),
    );
    gateway.set_item(VaultItemDetail {
        id: "1".to_string(),
        name: "bank".to_string(),
        username: Some("user@example.com".to_string()),
        password: None,
        totp: None,
        uris: Vec::new(),
    });
    panel.select_item("1").await.unwrap();

    let status = panel.copy_field(CopyField::Username).unwrap();

    assert_eq!(status, CopyStatus::Verified);
    assert_eq!(clipboard.contents().as_deref(), Some("user@example.com"));
}

// ---------------------------------------------------------------------------
// On-device credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_blank_credential_is_rejected_before_the_store() {
    let fx = fixture();

    let result = fx.panel.save_credential(CredentialKind::Password, "   ").await;

    assert!(matches!(result, Err(VaultdeckError::InvalidInput(_))));
    assert!(!fx.store.saved_status(CredentialKind::Password).await.unwrap().saved);
}

#[tokio::test]
async fn test_prefill_loads_saved_credentials_into_the_form() {
    let fx = fixture();
    fx.store.save(CredentialKind::Email, "user@example.com").await.unwrap();
    fx.store.save(CredentialKind::Password, "hunter2").await.unwrap();

    fx.panel.prefill_from_store().await.unwrap();

    let form = fx.panel.form();
    assert_eq!(form.email, "user@example.com");
    assert_eq!(form.password, "hunter2");
}
