//! Scripted in-memory collaborators for testing panel logic without `bw`.
//!
//! [`MockGateway`] records every call and supports per-operation error
//! injection, so tests can assert exactly which remote operations a command
//! performed and in what order.

use crate::clipboard::ClipboardBackend;
use crate::gateway::{Gateway, LoginRequest, StatusReply};
use crate::item::{VaultItemDetail, VaultItemSummary};
use crate::notify::{ConfirmPrompt, Notifier};
use crate::store::{CredentialKind, CredentialStore, SavedCredential};
use crate::{Result, VaultdeckError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory gateway with a call log and error injection.
///
/// Inject a failure by setting the operation's error message; the call is
/// still logged, and the panel sees a
/// [`VaultdeckError::CommandFailed`] carrying that exact text (which is
/// what classification runs on).
pub struct MockGateway {
    calls: Mutex<Vec<String>>,
    status: Mutex<StatusReply>,

    /// Error text to return from `status`.
    pub status_error: Mutex<Option<String>>,
    /// Error text to return from `login`.
    pub login_error: Mutex<Option<String>>,
    /// Error text to return from `unlock`.
    pub unlock_error: Mutex<Option<String>>,
    /// Error text to return from `sync`.
    pub sync_error: Mutex<Option<String>>,
    /// Error text to return from `lock`.
    pub lock_error: Mutex<Option<String>>,
    /// Error text to return from `logout`.
    pub logout_error: Mutex<Option<String>>,
    /// Error text to return from `search_items`.
    pub search_error: Mutex<Option<String>>,
    /// Error text to return from `get_item`.
    pub get_error: Mutex<Option<String>>,

    /// Sleep applied at the start of every operation, for tests that need
    /// a command to still be in flight when the next one arrives.
    pub delay: Mutex<Option<std::time::Duration>>,

    search_results: Mutex<Vec<VaultItemSummary>>,
    items: Mutex<HashMap<String, VaultItemDetail>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Creates a gateway reporting `unauthenticated` with no data.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status: Mutex::new(StatusReply {
                status: "unauthenticated".to_string(),
                user_email: None,
            }),
            status_error: Mutex::new(None),
            login_error: Mutex::new(None),
            unlock_error: Mutex::new(None),
            sync_error: Mutex::new(None),
            lock_error: Mutex::new(None),
            logout_error: Mutex::new(None),
            search_error: Mutex::new(None),
            get_error: Mutex::new(None),
            delay: Mutex::new(None),
            search_results: Mutex::new(Vec::new()),
            items: Mutex::new(HashMap::new()),
        }
    }

    /// Scripts the `status` reply.
    pub fn set_status(&self, status: &str, user_email: Option<&str>) {
        if let Ok(mut reply) = self.status.lock() {
            *reply = StatusReply {
                status: status.to_string(),
                user_email: user_email.map(str::to_string),
            };
        }
    }

    /// Scripts the next search result set.
    pub fn set_search_results(&self, results: Vec<VaultItemSummary>) {
        if let Ok(mut guard) = self.search_results.lock() {
            *guard = results;
        }
    }

    /// Pre-populates an item detail for `get_item`.
    pub fn set_item(&self, detail: VaultItemDetail) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(detail.id.clone(), detail);
        }
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls to one operation.
    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    fn record(&self, op: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(op.to_string());
        }
    }

    async fn maybe_delay(&self) {
        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(duration) = delay {
            tokio::time::sleep(duration).await;
        }
    }

    fn injected(&self, slot: &Mutex<Option<String>>) -> Option<VaultdeckError> {
        slot.lock()
            .ok()
            .and_then(|guard| guard.clone())
            .map(VaultdeckError::CommandFailed)
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn status(&self) -> Result<StatusReply> {
        self.record("status");
        self.maybe_delay().await;
        if let Some(err) = self.injected(&self.status_error) {
            return Err(err);
        }
        Ok(self.status.lock().map(|s| s.clone()).unwrap_or_else(|_| {
            StatusReply {
                status: "unauthenticated".to_string(),
                user_email: None,
            }
        }))
    }

    async fn login(&self, _request: &LoginRequest) -> Result<()> {
        self.record("login");
        self.maybe_delay().await;
        match self.injected(&self.login_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn unlock(&self, _password: &str) -> Result<()> {
        self.record("unlock");
        self.maybe_delay().await;
        match self.injected(&self.unlock_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn sync(&self) -> Result<()> {
        self.record("sync");
        self.maybe_delay().await;
        match self.injected(&self.sync_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn lock(&self) -> Result<()> {
        self.record("lock");
        self.maybe_delay().await;
        match self.injected(&self.lock_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn logout(&self) -> Result<()> {
        self.record("logout");
        self.maybe_delay().await;
        match self.injected(&self.logout_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn search_items(&self, _query: &str) -> Result<Vec<VaultItemSummary>> {
        self.record("search");
        self.maybe_delay().await;
        if let Some(err) = self.injected(&self.search_error) {
            return Err(err);
        }
        Ok(self
            .search_results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    async fn get_item(&self, id: &str) -> Result<VaultItemDetail> {
        self.record("get_item");
        self.maybe_delay().await;
        if let Some(err) = self.injected(&self.get_error) {
            return Err(err);
        }
        self.items
            .lock()
            .ok()
            .and_then(|items| items.get(id).cloned())
            .ok_or_else(|| VaultdeckError::CommandFailed("Not found.".to_string()))
    }
}

/// In-memory [`CredentialStore`] with optional save-failure injection.
#[derive(Default)]
pub struct MemoryStore {
    password: Mutex<Option<String>>,
    email: Mutex<Option<String>>,
    /// When set, `save` fails with this message.
    pub save_error: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: CredentialKind) -> &Mutex<Option<String>> {
        match kind {
            CredentialKind::Password => &self.password,
            CredentialKind::Email => &self.email,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn saved_status(&self, kind: CredentialKind) -> Result<SavedCredential> {
        let value = self.slot(kind).lock().ok().and_then(|v| v.clone());
        Ok(SavedCredential {
            saved: value.is_some(),
            value,
        })
    }

    async fn save(&self, kind: CredentialKind, value: &str) -> Result<()> {
        if let Some(message) = self.save_error.lock().ok().and_then(|e| e.clone()) {
            return Err(VaultdeckError::CommandFailed(message));
        }
        if let Ok(mut slot) = self.slot(kind).lock() {
            *slot = Some(value.to_string());
        }
        Ok(())
    }

    async fn clear(&self, kind: CredentialKind) -> Result<()> {
        if let Ok(mut slot) = self.slot(kind).lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// Notifier that records every message.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far as `(title, body)` pairs.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((title.to_string(), body.to_string()));
        }
    }
}

/// Confirmation prompt with a fixed answer.
pub struct StaticConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for StaticConfirm {
    async fn confirm(&self, _title: &str, _body: &str) -> bool {
        self.0
    }
}

/// Clipboard backend that stores the value in memory.
///
/// `read_supported: false` simulates a platform without clipboard
/// read-back.
#[derive(Default)]
pub struct ScriptedClipboard {
    contents: Mutex<Option<String>>,
    /// When false, `read_back` reports unsupported.
    pub read_supported: bool,
    /// When set, `set_text` fails with this message.
    pub set_error: Option<String>,
}

impl ScriptedClipboard {
    /// A working clipboard with read-back.
    pub fn working() -> Self {
        Self {
            contents: Mutex::new(None),
            read_supported: true,
            set_error: None,
        }
    }

    /// A clipboard whose contents cannot be read back.
    pub fn write_only() -> Self {
        Self {
            read_supported: false,
            ..Self::working()
        }
    }

    /// Last value placed on the clipboard.
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl ClipboardBackend for ScriptedClipboard {
    fn name(&self) -> &str {
        "scripted"
    }

    fn set_text(&self, value: &str) -> Result<()> {
        if let Some(message) = &self.set_error {
            return Err(VaultdeckError::CopyFailed(message.clone()));
        }
        if let Ok(mut contents) = self.contents.lock() {
            *contents = Some(value.to_string());
        }
        Ok(())
    }

    fn read_back(&self) -> Result<Option<String>> {
        if !self.read_supported {
            return Ok(None);
        }
        Ok(self.contents())
    }
}
