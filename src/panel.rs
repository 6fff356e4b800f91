//! The vault session orchestrator.
//!
//! [`Panel`] owns the four pieces of panel state (session snapshot, item
//! cache, login form, command slot) and coordinates every remote operation:
//! it admits one command at a time, reconciles status after transient
//! failures, and keeps the item cache empty whenever the session is not
//! unlocked.
//!
//! Within one command the order is fixed: gateway call, then any credential
//! side effect, then status refresh, then cache mutation. State mutexes are
//! held only for snapshots, never across an await point.

use crate::cli::BwCli;
use crate::clipboard::{CopyStatus, SecretClipboard};
use crate::config::Config;
use crate::gateway::{Gateway, LoginRequest, ServerRegion};
use crate::item::{ItemCache, VaultItemSummary};
use crate::notify::{ConfirmPrompt, Notifier};
use crate::session::{SessionInfo, SessionStatus};
use crate::slot::CommandSlot;
use crate::store::{CredentialKind, CredentialStore, DisabledCredentialStore, FileCredentialStore};
use crate::{ErrorClass, Result, VaultdeckError};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// In-memory login form contents, owned by the panel.
///
/// The 2FA code is cleared after every login attempt; password and email
/// are cleared on logout.
#[derive(Clone, Default)]
pub struct LoginForm {
    /// Account email.
    pub email: String,
    /// Master password.
    pub password: String,
    /// Single-use 2FA code.
    pub totp_code: String,
    /// Persist the email on successful login.
    pub remember_email: bool,
    /// Region toggle for the login call.
    pub server: ServerRegion,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("totp_code", &"<redacted>")
            .field("remember_email", &self.remember_email)
            .field("server", &self.server)
            .finish()
    }
}

/// Which already-fetched detail field to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyField {
    /// The login username.
    Username,
    /// The login password.
    Password,
    /// The one-time code.
    Totp,
    /// The n-th associated URI.
    Uri(usize),
}

impl CopyField {
    fn label(self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Password => "Password",
            Self::Totp => "One-time code",
            Self::Uri(_) => "URI",
        }
    }
}

/// Vault session orchestrator: the core behind the control panel.
///
/// All methods take `&self`; interior state is mutated under short-lived
/// mutexes and the [`CommandSlot`] guarantees at most one remote command is
/// in flight.
pub struct Panel {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn ConfirmPrompt>,
    clipboard: SecretClipboard,

    session: Mutex<SessionInfo>,
    cache: Mutex<ItemCache>,
    form: Mutex<LoginForm>,
    slot: CommandSlot,
}

impl Panel {
    /// Creates a panel over explicit collaborators.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn ConfirmPrompt>,
        clipboard: SecretClipboard,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            confirm,
            clipboard,
            session: Mutex::new(SessionInfo::default()),
            cache: Mutex::new(ItemCache::default()),
            form: Mutex::new(LoginForm::default()),
            slot: CommandSlot::new(),
        }
    }

    /// Assembles a panel over the real CLI from a [`Config`].
    ///
    /// Verifies the configured `bw` binary is reachable, builds the
    /// credential store from `config.credential_file` (a
    /// [`DisabledCredentialStore`] when unset), and seeds the login form's
    /// server toggle from `config.server`.
    ///
    /// # Errors
    ///
    /// - [`VaultdeckError::CliNotInstalled`] if the binary cannot be found
    /// - An I/O error if the credential file's directory cannot be created
    pub async fn from_config(
        config: &Config,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Result<Self> {
        let gateway = Arc::new(BwCli::new(&config.program));
        gateway.check_installed().await?;

        let store: Arc<dyn CredentialStore> = match &config.credential_file {
            Some(path) => Arc::new(FileCredentialStore::new(path).await?),
            None => Arc::new(DisabledCredentialStore),
        };

        let panel = Self::new(gateway, store, notifier, confirm, SecretClipboard::system());
        panel.update_form(|form| form.server = config.server);
        Ok(panel)
    }

    // ========================================================================
    // State snapshots
    // ========================================================================

    /// Last known session state.
    pub fn session_info(&self) -> SessionInfo {
        self.session
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Current item cache contents.
    pub fn items(&self) -> ItemCache {
        self.cache
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Current login form contents.
    pub fn form(&self) -> LoginForm {
        self.form
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Edits the login form in place.
    pub fn update_form(&self, edit: impl FnOnce(&mut LoginForm)) {
        if let Ok(mut form) = self.form.lock() {
            edit(&mut form);
        }
    }

    /// True while a command holds the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    // ========================================================================
    // Status tracking
    // ========================================================================

    /// Queries the gateway for the current session status and applies it.
    ///
    /// A transport failure or unparseable reply yields
    /// [`SessionStatus::Unknown`], never `Error`: the tracker does not
    /// claim a definitive error state it cannot observe. Any non-unlocked
    /// result clears the item cache synchronously.
    pub async fn refresh_status(&self) -> SessionInfo {
        let info = match self.gateway.status().await {
            Ok(reply) => SessionInfo {
                status: SessionStatus::from_reply(&reply.status),
                user_email: reply.user_email,
            },
            Err(err) => {
                warn!(error = %err, "status query failed, session state unknown");
                SessionInfo::default()
            }
        };
        self.apply_session(info)
    }

    fn apply_session(&self, info: SessionInfo) -> SessionInfo {
        if let Ok(mut session) = self.session.lock() {
            if session.status != info.status {
                debug!(from = %session.status, to = %info.status, "session status changed");
            }
            *session = info.clone();
        }
        if !info.is_unlocked() {
            self.reset_cache();
        }
        info
    }

    fn reset_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Reports a failed command and, when the error text indicates the
    /// session itself is gone, reconciles with a single status refresh.
    async fn report_failure(&self, context: &str, err: VaultdeckError) -> VaultdeckError {
        let message = err.to_string();
        self.notifier.notify(context, &message);
        if ErrorClass::classify(&message).is_transient() {
            info!(context, error = %message, "transient failure, reconciling session status");
            self.refresh_status().await;
        }
        err
    }

    // ========================================================================
    // Session commands
    // ========================================================================

    /// Authenticates with the form's email, password, server region, and
    /// optional 2FA code.
    ///
    /// On success the email is persisted when remember-email is on (a
    /// persistence failure is reported but does not unwind the login), and
    /// the status is refreshed unconditionally: login success alone does
    /// not carry full status detail. The 2FA code field is cleared after
    /// every attempt, success or failure.
    pub async fn login(&self) -> Result<()> {
        let _permit = self.slot.try_acquire()?;

        let (request, remember) = {
            let form = self.form();
            let totp = form.totp_code.trim();
            let request = LoginRequest {
                email: form.email.clone(),
                password: form.password.clone(),
                server: form.server,
                totp_code: (!totp.is_empty()).then(|| totp.to_string()),
            };
            (request, form.remember_email)
        };

        let result = self.gateway.login(&request).await;

        // Single-use code; re-displaying it invites accidental reuse.
        self.update_form(|form| form.totp_code.clear());

        match result {
            Ok(()) => {
                if remember && !request.email.trim().is_empty() {
                    if let Err(err) = self.store.save(CredentialKind::Email, &request.email).await
                    {
                        warn!(error = %err, "login succeeded but saving the email failed");
                        self.notifier
                            .notify("Vault", &format!("Signed in, but the email was not saved: {}", err));
                    }
                }
                let info = self.refresh_status().await;
                info!(status = %info.status, "login complete");
                self.notifier.notify("Vault", "Signed in");
                Ok(())
            }
            Err(err) => Err(self.report_failure("Login failed", err).await),
        }
    }

    /// Unlocks an authenticated vault with the form's master password.
    pub async fn unlock(&self) -> Result<()> {
        let _permit = self.slot.try_acquire()?;

        let password = self.form().password;
        if password.is_empty() {
            return Err(VaultdeckError::InvalidInput(
                "master password is blank".to_string(),
            ));
        }

        match self.gateway.unlock(&password).await {
            Ok(()) => {
                self.refresh_status().await;
                self.notifier.notify("Vault", "Unlocked");
                Ok(())
            }
            Err(err) => Err(self.report_failure("Unlock failed", err).await),
        }
    }

    /// Pulls the latest vault data from the server.
    pub async fn sync_vault(&self) -> Result<()> {
        let _permit = self.slot.try_acquire()?;

        match self.gateway.sync().await {
            Ok(()) => {
                self.refresh_status().await;
                self.notifier.notify("Vault", "Synced");
                Ok(())
            }
            Err(err) => Err(self.report_failure("Sync failed", err).await),
        }
    }

    /// Locks the vault.
    pub async fn lock(&self) -> Result<()> {
        let _permit = self.slot.try_acquire()?;

        match self.gateway.lock().await {
            Ok(()) => {
                // Explicit reset before the refresh: the refreshed status
                // could be ambiguous and the cache must not outlive the
                // session either way.
                self.reset_cache();
                self.refresh_status().await;
                self.notifier.notify("Vault", "Locked");
                Ok(())
            }
            Err(err) => Err(self.report_failure("Lock failed", err).await),
        }
    }

    /// Logs out of the vault after an explicit confirmation.
    ///
    /// Returns `Ok(false)` when the user declines: no gateway call is made
    /// and no state changes. On confirmed success the item cache, the
    /// saved password and email, and the in-memory password/email fields
    /// are all cleared.
    pub async fn logout(&self) -> Result<bool> {
        let _permit = self.slot.try_acquire()?;

        let confirmed = self
            .confirm
            .confirm("Log out?", "This discards the current vault session.")
            .await;
        if !confirmed {
            debug!("logout declined");
            return Ok(false);
        }

        match self.gateway.logout().await {
            Ok(()) => {
                self.reset_cache();
                for kind in [CredentialKind::Password, CredentialKind::Email] {
                    if let Err(err) = self.store.clear(kind).await {
                        warn!(error = %err, "logout succeeded but clearing a saved credential failed");
                        self.notifier
                            .notify("Vault", &format!("Logged out, but a saved credential was not cleared: {}", err));
                    }
                }
                self.update_form(|form| {
                    form.email.clear();
                    form.password.clear();
                    form.totp_code.clear();
                });
                self.refresh_status().await;
                self.notifier.notify("Vault", "Logged out");
                Ok(true)
            }
            Err(err) => Err(self.report_failure("Logout failed", err).await),
        }
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Searches vault items.
    ///
    /// A blank or whitespace-only query is a local no-op that clears the
    /// cache without touching the gateway. A non-blank query replaces the
    /// cached summaries wholesale and drops any prior selection and detail.
    pub async fn search(&self, query: &str) -> Result<Vec<VaultItemSummary>> {
        let _permit = self.slot.try_acquire()?;

        if query.trim().is_empty() {
            self.reset_cache();
            return Ok(Vec::new());
        }

        match self.gateway.search_items(query).await {
            Ok(items) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.replace_summaries(items.clone());
                }
                debug!(count = items.len(), "search results replaced");
                Ok(items)
            }
            Err(err) => Err(self.report_failure("Search failed", err).await),
        }
    }

    /// Selects an item and fetches its detail.
    ///
    /// The selection is set optimistically before the fetch. On failure
    /// the detail is cleared; the id may remain selected with nothing to
    /// show, which the view renders as empty rather than stale data.
    pub async fn select_item(&self, id: &str) -> Result<()> {
        let _permit = self.slot.try_acquire()?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.select(id);
        }

        match self.gateway.get_item(id).await {
            Ok(detail) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.set_detail(detail);
                }
                Ok(())
            }
            Err(err) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.clear_detail();
                }
                Err(self.report_failure("Could not load item", err).await)
            }
        }
    }

    /// Copies one field of the fetched detail to the clipboard.
    ///
    /// Operates on already-fetched values only; never touches the gateway
    /// or the command slot.
    pub fn copy_field(&self, field: CopyField) -> Result<CopyStatus> {
        let value = {
            let detail = self
                .cache
                .lock()
                .ok()
                .and_then(|cache| cache.detail.clone());
            let detail = detail.ok_or_else(|| {
                VaultdeckError::NothingToCopy(field.label().to_string())
            })?;
            match field {
                CopyField::Username => detail.username.unwrap_or_default(),
                CopyField::Password => detail.password.unwrap_or_default(),
                CopyField::Totp => detail.totp.unwrap_or_default(),
                CopyField::Uri(index) => detail.uris.get(index).cloned().unwrap_or_default(),
            }
        };

        let status = self.clipboard.copy(&value, field.label())?;
        let body = match status {
            CopyStatus::Verified => format!("{} copied", field.label()),
            CopyStatus::Unverified => format!("{} copied (not verified)", field.label()),
        };
        self.notifier.notify("Clipboard", &body);
        Ok(status)
    }

    // ========================================================================
    // On-device credentials
    // ========================================================================

    /// Persists a credential. Blank input is rejected locally before any
    /// store call.
    pub async fn save_credential(&self, kind: CredentialKind, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(VaultdeckError::InvalidInput(match kind {
                CredentialKind::Password => "password is blank".to_string(),
                CredentialKind::Email => "email is blank".to_string(),
            }));
        }
        self.store.save(kind, value).await
    }

    /// Removes a stored credential.
    pub async fn forget_credential(&self, kind: CredentialKind) -> Result<()> {
        self.store.clear(kind).await
    }

    /// Presence view of a stored credential.
    pub async fn saved_credential(&self, kind: CredentialKind) -> Result<crate::store::SavedCredential> {
        self.store.saved_status(kind).await
    }

    /// Pre-fills the login form from stored credentials.
    pub async fn prefill_from_store(&self) -> Result<()> {
        let email = self.store.saved_status(CredentialKind::Email).await?;
        let password = self.store.saved_status(CredentialKind::Password).await?;
        self.update_form(|form| {
            if let Some(value) = email.value {
                form.email = value;
            }
            if let Some(value) = password.value {
                form.password = value;
            }
        });
        Ok(())
    }
}
