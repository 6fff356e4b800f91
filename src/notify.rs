//! UI-facing collaborator traits: notifications and confirmations.

use async_trait::async_trait;
use tracing::info;

/// Fire-and-forget sink for user-visible outcome messages.
///
/// Purely observational: nothing in the orchestrator's correctness depends
/// on whether a notification is shown.
pub trait Notifier: Send + Sync {
    /// Reports an outcome to the user.
    fn notify(&self, title: &str, body: &str);
}

/// Default notifier that writes through `tracing`.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

/// Blocking yes/no decision, used before destructive operations (logout).
///
/// Declining must make the whole operation a no-op.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    /// Asks the user to confirm; returns true to proceed.
    async fn confirm(&self, title: &str, body: &str) -> bool;
}
