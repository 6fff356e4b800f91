//! Error types for vaultdeck operations.

use thiserror::Error;

/// Result type alias using [`VaultdeckError`].
pub type Result<T> = std::result::Result<T, VaultdeckError>;

/// Errors that can occur while orchestrating the vault session.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum VaultdeckError {
    /// Input was rejected locally before any gateway call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Another command is still in flight; the caller should retry later.
    #[error("another operation is in progress")]
    Busy,

    /// The `bw` binary is not available.
    #[error("vault CLI not installed: {0}")]
    CliNotInstalled(String),

    /// A gateway call failed; the message is the CLI's error text.
    #[error("{0}")]
    CommandFailed(String),

    /// Copy was requested for an empty value. Distinct from a mechanical
    /// clipboard failure so the UI can word the two differently.
    #[error("nothing to copy: {0} is empty")]
    NothingToCopy(String),

    /// Both the primary and the fallback copy mechanisms failed.
    #[error("clipboard copy failed: {0}")]
    CopyFailed(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Whether a failed gateway call implies the session state is stale.
///
/// The `bw` CLI reports session loss as an operation error rather than a
/// state push, so the only signal is the error text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The session likely expired or locked underneath us; the caller
    /// should reconcile with a status refresh.
    Transient,
    /// The failure is about the request (bad credentials, missing item),
    /// not the session. No automatic refresh.
    Permanent,
}

impl ErrorClass {
    /// Substrings the CLI emits when the session itself is gone.
    const SESSION_LOSS_MARKERS: [&'static str; 3] =
        ["no active session", "unauthenticated", "locked"];

    /// Classifies a gateway error message.
    ///
    /// This is the single swap point for the free-text heuristic: if the
    /// backend ever exposes a structured error code, only this function
    /// changes.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultdeck::ErrorClass;
    ///
    /// assert_eq!(ErrorClass::classify("Error: no active session"), ErrorClass::Transient);
    /// assert_eq!(ErrorClass::classify("invalid master password"), ErrorClass::Permanent);
    /// ```
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if Self::SESSION_LOSS_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            Self::Transient
        } else {
            Self::Permanent
        }
    }

    /// Returns true for [`ErrorClass::Transient`].
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }
}
