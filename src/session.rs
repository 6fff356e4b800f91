//! Session state as reported by the vault CLI.
//!
//! The panel never decides the session state on its own: [`SessionInfo`] is
//! a mirror of the last successful `status` reply and is stale until the
//! next refresh.

use serde::{Deserialize, Serialize};

/// Vault session state.
///
/// Exactly one value is active at a time; transitions happen only as the
/// result of a gateway reply or an explicit reset (lock/logout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No reliable information: initial state, or the last status query
    /// failed in transport. Never derived from a successful reply.
    Unknown,
    /// The vault is locked.
    Locked,
    /// The vault is unlocked; item operations are expected to work.
    Unlocked,
    /// The CLI reported a status we do not map (e.g. `unauthenticated`).
    /// The raw string is preserved for display.
    Error(String),
}

impl SessionStatus {
    /// Normalizes a status string from a successful `status` reply.
    ///
    /// Matching is case-insensitive. Only the literal values `"unlocked"`
    /// and `"locked"` map to their variants; everything else lands in the
    /// [`SessionStatus::Error`] bucket with the raw string kept verbatim.
    pub fn from_reply(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "unlocked" => Self::Unlocked,
            "locked" => Self::Locked,
            _ => Self::Error(raw.to_string()),
        }
    }

    /// Returns true if item operations should be possible.
    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
            Self::Error(raw) => write!(f, "{}", raw),
        }
    }
}

/// Snapshot of the tracked session: status plus the cached identity of the
/// authenticated user, both taken from the last successful status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Current session status.
    pub status: SessionStatus,
    /// Email of the authenticated user, if the CLI reported one.
    pub user_email: Option<String>,
}

impl SessionInfo {
    /// Returns true if item operations should be possible.
    pub fn is_unlocked(&self) -> bool {
        self.status.is_unlocked()
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            status: SessionStatus::Unknown,
            user_email: None,
        }
    }
}
