//! The remote call gateway contract.
//!
//! Every vault operation goes through the [`Gateway`] trait; the panel
//! never talks to the CLI (or any other transport) directly. An `Err`
//! result carries the backend's error text, which is what the
//! transient/permanent classification in [`crate::ErrorClass`] runs on.

use crate::item::{VaultItemDetail, VaultItemSummary};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The two fixed vault regions the panel can log in against.
///
/// The server is selected by a toggle, never free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServerRegion {
    /// Bitwarden US cloud (`vault.bitwarden.com`).
    #[default]
    Us,
    /// Bitwarden EU cloud (`vault.bitwarden.eu`).
    Eu,
}

impl ServerRegion {
    /// Base URL passed to `bw config server`.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Us => "https://vault.bitwarden.com",
            Self::Eu => "https://vault.bitwarden.eu",
        }
    }
}

impl std::fmt::Display for ServerRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Us => write!(f, "us"),
            Self::Eu => write!(f, "eu"),
        }
    }
}

/// Inputs for a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Master password.
    pub password: String,
    /// Which cloud region to authenticate against.
    pub server: ServerRegion,
    /// Single-use 2FA code, if the account requires one.
    pub totp_code: Option<String>,
}

/// Reply from a successful `status` call.
///
/// `status` stays a raw string here; normalization into
/// [`crate::SessionStatus`] is the tracker's job, not the transport's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    /// Raw status string as reported by the backend.
    pub status: String,
    /// Email of the authenticated user, if any.
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
}

/// Uniform async request/response surface over the vault CLI.
///
/// Implementations must be `Send + Sync`; the panel holds one behind an
/// `Arc<dyn Gateway>`. Timeout semantics belong to the transport and
/// surface as ordinary errors.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Queries the current session status.
    async fn status(&self) -> Result<StatusReply>;

    /// Authenticates against the remote vault.
    async fn login(&self, request: &LoginRequest) -> Result<()>;

    /// Unlocks an authenticated but locked vault with the master password.
    async fn unlock(&self, password: &str) -> Result<()>;

    /// Pulls the latest vault data from the server.
    async fn sync(&self) -> Result<()>;

    /// Locks the vault, discarding the unlock key.
    async fn lock(&self) -> Result<()>;

    /// Logs out, discarding the session entirely.
    async fn logout(&self) -> Result<()>;

    /// Searches vault items by free-text query.
    async fn search_items(&self, query: &str) -> Result<Vec<VaultItemSummary>>;

    /// Fetches the full detail of one item by id.
    async fn get_item(&self, id: &str) -> Result<VaultItemDetail>;
}
