//! Vaultdeck - session orchestration for a Bitwarden CLI control panel.
//!
//! Vaultdeck is the core behind a graphical panel for the `bw` command-line
//! tool. It tracks vault session state across asynchronous CLI calls,
//! serializes user commands against the single local session, caches search
//! results with strict invalidation, and copies retrieved secrets to the
//! clipboard with best-effort verification.
//!
//! # Features
//!
//! - **Single source of truth**: session state mirrors the CLI's `status`
//!   reply and is never invented locally
//! - **One command at a time**: a second command is rejected as busy rather
//!   than queued or interleaved
//! - **Strict cache invalidation**: cached items never outlive an unlocked
//!   session
//! - **Transient-error reconciliation**: failures that look like session
//!   loss trigger exactly one silent status re-check
//! - **Verified copy**: clipboard writes are read back where the platform
//!   allows it
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vaultdeck::{Config, CopyField, LogNotifier, Panel};
//! # struct Ui;
//! # #[async_trait::async_trait]
//! # impl vaultdeck::ConfirmPrompt for Ui {
//! #     async fn confirm(&self, _: &str, _: &str) -> bool { true }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> vaultdeck::Result<()> {
//!     let config = Config::new().with_credential_file("/tmp/.vaultdeck-credentials");
//!     let panel = Panel::from_config(&config, Arc::new(LogNotifier), Arc::new(Ui)).await?;
//!
//!     panel.update_form(|form| {
//!         form.email = "user@example.com".to_string();
//!         form.password = "correct horse".to_string();
//!     });
//!     panel.login().await?;
//!
//!     panel.search("bank").await?;
//!     if let Some(item) = panel.items().summaries.first().cloned() {
//!         panel.select_item(&item.id).await?;
//!         panel.copy_field(CopyField::Password)?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! | Piece | Module | Role |
//! |-------|--------|------|
//! | [`Gateway`] | `gateway` | Uniform async RPC contract over the vault CLI |
//! | [`BwCli`] | `cli` | Production gateway: the `bw` binary via subprocess |
//! | [`SessionInfo`] | `session` | Mirror of the last successful status query |
//! | [`ItemCache`] | `item` | Search results + selection + detail, invalidated together |
//! | [`CommandSlot`] | `slot` | One in-flight command, RAII release |
//! | [`SecretClipboard`] | `clipboard` | Copy with primary/fallback and read-back |
//! | [`CredentialStore`] | `store` | On-device saved email/password |
//! | [`Panel`] | `panel` | The orchestrator tying it all together |
//!
//! The `mock` feature (on by default) ships scripted in-memory collaborators
//! for testing code built on the panel.

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod gateway;
pub mod item;
pub mod notify;
pub mod panel;
pub mod session;
pub mod slot;
pub mod store;

#[cfg(feature = "mock")]
pub mod mock;

pub use cli::BwCli;
pub use clipboard::{ClipboardBackend, CopyStatus, SecretClipboard};
pub use config::Config;
pub use error::{ErrorClass, Result, VaultdeckError};
pub use gateway::{Gateway, LoginRequest, ServerRegion, StatusReply};
pub use item::{ItemCache, VaultItemDetail, VaultItemSummary};
pub use notify::{ConfirmPrompt, LogNotifier, Notifier};
pub use panel::{CopyField, LoginForm, Panel};
pub use session::{SessionInfo, SessionStatus};
pub use slot::CommandSlot;
pub use store::{
    CredentialKind, CredentialStore, DisabledCredentialStore, FileCredentialStore, SavedCredential,
};
