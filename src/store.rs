//! On-device credential storage.
//!
//! The panel can remember the account email and the master password between
//! launches. The orchestrator only reads and writes through the
//! [`CredentialStore`] boundary; [`FileCredentialStore`] is the shipped
//! implementation, a JSON file with restricted permissions.

use crate::{Result, VaultdeckError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Which credential a store operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// The master password.
    Password,
    /// The account email.
    Email,
}

/// Presence view of one stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCredential {
    /// Whether a value is stored.
    pub saved: bool,
    /// The stored value, if any.
    pub value: Option<String>,
}

impl SavedCredential {
    fn absent() -> Self {
        Self {
            saved: false,
            value: None,
        }
    }

    fn present(value: String) -> Self {
        Self {
            saved: true,
            value: Some(value),
        }
    }
}

/// External credential store collaborator.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Reports whether a credential of this kind is saved, with its value.
    async fn saved_status(&self, kind: CredentialKind) -> Result<SavedCredential>;

    /// Persists a credential value.
    async fn save(&self, kind: CredentialKind, value: &str) -> Result<()>;

    /// Removes a stored credential. Idempotent.
    async fn clear(&self, kind: CredentialKind) -> Result<()>;
}

/// Store used when on-device credential storage is turned off.
///
/// Reports every credential as absent and rejects saves, so a caller that
/// asks to remember a value learns it was not persisted instead of silently
/// losing it.
pub struct DisabledCredentialStore;

#[async_trait]
impl CredentialStore for DisabledCredentialStore {
    async fn saved_status(&self, _kind: CredentialKind) -> Result<SavedCredential> {
        Ok(SavedCredential::absent())
    }

    async fn save(&self, _kind: CredentialKind, _value: &str) -> Result<()> {
        Err(VaultdeckError::InvalidInput(
            "credential storage is disabled".to_string(),
        ))
    }

    async fn clear(&self, _kind: CredentialKind) -> Result<()> {
        Ok(())
    }
}

/// On-disk credential file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl CredentialFile {
    fn get(&self, kind: CredentialKind) -> Option<&String> {
        match kind {
            CredentialKind::Password => self.password.as_ref(),
            CredentialKind::Email => self.email.as_ref(),
        }
    }

    fn set(&mut self, kind: CredentialKind, value: Option<String>) {
        match kind {
            CredentialKind::Password => self.password = value,
            CredentialKind::Email => self.email = value,
        }
    }
}

/// File-backed [`CredentialStore`].
///
/// # Security
///
/// - The file is created with mode 0600 (owner read/write only) on Unix
/// - The parent directory is created with mode 0700
/// - A missing or unreadable file is treated as an empty store
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store at the given path, creating the parent directory
    /// with restricted permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(parent).await?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(parent, perms).await?;
            }
        }

        Ok(Self { path })
    }

    async fn load(&self) -> CredentialFile {
        let data = match fs::read(&self.path).await {
            Ok(d) => d,
            Err(_) => return CredentialFile::default(),
        };
        // A corrupt file is treated as empty rather than an error; the
        // user can re-save over it.
        serde_json::from_slice(&data).unwrap_or_default()
    }

    async fn write(&self, contents: &CredentialFile) -> Result<()> {
        let json = serde_json::to_vec_pretty(contents)?;

        let mut file = fs::File::create(&self.path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata().await?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms).await?;
        }

        file.write_all(&json).await?;
        file.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn saved_status(&self, kind: CredentialKind) -> Result<SavedCredential> {
        let contents = self.load().await;
        Ok(match contents.get(kind) {
            Some(value) => SavedCredential::present(value.clone()),
            None => SavedCredential::absent(),
        })
    }

    async fn save(&self, kind: CredentialKind, value: &str) -> Result<()> {
        let mut contents = self.load().await;
        contents.set(kind, Some(value.to_string()));
        self.write(&contents).await
    }

    async fn clear(&self, kind: CredentialKind) -> Result<()> {
        let mut contents = self.load().await;
        contents.set(kind, None);
        match fs::try_exists(&self.path).await {
            Ok(false) => Ok(()),
            _ => self.write(&contents).await,
        }
    }
}
