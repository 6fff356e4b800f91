//! Clipboard copy with best-effort verification.
//!
//! Copying a secret has three observable outcomes: it failed, it probably
//! landed ([`CopyStatus::Unverified`]), or it was read back and matched
//! ([`CopyStatus::Verified`]). Read-back is best-effort by policy: an
//! environment where the clipboard cannot be read is not a copy failure.

use crate::{Result, VaultdeckError};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Outcome of a successful copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// The clipboard was read back and held the expected value.
    Verified,
    /// The copy succeeded but read-back returned something else.
    Unverified,
}

impl CopyStatus {
    /// Returns true for [`CopyStatus::Verified`].
    pub fn verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// One copy mechanism.
///
/// Implementations are synchronous: clipboard access is local and fast,
/// and keeping this trait sync keeps platform clipboard handles (which are
/// not `Send` everywhere) out of async state machines.
pub trait ClipboardBackend: Send + Sync {
    /// Mechanism name, for logs.
    fn name(&self) -> &str;

    /// Places `value` on the clipboard.
    fn set_text(&self, value: &str) -> Result<()>;

    /// Reads the clipboard back, or `Ok(None)` where reading is not
    /// supported by this mechanism.
    fn read_back(&self) -> Result<Option<String>>;
}

impl<T: ClipboardBackend + ?Sized> ClipboardBackend for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_text(&self, value: &str) -> Result<()> {
        (**self).set_text(value)
    }

    fn read_back(&self) -> Result<Option<String>> {
        (**self).read_back()
    }
}

/// Primary mechanism: the platform clipboard via `arboard`.
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &str {
        "system"
    }

    fn set_text(&self, value: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| VaultdeckError::CopyFailed(e.to_string()))?;
        clipboard
            .set_text(value.to_owned())
            .map_err(|e| VaultdeckError::CopyFailed(e.to_string()))
    }

    fn read_back(&self) -> Result<Option<String>> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| VaultdeckError::CopyFailed(e.to_string()))?;
        let text = clipboard
            .get_text()
            .map_err(|e| VaultdeckError::CopyFailed(e.to_string()))?;
        Ok(Some(text))
    }
}

/// Fallback mechanism: external clipboard tools (`wl-copy` on Wayland,
/// `xclip` on X11), fed through stdin.
pub struct CommandClipboard;

impl CommandClipboard {
    fn wayland() -> bool {
        std::env::var_os("WAYLAND_DISPLAY").is_some()
    }

    fn pipe_to(program: &str, args: &[&str], value: &str) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VaultdeckError::CopyFailed(format!("{}: {}", program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(value.as_bytes()) {
                // Reap the child before bailing so a broken pipe cannot
                // leave a zombie behind.
                let _ = child.kill();
                let _ = child.wait();
                return Err(VaultdeckError::CopyFailed(format!("{}: {}", program, e)));
            }
        }

        let status = child
            .wait()
            .map_err(|e| VaultdeckError::CopyFailed(format!("{}: {}", program, e)))?;
        if !status.success() {
            return Err(VaultdeckError::CopyFailed(format!(
                "{} exited with code {}",
                program,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

impl ClipboardBackend for CommandClipboard {
    fn name(&self) -> &str {
        "external-tool"
    }

    fn set_text(&self, value: &str) -> Result<()> {
        if Self::wayland() {
            Self::pipe_to("wl-copy", &[], value)
        } else {
            Self::pipe_to("xclip", &["-selection", "clipboard"], value)
        }
    }

    fn read_back(&self) -> Result<Option<String>> {
        let output = if Self::wayland() {
            Command::new("wl-paste").arg("--no-newline").output()
        } else {
            Command::new("xclip")
                .args(["-selection", "clipboard", "-o"])
                .output()
        };

        match output {
            Ok(out) if out.status.success() => {
                Ok(Some(String::from_utf8_lossy(&out.stdout).into_owned()))
            }
            // No paste tool, or it refused: read-back is unsupported here.
            _ => Ok(None),
        }
    }
}

/// Copy-with-verification over a primary mechanism and one fallback.
pub struct SecretClipboard {
    primary: Box<dyn ClipboardBackend>,
    fallback: Option<Box<dyn ClipboardBackend>>,
}

impl SecretClipboard {
    /// Platform default: `arboard` with the external-tool fallback.
    pub fn system() -> Self {
        Self {
            primary: Box::new(SystemClipboard),
            fallback: Some(Box::new(CommandClipboard)),
        }
    }

    /// Builds from explicit mechanisms. Used by tests and by callers that
    /// need a custom transport.
    pub fn new(
        primary: Box<dyn ClipboardBackend>,
        fallback: Option<Box<dyn ClipboardBackend>>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Copies `value` and attempts to confirm the clipboard holds it.
    ///
    /// `label` names the value in errors ("Password", "Username", ...).
    ///
    /// # Errors
    ///
    /// - [`VaultdeckError::NothingToCopy`] for an empty value; no mechanism
    ///   is touched
    /// - [`VaultdeckError::CopyFailed`] when the primary and the fallback
    ///   both fail
    pub fn copy(&self, value: &str, label: &str) -> Result<CopyStatus> {
        if value.is_empty() {
            return Err(VaultdeckError::NothingToCopy(label.to_string()));
        }

        let used: &dyn ClipboardBackend = match self.primary.set_text(value) {
            Ok(()) => self.primary.as_ref(),
            Err(primary_err) => {
                let Some(fallback) = self.fallback.as_deref() else {
                    return Err(primary_err);
                };
                warn!(
                    mechanism = self.primary.name(),
                    error = %primary_err,
                    "primary clipboard mechanism failed, trying fallback"
                );
                fallback.set_text(value).map_err(|fallback_err| {
                    VaultdeckError::CopyFailed(format!(
                        "{}; fallback: {}",
                        primary_err, fallback_err
                    ))
                })?;
                fallback
            }
        };

        // Verification is best-effort: an unreadable clipboard is treated
        // as verified rather than failing a copy that already happened.
        let status = match used.read_back() {
            Ok(Some(actual)) if actual == value => CopyStatus::Verified,
            Ok(Some(_)) => CopyStatus::Unverified,
            Ok(None) | Err(_) => CopyStatus::Verified,
        };
        debug!(label, mechanism = used.name(), verified = status.verified(), "copied secret");
        Ok(status)
    }
}
