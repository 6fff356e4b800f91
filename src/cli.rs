//! `bw` CLI transport: subprocess plumbing and the [`BwCli`] gateway.
//!
//! [`BwCli`] is the production [`Gateway`] implementation. It shells out to
//! the Bitwarden CLI with piped stdio, threads the session token through
//! the `BW_SESSION` environment variable, and surfaces CLI failures with
//! their original error text so the transient/permanent classification can
//! see it.

use crate::gateway::{Gateway, LoginRequest, StatusReply};
use crate::item::{VaultItemDetail, VaultItemSummary};
use crate::{Result, VaultdeckError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;

/// Executes a command and returns stdout as a string.
///
/// # Errors
///
/// - [`VaultdeckError::CliNotInstalled`] if the program is not found
/// - [`VaultdeckError::CommandFailed`] on a non-zero exit, carrying the
///   CLI's stderr (or stdout) text verbatim
pub async fn run_command(program: &Path, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    for (key, value) in env {
        cmd.env(key, value);
    }

    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VaultdeckError::CliNotInstalled(format!("{} not found", program.display()))
        } else {
            VaultdeckError::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        // The CLI writes "Error: ..." lines to stderr; keep them verbatim
        // so classification can inspect the text.
        let message = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            format!(
                "{} exited with code {}",
                program.display(),
                output.status.code().unwrap_or(-1)
            )
        };
        return Err(VaultdeckError::CommandFailed(message));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| VaultdeckError::Other(anyhow::anyhow!("invalid UTF-8 in CLI output: {}", e)))
}

/// Checks if a command-line tool is available in PATH.
pub async fn check_command_exists(program: &str) -> Result<bool> {
    let status = Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(VaultdeckError::Io)?;

    Ok(status.success())
}

/// Bitwarden status JSON, as printed by `bw status`.
#[derive(Debug, Deserialize)]
struct BwStatus {
    status: String,
    #[serde(rename = "userEmail")]
    user_email: Option<String>,
}

/// Item JSON from `bw list items` / `bw get item`.
#[derive(Debug, Deserialize)]
struct BwItem {
    id: String,
    name: String,
    login: Option<BwLogin>,
}

#[derive(Debug, Deserialize)]
struct BwLogin {
    username: Option<String>,
    password: Option<String>,
    totp: Option<String>,
    #[serde(default)]
    uris: Vec<BwUri>,
}

#[derive(Debug, Deserialize)]
struct BwUri {
    uri: Option<String>,
}

impl From<BwItem> for VaultItemDetail {
    fn from(item: BwItem) -> Self {
        let login = item.login.unwrap_or(BwLogin {
            username: None,
            password: None,
            totp: None,
            uris: Vec::new(),
        });
        Self {
            id: item.id,
            name: item.name,
            username: login.username,
            password: login.password,
            totp: login.totp,
            uris: login.uris.into_iter().filter_map(|u| u.uri).collect(),
        }
    }
}

/// [`Gateway`] implementation backed by the `bw` command-line tool.
///
/// The session token from `login`/`unlock --raw` is held internally and
/// passed to subsequent calls via `BW_SESSION`; `lock` and `logout` drop it.
pub struct BwCli {
    program: PathBuf,
    session: Mutex<Option<String>>,
}

impl BwCli {
    /// Creates a gateway that invokes the given `bw` binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            session: Mutex::new(None),
        }
    }

    /// Checks that the configured binary is reachable.
    pub async fn check_installed(&self) -> Result<()> {
        let name = self.program.to_string_lossy();
        if self.program.components().count() > 1 {
            if tokio::fs::try_exists(&self.program).await.unwrap_or(false) {
                return Ok(());
            }
        } else if check_command_exists(&name).await? {
            return Ok(());
        }
        Err(VaultdeckError::CliNotInstalled(format!("{} not found", name)))
    }

    fn token(&self) -> Option<String> {
        self.session.lock().ok().and_then(|guard| guard.clone())
    }

    fn store_token(&self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            return;
        }
        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn drop_token(&self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let token = self.token();
        let env: Vec<(&str, &str)> = token
            .as_deref()
            .map(|t| ("BW_SESSION", t))
            .into_iter()
            .collect();
        run_command(&self.program, args, &env).await
    }
}

#[async_trait]
impl Gateway for BwCli {
    async fn status(&self) -> Result<StatusReply> {
        let output = self.run(&["status"]).await?;
        let status: BwStatus = serde_json::from_str(&output)?;
        Ok(StatusReply {
            status: status.status,
            user_email: status.user_email,
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<()> {
        // The region must be configured before authentication; `bw` keeps
        // it as persistent CLI state rather than a login argument.
        self.run(&["config", "server", request.server.base_url()])
            .await?;

        let mut args = vec![
            "login",
            request.email.as_str(),
            request.password.as_str(),
            "--raw",
            "--nointeraction",
        ];
        if let Some(code) = request.totp_code.as_deref() {
            args.extend(["--method", "0", "--code", code]);
        }

        let output = self.run(&args).await?;
        self.store_token(&output);
        Ok(())
    }

    async fn unlock(&self, password: &str) -> Result<()> {
        let output = self
            .run(&["unlock", password, "--raw", "--nointeraction"])
            .await?;
        self.store_token(&output);
        Ok(())
    }

    async fn sync(&self) -> Result<()> {
        self.run(&["sync", "--nointeraction"]).await?;
        Ok(())
    }

    async fn lock(&self) -> Result<()> {
        let result = self.run(&["lock", "--nointeraction"]).await;
        self.drop_token();
        result.map(|_| ())
    }

    async fn logout(&self) -> Result<()> {
        let result = self.run(&["logout", "--nointeraction"]).await;
        self.drop_token();
        result.map(|_| ())
    }

    async fn search_items(&self, query: &str) -> Result<Vec<VaultItemSummary>> {
        let output = self.run(&["list", "items", "--search", query]).await?;
        let items: Vec<BwItem> = serde_json::from_str(&output)?;
        Ok(items
            .into_iter()
            .map(|item| VaultItemSummary {
                id: item.id,
                name: item.name,
            })
            .collect())
    }

    async fn get_item(&self, id: &str) -> Result<VaultItemDetail> {
        let output = self.run(&["get", "item", id]).await?;
        let item: BwItem = serde_json::from_str(&output)?;
        Ok(item.into())
    }
}
