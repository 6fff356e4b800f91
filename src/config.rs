//! Configuration for assembling a panel against the real CLI.

use crate::gateway::ServerRegion;
use std::path::PathBuf;

/// Configuration for the `bw`-backed panel.
///
/// Use the builder pattern:
///
/// ```
/// use vaultdeck::{Config, ServerRegion};
///
/// let config = Config::new()
///     .with_program("/opt/bw/bw")
///     .with_credential_file("/home/user/.config/vaultdeck/credentials.json")
///     .with_server(ServerRegion::Eu);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Path or name of the `bw` binary.
    pub program: PathBuf,

    /// Where saved credentials live. `None` disables on-device storage.
    pub credential_file: Option<PathBuf>,

    /// Default region for the login form's server toggle.
    pub server: ServerRegion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: PathBuf::from("bw"),
            credential_file: None,
            server: ServerRegion::Us,
        }
    }
}

impl Config {
    /// Creates a configuration with defaults (`bw` from PATH, US region,
    /// no credential file).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CLI binary to invoke.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the on-device credential file location.
    pub fn with_credential_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_file = Some(path.into());
        self
    }

    /// Sets the default server region.
    pub fn with_server(mut self, server: ServerRegion) -> Self {
        self.server = server;
        self
    }
}
