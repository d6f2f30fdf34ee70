// Runs the built invocations against the configured server.

use super::command::{self, Invocation, RemoteTarget};
use crate::config::AuthMode;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Command used by the connection test.
pub const TEST_COMMAND: &str = "hostname && uptime";

/// Captured result of a non-interactive remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Outcome of [`Session::setup_key_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySetup {
    pub key_path: PathBuf,
    /// False when an existing key was reused
    pub generated: bool,
}

/// Fail early if a required client binary is not on `PATH`.
pub fn check_tools(auth: AuthMode) -> Result<()> {
    if which::which("ssh").is_err() {
        return Err(Error::ToolMissing {
            tool: "ssh",
            hint: "sudo apt install openssh-client",
        });
    }
    if auth == AuthMode::Password && which::which("sshpass").is_err() {
        return Err(Error::ToolMissing {
            tool: "sshpass",
            hint: "sudo apt install sshpass",
        });
    }
    Ok(())
}

/// Default key location: `~/.ssh/id_ed25519`.
pub fn default_key_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
        .join("id_ed25519")
}

pub struct Session {
    target: RemoteTarget,
    password: Option<String>,
}

impl Session {
    pub fn new(target: RemoteTarget, password: Option<String>) -> Self {
        Self { target, password }
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.target
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Interactive shell; returns when the remote shell exits.
    pub fn shell(&self) -> Result<()> {
        let inv = command::ssh(&self.target, self.password(), None);
        tracing::info!(destination = %self.target.destination(), "opening interactive shell");
        let status = inv.to_command().status()?;
        // The exit code of an interactive shell is whatever the last command returned.
        tracing::debug!(%status, "interactive shell closed");
        Ok(())
    }

    /// Run one command and capture its output.
    pub fn exec(&self, remote_command: &str) -> Result<CommandOutput> {
        let inv = command::ssh(&self.target, self.password(), Some(remote_command));
        tracing::debug!(command = %inv, password_auth = inv.uses_password(), "running remote command");
        let output = inv
            .to_command()
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    pub fn test_connection(&self) -> Result<CommandOutput> {
        self.exec(TEST_COMMAND)
    }

    pub fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        if !local.is_file() {
            return Err(Error::LocalFileMissing(local.to_path_buf()));
        }
        let inv = command::scp_upload(&self.target, self.password(), local, remote);
        run_checked(&inv)
    }

    pub fn download(&self, remote: &str, local: &Path) -> Result<()> {
        let inv = command::scp_download(&self.target, self.password(), remote, local);
        run_checked(&inv)
    }

    /// Generate `key_path` unless it exists, then install its public half on
    /// the server. Authenticates with the session password when there is one.
    pub fn setup_key_auth(&self, key_path: &Path) -> Result<KeySetup> {
        let generated = if key_path.exists() {
            tracing::info!(key = %key_path.display(), "reusing existing key");
            false
        } else {
            if let Some(parent) = key_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            run_checked(&command::ssh_keygen(key_path))?;
            true
        };

        let public_key = command::public_key_path(key_path);
        if !public_key.is_file() {
            return Err(Error::LocalFileMissing(public_key));
        }
        run_checked(&command::ssh_copy_id(
            &self.target,
            self.password(),
            &public_key,
        ))?;

        Ok(KeySetup {
            key_path: key_path.to_path_buf(),
            generated,
        })
    }
}

/// Run with inherited stdio; a non-zero exit is an error.
fn run_checked(inv: &Invocation) -> Result<()> {
    tracing::debug!(command = %inv, password_auth = inv.uses_password(), "running");
    let status = inv.to_command().status()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            program: inv.program.clone(),
            status: status.to_string(),
        })
    }
}
