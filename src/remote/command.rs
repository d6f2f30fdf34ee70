// Argument builders for the OpenSSH client tools.
//
// Nothing here spawns a process; each builder returns an [`Invocation`] that
// [`super::session`] turns into a `std::process::Command`.

use crate::config::{AuthMode, HostKeyChecking, ServerConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable `sshpass -e` reads the password from.
pub const SSHPASS_ENV: &str = "SSHPASS";

const DEFAULT_SSH_PORT: u16 = 22;

/// The server every remote operation talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub auth: AuthMode,
    pub identity_file: Option<PathBuf>,
    pub host_key_checking: HostKeyChecking,
}

impl RemoteTarget {
    pub fn from_config(server: &ServerConfig) -> Result<Self> {
        if server.host.trim().is_empty() {
            return Err(Error::Config(
                "server.host is not set (config file, FRIDGECAM_HOST or --host)".into(),
            ));
        }
        if server.user.trim().is_empty() {
            return Err(Error::Config("server.user must not be empty".into()));
        }
        Ok(Self {
            host: server.host.trim().to_string(),
            user: server.user.trim().to_string(),
            port: server.port,
            auth: server.auth,
            identity_file: server.identity_file.clone(),
            host_key_checking: server.host_key_checking,
        })
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// `user@host:path`, the form scp expects for the remote side.
    pub fn remote_spec(&self, path: &str) -> String {
        format!("{}:{}", self.destination(), path)
    }

    fn ssh_options(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            format!("StrictHostKeyChecking={}", self.host_key_checking.as_ssh_value()),
        ];
        if self.host_key_checking == HostKeyChecking::No {
            args.push("-o".into());
            args.push("UserKnownHostsFile=/dev/null".into());
        }
        if self.auth == AuthMode::Key {
            if let Some(identity) = &self.identity_file {
                args.push("-i".into());
                args.push(identity.display().to_string());
            }
        }
        args
    }
}

/// A fully resolved external program call.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Exported as `SSHPASS` when set
    secret: Option<String>,
}

impl Invocation {
    pub(crate) fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
            secret: None,
        }
    }

    /// Prefix with `sshpass -e` when a password is supplied.
    fn with_password(self, password: Option<&str>) -> Self {
        match password {
            None => self,
            Some(pw) => {
                let mut args = Vec::with_capacity(self.args.len() + 2);
                args.push("-e".to_string());
                args.push(self.program);
                args.extend(self.args);
                Self {
                    program: "sshpass".to_string(),
                    args,
                    secret: Some(pw.to_string()),
                }
            }
        }
    }

    pub fn uses_password(&self) -> bool {
        self.secret.is_some()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(secret) = &self.secret {
            cmd.env(SSHPASS_ENV, secret);
        }
        cmd
    }
}

// Never print the password, even in debug logs.
impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// `ssh [opts] user@host [command]`
pub fn ssh(target: &RemoteTarget, password: Option<&str>, command: Option<&str>) -> Invocation {
    let mut args = target.ssh_options();
    if target.port != DEFAULT_SSH_PORT {
        args.push("-p".into());
        args.push(target.port.to_string());
    }
    args.push(target.destination());
    if let Some(cmd) = command {
        args.push(cmd.to_string());
    }
    Invocation::new("ssh", args).with_password(password)
}

fn scp(target: &RemoteTarget, password: Option<&str>, from: String, to: String) -> Invocation {
    let mut args = target.ssh_options();
    if target.port != DEFAULT_SSH_PORT {
        args.push("-P".into());
        args.push(target.port.to_string());
    }
    args.push(from);
    args.push(to);
    Invocation::new("scp", args).with_password(password)
}

/// `scp [opts] local user@host:remote`
pub fn scp_upload(
    target: &RemoteTarget,
    password: Option<&str>,
    local: &Path,
    remote: &str,
) -> Invocation {
    scp(
        target,
        password,
        local.display().to_string(),
        target.remote_spec(remote),
    )
}

/// `scp [opts] user@host:remote local`
pub fn scp_download(
    target: &RemoteTarget,
    password: Option<&str>,
    remote: &str,
    local: &Path,
) -> Invocation {
    scp(
        target,
        password,
        target.remote_spec(remote),
        local.display().to_string(),
    )
}

/// `ssh-copy-id -i key.pub [opts] user@host`
pub fn ssh_copy_id(target: &RemoteTarget, password: Option<&str>, public_key: &Path) -> Invocation {
    let mut args = vec!["-i".to_string(), public_key.display().to_string()];
    args.push("-o".into());
    args.push(format!(
        "StrictHostKeyChecking={}",
        target.host_key_checking.as_ssh_value()
    ));
    if target.host_key_checking == HostKeyChecking::No {
        args.push("-o".into());
        args.push("UserKnownHostsFile=/dev/null".into());
    }
    if target.port != DEFAULT_SSH_PORT {
        args.push("-p".into());
        args.push(target.port.to_string());
    }
    args.push(target.destination());
    Invocation::new("ssh-copy-id", args).with_password(password)
}

/// `ssh-keygen -t ed25519 -f key -N ""`
pub fn ssh_keygen(key_path: &Path) -> Invocation {
    Invocation::new(
        "ssh-keygen",
        vec![
            "-t".into(),
            "ed25519".into(),
            "-f".into(),
            key_path.display().to_string(),
            "-N".into(),
            String::new(),
        ],
    )
}

/// Public half of a key pair: `id_ed25519` -> `id_ed25519.pub`.
pub fn public_key_path(key_path: &Path) -> PathBuf {
    let mut name = key_path.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> RemoteTarget {
        RemoteTarget {
            host: "203.0.113.7".into(),
            user: "pi".into(),
            port: 22,
            auth: AuthMode::Key,
            identity_file: None,
            host_key_checking: HostKeyChecking::AcceptNew,
        }
    }

    #[test]
    fn empty_host_is_rejected() {
        let err = RemoteTarget::from_config(&ServerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn plain_ssh_with_command() {
        let inv = ssh(&target(), None, Some("hostname && uptime"));
        assert_eq!(inv.program, "ssh");
        assert_eq!(
            inv.args,
            vec![
                "-o",
                "StrictHostKeyChecking=accept-new",
                "pi@203.0.113.7",
                "hostname && uptime"
            ]
        );
        assert!(!inv.uses_password());
    }

    #[test]
    fn password_goes_through_env_not_argv() {
        let inv = ssh(&target(), Some("hunter2"), None);
        assert_eq!(inv.program, "sshpass");
        assert_eq!(&inv.args[..2], &["-e", "ssh"]);
        assert!(inv.args.iter().all(|a| !a.contains("hunter2")));
        assert!(!format!("{inv:?}").contains("hunter2"));

        let cmd = inv.to_command();
        let env: Vec<_> = cmd.get_envs().collect();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, SSHPASS_ENV);
        assert_eq!(env[0].1.and_then(|v| v.to_str()), Some("hunter2"));
    }

    #[test]
    fn insecure_host_keys_skip_known_hosts() {
        let mut t = target();
        t.host_key_checking = HostKeyChecking::No;
        let inv = ssh(&t, None, None);
        assert!(inv.args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(inv.args.contains(&"UserKnownHostsFile=/dev/null".to_string()));
    }

    #[test]
    fn scp_uses_capital_p_for_port() {
        let mut t = target();
        t.port = 2222;
        let up = scp_upload(&t, None, Path::new("/tmp/a.jpg"), "/srv/in/a.jpg");
        let n = up.args.len();
        assert_eq!(&up.args[n - 4..n - 2], &["-P", "2222"]);
        assert_eq!(up.args[n - 2], "/tmp/a.jpg");
        assert_eq!(up.args[n - 1], "pi@203.0.113.7:/srv/in/a.jpg");

        let down = scp_download(&t, None, "/var/log/syslog", Path::new("syslog"));
        let n = down.args.len();
        assert_eq!(down.args[n - 2], "pi@203.0.113.7:/var/log/syslog");
        assert_eq!(down.args[n - 1], "syslog");
    }

    #[test]
    fn identity_file_only_in_key_mode() {
        let mut t = target();
        t.identity_file = Some(PathBuf::from("/home/pi/.ssh/cam"));
        assert!(ssh(&t, None, None).args.contains(&"-i".to_string()));

        t.auth = AuthMode::Password;
        assert!(!ssh(&t, Some("x"), None).args.contains(&"-i".to_string()));
    }

    #[test]
    fn copy_id_and_keygen() {
        let key = Path::new("/home/pi/.ssh/id_ed25519");
        let pub_key = public_key_path(key);
        assert_eq!(pub_key, PathBuf::from("/home/pi/.ssh/id_ed25519.pub"));

        let copy = ssh_copy_id(&target(), Some("pw"), &pub_key);
        assert_eq!(&copy.args[..4], &["-e", "ssh-copy-id", "-i", "/home/pi/.ssh/id_ed25519.pub"]);
        assert_eq!(copy.args.last().unwrap(), "pi@203.0.113.7");

        let keygen = ssh_keygen(key);
        assert_eq!(keygen.program, "ssh-keygen");
        assert_eq!(keygen.args.last().unwrap(), "");
    }

    #[test]
    fn copy_id_honours_port_and_insecure_host_keys() {
        let mut t = target();
        t.port = 2222;
        t.host_key_checking = HostKeyChecking::No;

        let copy = ssh_copy_id(&t, None, Path::new("/home/pi/.ssh/id_ed25519.pub"));
        assert_eq!(copy.program, "ssh-copy-id");
        let port_at = copy.args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(copy.args[port_at + 1], "2222");
        assert!(copy.args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(copy.args.contains(&"UserKnownHostsFile=/dev/null".to_string()));
        assert_eq!(copy.args.last().unwrap(), "pi@203.0.113.7");
    }

    #[test]
    fn display_shows_command_line_without_secret() {
        let inv = scp_download(&target(), Some("hunter2"), "/etc/hostname", Path::new("h"));
        let line = inv.to_string();
        assert!(line.starts_with("sshpass -e scp "));
        assert!(line.ends_with("pi@203.0.113.7:/etc/hostname h"));
        assert!(!line.contains("hunter2"));
    }
}
