// Configuration for fridgecam.
//
// Stored at `~/.config/fridgecam/config.toml`. Every field has a default so a
// missing file, or a file that only sets `server.host`, is valid.

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROMPT: &str = "Identify the object type and quantity in this image. \
Please provide a detailed description of what objects you see and how many of each.";

/// How the remote tools authenticate against the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Public key (ssh-agent or `identity_file`)
    #[default]
    Key,
    /// Password fed to `sshpass` through the environment
    Password,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Key => write!(f, "key"),
            AuthMode::Password => write!(f, "password"),
        }
    }
}

/// Value passed to ssh's `StrictHostKeyChecking` option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyChecking {
    Yes,
    #[default]
    AcceptNew,
    /// Skip verification and never record the key
    No,
}

impl HostKeyChecking {
    pub fn as_ssh_value(&self) -> &'static str {
        match self {
            HostKeyChecking::Yes => "yes",
            HostKeyChecking::AcceptNew => "accept-new",
            HostKeyChecking::No => "no",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub auth: AuthMode,
    pub identity_file: Option<PathBuf>,
    /// Name of the environment variable holding the SSH password
    pub password_env: String,
    pub host_key_checking: HostKeyChecking,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: "root".to_string(),
            port: 22,
            auth: AuthMode::Key,
            identity_file: None,
            password_env: "FRIDGECAM_SSH_PASSWORD".to_string(),
            host_key_checking: HostKeyChecking::AcceptNew,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub input_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Lowercase file extensions treated as images
    pub extensions: Vec<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: 500,
            timeout_secs: 60,
            input_dir: PathBuf::from("selectedFrame"),
            results_dir: PathBuf::from("api_results"),
            extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub vision: VisionConfig,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("no config directory for this platform".into()))?
            .join("fridgecam");
        Ok(dir)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from `path`, which must exist, or from the default
    /// location, where a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.is_file() => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            Some(p) => p.to_path_buf(),
            None => {
                let p = Self::config_path()?;
                if !p.exists() {
                    tracing::debug!(path = %p.display(), "config file not found, using defaults");
                    return Ok(Config::default());
                }
                p
            }
        };

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to `path` (or the default location)
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Apply `FRIDGECAM_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FRIDGECAM_HOST") {
            self.server.host = host;
        }
        if let Some(user) = lookup("FRIDGECAM_USER") {
            self.server.user = user;
        }
        if let Some(port) = lookup("FRIDGECAM_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("FRIDGECAM_PORT is not a valid port: {port}")))?;
        }
        if let Some(endpoint) = lookup("FRIDGECAM_VISION_ENDPOINT") {
            self.vision.endpoint = endpoint;
        }
        if let Some(model) = lookup("FRIDGECAM_VISION_MODEL") {
            self.vision.model = model;
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.server;
        let v = &self.vision;
        writeln!(f, "Fridgecam Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "[server]")?;
        writeln!(
            f,
            "Host:              {}",
            if s.host.is_empty() { "(not set)" } else { &s.host }
        )?;
        writeln!(f, "User:              {}", s.user)?;
        writeln!(f, "Port:              {}", s.port)?;
        writeln!(f, "Auth:              {}", s.auth)?;
        writeln!(
            f,
            "Identity file:     {}",
            s.identity_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(ssh default)".to_string())
        )?;
        writeln!(f, "Password env var:  {}", s.password_env)?;
        writeln!(f, "Host key checking: {}", s.host_key_checking.as_ssh_value())?;
        writeln!(f)?;
        writeln!(f, "[vision]")?;
        writeln!(f, "Endpoint:          {}", v.endpoint)?;
        writeln!(f, "Model:             {}", v.model)?;
        writeln!(f, "Max tokens:        {}", v.max_tokens)?;
        writeln!(f, "Timeout:           {}s", v.timeout_secs)?;
        writeln!(f, "Input dir:         {}", v.input_dir.display())?;
        writeln!(f, "Results dir:       {}", v.results_dir.display())?;
        writeln!(f, "Extensions:        {}", v.extensions.join(", "))?;
        writeln!(f, "Prompt:            {}", v.prompt)?;
        Ok(())
    }
}
