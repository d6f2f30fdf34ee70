// CLI definition using clap

use crate::config::{AuthMode, Config, HostKeyChecking};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fridgecam")]
#[command(version)]
#[command(about = "Remote access and vision classification helpers for the fridge camera")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/fridgecam/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work with the remote server (interactive menu when no action is given)
    Remote {
        #[command(flatten)]
        server: ServerArgs,

        #[command(subcommand)]
        action: Option<RemoteAction>,
    },

    /// Send every image in a directory to the vision API and store the results
    Classify {
        /// Directory with the images (overrides config)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,

        /// Directory for the JSON results (overrides config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Model name override
        #[arg(long)]
        model: Option<String>,

        /// Prompt override
        #[arg(long)]
        prompt: Option<String>,

        /// Use OPENAI_API_KEY without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-invocation overrides of the `[server]` section.
#[derive(Args, Default)]
pub struct ServerArgs {
    /// Server host name or address
    #[arg(long)]
    pub host: Option<String>,

    /// Login user
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// SSH port
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Authentication mode
    #[arg(long)]
    pub auth: Option<AuthMode>,

    /// Private key for key authentication
    #[arg(long)]
    pub identity: Option<PathBuf>,

    /// Host key verification policy
    #[arg(long)]
    pub host_key_checking: Option<HostKeyChecking>,
}

impl ServerArgs {
    pub fn apply(&self, config: &mut Config) {
        let server = &mut config.server;
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(user) = &self.user {
            server.user = user.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(auth) = self.auth {
            server.auth = auth;
        }
        if let Some(identity) = &self.identity {
            server.identity_file = Some(identity.clone());
        }
        if let Some(policy) = self.host_key_checking {
            server.host_key_checking = policy;
        }
    }
}

#[derive(Subcommand)]
pub enum RemoteAction {
    /// Open an interactive shell
    Shell,
    /// Run one command and print its output
    Exec {
        /// Command line to run remotely
        command: String,
    },
    /// Copy a local file to the server
    Upload {
        local: PathBuf,
        remote: String,
    },
    /// Copy a file from the server
    Download {
        remote: String,
        local: PathBuf,
    },
    /// Generate a key if needed and install it on the server
    SetupKey {
        /// Private key path (defaults to ~/.ssh/id_ed25519)
        #[arg(long)]
        key: Option<PathBuf>,
    },
    /// Run `hostname && uptime` remotely
    Test,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
