// UI layer: the interactive remote menu and the classify flow, built on
// `dialoguer` prompts and `indicatif` spinners. Library errors are turned into
// printed messages here; only prompt/terminal failures abort the program.

use crate::cli::RemoteAction;
use crate::config::{AuthMode, ServerConfig, VisionConfig};
use crate::remote::{self, Session};
use crate::vision::{self, batch, VisionClient};
use anyhow::{Context, Result};
use crossterm::style::{style, Stylize};
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

const RULE: &str = "============================================================";

fn ok(msg: &str) {
    println!("{}", style(format!("✓ {msg}")).green());
}

fn fail(msg: &str) {
    println!("{}", style(format!("✗ {msg}")).red());
}

fn warn(msg: &str) {
    println!("{}", style(format!("! {msg}")).yellow());
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Password for password-mode auth: the configured env var, else a hidden prompt.
pub fn resolve_password(server: &ServerConfig) -> Result<Option<String>> {
    if server.auth != AuthMode::Password {
        return Ok(None);
    }
    if let Ok(pw) = std::env::var(&server.password_env) {
        if !pw.is_empty() {
            return Ok(Some(pw));
        }
    }
    let pw: String = Password::new()
        .with_prompt(format!("Password for {}@{}", server.user, server.host))
        .interact()?;
    Ok(Some(pw))
}

/// API key from `OPENAI_API_KEY` (after confirmation unless `assume_yes`) or a
/// hidden prompt.
pub fn resolve_api_key(assume_yes: bool) -> Result<String> {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            ok("Found OPENAI_API_KEY in the environment");
            if assume_yes
                || Confirm::new()
                    .with_prompt("Use the API key from the environment?")
                    .default(true)
                    .interact()?
            {
                return Ok(key);
            }
        }
    }
    println!("Enter your OpenAI API key (https://platform.openai.com/api-keys):");
    let key: String = Password::new().with_prompt("API key").interact()?;
    Ok(key)
}

fn print_header(session: &Session) {
    let target = session.target();
    println!("\n{RULE}");
    println!("SSH CONNECTION MANAGER");
    println!("{RULE}");
    println!("Server: {}", target.destination());
    if target.auth == AuthMode::Password {
        warn("Password authentication in use; option 5 switches to a key");
    }
    println!("{RULE}");
}

/// Main interactive menu. Runs a select loop until the user chooses "Exit".
/// A failed operation is reported and the loop continues.
pub fn main_menu(session: &Session) -> Result<()> {
    let items = [
        "Connect (interactive SSH)",
        "Execute remote command",
        "Upload file to server",
        "Download file from server",
        "Setup SSH key authentication (recommended)",
        "Test connection",
        "Exit",
    ];
    loop {
        print_header(session);
        let selection = Select::new().items(&items).default(0).interact()?;
        let action = match selection {
            0 => RemoteAction::Shell,
            1 => {
                let command = prompt_line("Command to execute")?;
                if command.is_empty() {
                    continue;
                }
                RemoteAction::Exec { command }
            }
            2 => {
                let local = prompt_line("Local file path")?;
                let remote = prompt_line("Remote destination path")?;
                if local.is_empty() || remote.is_empty() {
                    continue;
                }
                RemoteAction::Upload {
                    local: PathBuf::from(local),
                    remote,
                }
            }
            3 => {
                let remote = prompt_line("Remote file path")?;
                let local = prompt_line("Local destination path")?;
                if remote.is_empty() || local.is_empty() {
                    continue;
                }
                RemoteAction::Download {
                    remote,
                    local: PathBuf::from(local),
                }
            }
            4 => RemoteAction::SetupKey { key: None },
            5 => RemoteAction::Test,
            _ => {
                println!("Goodbye!");
                break;
            }
        };
        run_remote_action(session, action);
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Perform one remote action and print the outcome. Returns whether it
/// succeeded so the non-interactive subcommands can set the exit code.
pub fn run_remote_action(session: &Session, action: RemoteAction) -> bool {
    let target = session.target().destination();
    match action {
        RemoteAction::Shell => {
            println!("Connecting to {target}...");
            match session.shell() {
                Ok(()) => {
                    println!("Connection closed.");
                    true
                }
                Err(e) => {
                    fail(&format!("Connection failed: {e}"));
                    false
                }
            }
        }
        RemoteAction::Exec { command } => {
            println!("Executing on {}: {command}", session.target().host);
            let pb = spinner("Running...");
            let result = session.exec(&command);
            pb.finish_and_clear();
            match result {
                Ok(out) => {
                    print!("{}", out.stdout);
                    if !out.stderr.is_empty() {
                        println!("STDERR: {}", out.stderr.trim_end());
                    }
                    out.success
                }
                Err(e) => {
                    fail(&format!("Command failed: {e}"));
                    false
                }
            }
        }
        RemoteAction::Upload { local, remote } => {
            println!("Uploading {} to {}:{remote}", local.display(), session.target().host);
            report(session.upload(&local, &remote), "Upload successful!", "Upload failed")
        }
        RemoteAction::Download { remote, local } => {
            println!("Downloading {}:{remote} to {}", session.target().host, local.display());
            report(
                session.download(&remote, &local),
                "Download successful!",
                "Download failed",
            )
        }
        RemoteAction::SetupKey { key } => setup_key(session, key),
        RemoteAction::Test => {
            println!("Testing connection...");
            let pb = spinner(&format!("Running `{}`", remote::TEST_COMMAND));
            let result = session.test_connection();
            pb.finish_and_clear();
            match result {
                Ok(out) if out.success => {
                    print!("{}", out.stdout);
                    ok("Connection successful!");
                    true
                }
                Ok(out) => {
                    if !out.stderr.is_empty() {
                        println!("STDERR: {}", out.stderr.trim_end());
                    }
                    fail("Connection failed!");
                    false
                }
                Err(e) => {
                    fail(&format!("Connection failed: {e}"));
                    false
                }
            }
        }
    }
}

fn report(result: crate::Result<()>, success: &str, failure: &str) -> bool {
    match result {
        Ok(()) => {
            ok(success);
            true
        }
        Err(e) => {
            fail(&format!("{failure}: {e}"));
            false
        }
    }
}

fn setup_key(session: &Session, key: Option<PathBuf>) -> bool {
    let key_path = key.unwrap_or_else(remote::default_key_path);
    println!("{RULE}");
    println!("SETTING UP SSH KEY AUTHENTICATION");
    println!("{RULE}");

    match session.setup_key_auth(&key_path) {
        Ok(setup) => {
            if setup.generated {
                ok(&format!("SSH key generated: {}", setup.key_path.display()));
            } else {
                ok(&format!("SSH key already exists: {}", setup.key_path.display()));
            }
            ok("Public key copied to server");
            println!("{RULE}");
            println!("You can now connect without a password:");
            println!("  ssh -i {} {}", setup.key_path.display(), session.target().destination());
            println!("\nNext steps:");
            println!("1. Change the server password");
            println!("2. Disable password authentication on the server");
            println!("3. Set `auth = \"key\"` in the [server] config section");
            println!("{RULE}");
            true
        }
        Err(e) => {
            fail(&format!("Failed to set up key authentication: {e}"));
            false
        }
    }
}

/// Classify flow: list, analyse one by one, save, summarise.
pub fn classify(config: &VisionConfig, assume_yes: bool) -> Result<vision::Summary> {
    println!("{RULE}");
    println!("VISION IMAGE ANALYSIS");
    println!("{RULE}");
    println!("Input dir: {}", config.input_dir.display());
    println!("Model:     {}", config.model);
    println!("Prompt:    {}", config.prompt);
    println!("{RULE}");

    let images = vision::list_images(&config.input_dir, &config.extensions)?;
    println!("\nFound {} images", images.len());

    let api_key = resolve_api_key(assume_yes)?;
    let client = VisionClient::from_config(config, &api_key)?;
    let started = chrono::Local::now();

    let pb = ProgressBar::new(images.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("[{pos}/{len}] {bar:30} {msg}") {
        pb.set_style(style);
    }
    let total = images.len();
    let records = vision::run_batch(&client, &images, &config.prompt, |i, record| {
        pb.suspend(|| {
            println!("\n[{i}/{total}] {}", record.image);
            println!("{}", "-".repeat(RULE.len()));
            match (&record.response, &record.error) {
                (Some(text), _) => {
                    println!("{text}");
                    ok("Analysis complete");
                }
                (None, Some(err)) => fail(&format!("Request failed: {err}")),
                (None, None) => fail("Request failed"),
            }
        });
        pb.inc(1);
    });
    pb.finish_and_clear();

    let saved = vision::save_results(
        &records,
        &config.results_dir,
        &batch::run_file_name(started),
    )
    .context("Failed to save results")?;
    ok(&format!("Results saved to {}", saved.run_file.display()));
    for (path, err) in &saved.write_failures {
        warn(&format!("Could not write {}: {err}", path.display()));
    }

    let summary = vision::Summary::from_records(&records);
    println!("\n{RULE}");
    println!("SUMMARY");
    println!("{RULE}");
    println!("{summary}");
    println!("{RULE}");
    Ok(summary)
}
