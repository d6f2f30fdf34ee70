// Entrypoint for the fridgecam CLI.
// Keeps `main` small: parse flags, layer config (file, env, flags) and hand
// off to the UI flows.

use anyhow::{bail, Context};
use clap::Parser;
use fridgecam_cli::cli::{Cli, Commands, ConfigAction};
use fridgecam_cli::config::Config;
use fridgecam_cli::remote::{self, RemoteTarget, Session};
use fridgecam_cli::ui;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "fridgecam_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // `config init` and `config path` must work before the file exists.
    let skip_load = matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Init { .. } | ConfigAction::Path
        }
    );
    let mut config = if skip_load {
        Config::default()
    } else {
        Config::load(cli.config.as_deref()).context("Failed to load config")?
    };
    config.apply_env()?;

    match cli.command {
        Commands::Remote { server, action } => {
            server.apply(&mut config);
            let target = RemoteTarget::from_config(&config.server)?;
            remote::check_tools(target.auth)?;
            let password = ui::resolve_password(&config.server)?;
            let session = Session::new(target, password);

            match action {
                None => ui::main_menu(&session)?,
                Some(action) => {
                    if !ui::run_remote_action(&session, action) {
                        std::process::exit(1);
                    }
                }
            }
        }
        Commands::Classify {
            input,
            output,
            model,
            prompt,
            yes,
        } => {
            let vision = &mut config.vision;
            if let Some(dir) = input {
                vision.input_dir = dir;
            }
            if let Some(dir) = output {
                vision.results_dir = dir;
            }
            if let Some(model) = model {
                vision.model = model;
            }
            if let Some(prompt) = prompt {
                vision.prompt = prompt;
            }
            ui::classify(&config.vision, yes)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => print!("{config}"),
            ConfigAction::Path => {
                let path = match cli.config {
                    Some(p) => p,
                    None => Config::config_path()?,
                };
                println!("{}", path.display());
            }
            ConfigAction::Init { force } => {
                let path = match cli.config {
                    Some(p) => p,
                    None => Config::config_path()?,
                };
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                let written = Config::default().save(Some(&path))?;
                println!("Wrote {}", written.display());
            }
        },
    }
    Ok(())
}
