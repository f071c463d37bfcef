use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use serena_hooks::config::Config;
use serena_hooks::domain::{ActivationRecord, InitStep, StepState};
use serena_hooks::hooks::{self, HookKind};
use serena_hooks::storage::MarkerStore;

mod cli;

use cli::Cli;
use cli::commands::{Commands, MarkerCommands};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("serena-hooks")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("serena-hooks.log");

    // Stdout belongs to the hook protocol, so logs only go to the file
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_log_filter(verbose)))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Log filter used when `RUST_LOG` is unset
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn run_hook(kind: HookKind, config: &Config) -> ExitCode {
    info!("Running {:?} hook", kind);
    let code = hooks::run(kind, config, io::stdin().lock(), io::stdout().lock());
    ExitCode::from(code)
}

fn run_application(cli: &Cli, config: &Config) -> Result<ExitCode> {
    match &cli.command {
        Commands::Marker { command } => {
            if cli.is_verbose() {
                println!("{}", "Verbose mode enabled".yellow());
            }
            handle_marker_command(command, config, cli.is_verbose())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Gate => Ok(run_hook(HookKind::Gate, config)),
        Commands::BashGuard => Ok(run_hook(HookKind::BashGuard, config)),
        Commands::TestReminder => Ok(run_hook(HookKind::TestReminder, config)),
    }
}

fn handle_marker_command(command: &MarkerCommands, config: &Config, verbose: bool) -> Result<()> {
    let store = MarkerStore::from_config(&config.marker);
    let session = command.session();
    if verbose {
        println!("  Marker: {}", store.path(session).display());
    }

    match command {
        MarkerCommands::Show { .. } => {
            let record = store.load(session).context("Failed to read marker")?;
            print_record(session, &record, &config.gate.required_steps);
        }
        MarkerCommands::Activate { project, .. } => {
            info!("Manually activating session {}", session);
            let record = store
                .update(session, |record| {
                    for step in InitStep::ALL {
                        record.set(step, StepState::Done);
                    }
                    if project.is_some() {
                        record.project = project.clone();
                    }
                    record.stamp_if_complete(&InitStep::ALL);
                })
                .context("Failed to write marker")?;
            println!("{} {}", "Activated:".green(), session);
            print_record(session, &record, &config.gate.required_steps);
        }
        MarkerCommands::Clear { .. } => {
            info!("Clearing marker for session {}", session);
            if store.clear(session).context("Failed to remove marker")? {
                println!("{} {}", "Cleared:".red(), session);
            } else {
                println!("{} {}", "No marker for:".yellow(), session);
            }
        }
    }
    Ok(())
}

fn print_record(session: &str, record: &ActivationRecord, required: &[InitStep]) {
    let status = if record.is_activated(required) {
        "activated".green()
    } else {
        "not activated".red()
    };
    println!("{} {} ({})", "Session:".cyan(), session, status);
    for step in InitStep::ALL {
        let state = match record.get(step) {
            StepState::Done => "done".green(),
            StepState::Pending => "pending".yellow(),
            StepState::Failed => "failed".red(),
            StepState::NotStarted => "not started".dimmed(),
        };
        println!("  {:<22} {}", step.to_string(), state);
    }
    if let Some(project) = &record.project {
        println!("  {:<22} {}", "project", project);
    }
    if let Some(at) = record.activated_at {
        println!("  {:<22} {}", "activated_at", at.to_rfc3339());
    }
}

fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let is_hook = !matches!(cli.command, Commands::Marker { .. });

    // Setup logging first
    if let Err(e) = setup_logging(cli.is_verbose()) {
        eprintln!("serena-hooks: {:#}", e);
    }

    // Hooks must answer the host even with a broken config file
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) if is_hook => {
            eprintln!("serena-hooks: {:#}, using defaults", e);
            Config::default()
        }
        Err(e) => return Err(e.wrap_err("Failed to load configuration")),
    };

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")
}
