//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler,
//! then dispatches the subcommand and renders its result.

use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use dotsync::cli::{Args, Command};
use dotsync::config::{Config, default_config_path, default_log_path, load_config};
use dotsync::errors::DotsyncError;
use dotsync::output as out;
use dotsync::pathutil::Home;
use dotsync::prompt::TerminalPrompter;
use dotsync::shutdown;
use dotsync::workflow::{
    self, AddOptions, AddOutcome, FileOutcome, InitOptions, LinkOptions, RunReport, UnlinkOptions, Workspace,
};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    let config_path = default_config_path()?;
    let existing = load_config(&config_path)?;

    // CLI flags override config values.
    let mut cfg = existing.clone().unwrap_or_default();
    args.apply_overrides(&mut cfg);
    if existing.is_some() {
        cfg.validate()?;
    }

    let log_file = cfg.log_file.clone().or_else(|| default_log_path().ok());
    let guard_opt = init_tracing(cfg.log_level, log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; stopping after the current file...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .context("install interrupt handler")?;
    }

    debug!(config = %config_path.display(), "starting dotsync: {:?}", args.command);

    let result = dispatch(&args, &config_path, existing, &cfg);
    if let Err(e) = &result {
        log_failure(e);
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}

fn log_failure(e: &anyhow::Error) {
    match e.downcast_ref::<DotsyncError>() {
        Some(de) => error!(code = de.code(), kind = de.kind(), "{de}"),
        None => error!(error = %format!("{e:#}"), "command failed"),
    }
}

fn dispatch(args: &Args, config_path: &Path, existing: Option<Config>, cfg: &Config) -> Result<ExitCode> {
    let home = Home::detect()?;
    let cwd = env::current_dir().context("resolve current directory")?;
    let mut prompter = TerminalPrompter;

    if let Command::Init { provider, path } = &args.command {
        let opts = InitOptions {
            provider: *provider,
            path: path.as_deref().map(Args::sanitize_path),
        };
        let done = workflow::init(&home, config_path, existing, &opts, &mut prompter)?;
        out::print_success(&format!("dotsync initialized at {}", done.storage_root.display()));
        if !done.created_manifest {
            out::print_info("Storage already holds a manifest; run `dotsync link` to set up this machine.");
        }
        return Ok(ExitCode::SUCCESS);
    }

    if existing.is_none() {
        return Err(DotsyncError::NotInitialized.into());
    }
    let ws = Workspace::from_config(cfg, home)?;

    match &args.command {
        Command::Init { .. } => Ok(ExitCode::SUCCESS),
        Command::Add { path, name, yes } => {
            let path = ws.home().absolutize(&Args::sanitize_path(path), &cwd);
            let opts = AddOptions {
                name: name.clone(),
                assume_yes: *yes,
            };
            match workflow::add(&ws, &path, &opts, &mut prompter)? {
                AddOutcome::Added { entry, stored_at, .. } => {
                    out::print_success(&format!("added {} to entry '{entry}'", ws.home().contract(&path)));
                    out::print_user(&format!("  stored at {}", stored_at.display()));
                }
                AddOutcome::AlreadyTracked { entry } => {
                    out::print_info(&format!("{} is already tracked in entry '{entry}'", ws.home().contract(&path)));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Link { entry, backup } => {
            let opts = LinkOptions {
                entry: entry.clone(),
                auto_backup: *backup,
            };
            let report = workflow::link(&ws, &opts, &mut prompter)?;
            Ok(render_report(&ws, &report))
        }
        Command::Unlink { entry } => {
            let opts = UnlinkOptions { entry: entry.clone() };
            let report = workflow::unlink(&ws, &opts)?;
            Ok(render_report(&ws, &report))
        }
        Command::List { details } => {
            render_status(&ws, *details)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn render_report(ws: &Workspace, report: &RunReport) -> ExitCode {
    if report.nothing_tracked {
        out::print_info("Nothing tracked yet. Add files with `dotsync add <path>`.");
        return ExitCode::SUCCESS;
    }

    for f in &report.files {
        let shown = ws.home().contract(&f.path);
        let line = match &f.outcome {
            FileOutcome::BackedUp(b) => format!("{shown} (backup: {})", b.display()),
            FileOutcome::Retargeted(prev) => format!("{shown} (was -> {})", prev.display()),
            FileOutcome::Failed(msg) => format!("{shown}: {msg}"),
            _ => shown,
        };
        out::print_tagged(f.outcome.tag(), &line);
    }

    let s = report.summary();
    out::print_user(&format!(
        "{} changed, {} already in place, {} skipped, {} failed",
        s.changed, s.unchanged, s.skipped, s.failed
    ));
    if report.aborted {
        out::print_warn("aborted; files handled before the abort keep their new state");
    }
    if report.interrupted {
        out::print_warn("interrupted; remaining files were not processed");
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn render_status(ws: &Workspace, details: bool) -> Result<()> {
    let Some(entries) = workflow::status(ws)? else {
        out::print_info("Nothing tracked yet. Add files with `dotsync add <path>`.");
        return Ok(());
    };
    if entries.is_empty() {
        out::print_info("Nothing tracked yet. Add files with `dotsync add <path>`.");
        return Ok(());
    }

    for e in &entries {
        let n = e.files.len();
        out::print_user(&format!(
            "{}  {}  ({} file{}, {})",
            e.name,
            e.root,
            n,
            if n == 1 { "" } else { "s" },
            e.summary()
        ));
        if details {
            for f in &e.files {
                out::print_user(&format!("  {:<9} {}", f.status.tag(), f.rel_path));
            }
        }
    }
    Ok(())
}
