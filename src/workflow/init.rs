//! `init`: choose the synced folder for this machine and prepare its layout.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{Config, save_config};
use crate::errors::DotsyncError;
use crate::fs_ops::io_error_with_help;
use crate::manifest::Manifest;
use crate::pathutil::Home;
use crate::prompt::{Prompter, confirm};
use crate::storage::{Provider, Storage, validate_storage_dir};

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub provider: Option<Provider>,
    /// Explicit storage folder; wins over provider detection.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub storage_root: PathBuf,
    pub config: Config,
    /// False when storage already held a manifest (second machine).
    pub created_manifest: bool,
}

pub fn init(
    home: &Home,
    config_path: &Path,
    existing: Option<Config>,
    opts: &InitOptions,
    prompter: &mut dyn Prompter,
) -> Result<InitOutcome> {
    if let Some(current) = existing.as_ref().and_then(|c| c.storage_path.as_deref())
        && !confirm(
            prompter,
            &format!("dotsync is already initialized with storage {current}. Reinitialize?"),
        )?
    {
        return Err(DotsyncError::Aborted.into());
    }

    let cwd = env::current_dir().context("resolve current directory")?;
    let chosen = match (&opts.path, opts.provider) {
        (Some(p), _) => home.absolutize(p, &cwd),
        (None, Some(provider)) => match provider.detect(home) {
            Some(found) => found,
            None => ask_path(
                prompter,
                home,
                &cwd,
                &format!("{} was not found in its usual locations.", provider.display_name()),
            )?,
        },
        (None, None) => match Provider::ALL.iter().find_map(|p| p.detect(home)) {
            Some(found) => found,
            None => ask_path(prompter, home, &cwd, "No cloud storage folder was detected.")?,
        },
    };

    validate_storage_dir(&chosen)?;
    let root = dunce::canonicalize(&chosen).map_err(io_error_with_help("resolve storage path", &chosen))?;
    let storage = Storage::new(&root);
    storage.ensure_layout()?;

    let manifest_path = storage.manifest_path();
    let created_manifest = match fs::symlink_metadata(&manifest_path) {
        Ok(_) => {
            let m = Manifest::load(&manifest_path)?;
            info!(entries = m.entries.len(), "found existing manifest");
            false
        }
        Err(_) => {
            Manifest::new().save(&manifest_path)?;
            true
        }
    };

    let mut config = existing.unwrap_or_default();
    config.storage_path = Some(home.contract(&root));
    save_config(&config, config_path)?;
    info!(storage = %root.display(), config = %config_path.display(), "initialized");

    Ok(InitOutcome {
        storage_root: root,
        config,
        created_manifest,
    })
}

fn ask_path(prompter: &mut dyn Prompter, home: &Home, cwd: &Path, why: &str) -> Result<PathBuf> {
    let answer = prompter.ask(&format!("{why}\nPath to your synced folder (q to quit): "))?;
    if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
        return Err(DotsyncError::Aborted.into());
    }
    Ok(home.absolutize(Path::new(&answer), cwd))
}
