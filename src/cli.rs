//! CLI definition and parsing.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - Path arguments are sanitized (stray quotes, one trailing separator) before use.

use clap::{Parser, Subcommand, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, LogLevel};
use crate::storage::Provider;

/// Keep dotfiles in a cloud folder and symlink them into place.
/// CLI flags override config values (loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Sync dotfiles across machines through a cloud folder"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Choose the synced folder for this machine.
    Init {
        /// gdrive, dropbox or icloud
        #[arg(value_name = "PROVIDER")]
        provider: Option<Provider>,

        /// Use this folder instead of detecting one.
        #[arg(long, value_hint = ValueHint::DirPath)]
        path: Option<PathBuf>,
    },

    /// Move a file into storage and replace it with a symlink.
    Add {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,

        /// Entry name (inferred from the path when omitted).
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Do not ask before adding files outside the home directory.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Create symlinks for tracked files on this machine.
    Link {
        /// Only this entry.
        entry: Option<String>,

        /// Back up conflicting files and link without asking.
        #[arg(long)]
        backup: bool,
    },

    /// Replace symlinks with local copies; storage is untouched.
    Unlink {
        /// Only this entry.
        entry: Option<String>,
    },

    /// Show tracked entries and their link status.
    List {
        /// One line per file.
        #[arg(long)]
        details: bool,
    },
}

impl Args {
    /// Strip quoting left behind by shells and one trailing separator.
    pub fn sanitize_path(p: &Path) -> PathBuf {
        Self::sanitize_str(&p.to_string_lossy())
    }

    fn sanitize_str(s: &str) -> PathBuf {
        let trimmed = s.trim();
        let mut inner = if trimmed.len() >= 2
            && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
                || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
        {
            trimmed[1..trimmed.len() - 1].to_string()
        } else {
            trimmed.trim_matches(|c| c == '\'' || c == '"').to_string()
        };

        inner.retain(|c| c != '\'' && c != '"');

        // Remove ONE trailing separator; keep a bare root.
        if (inner.ends_with('\\') || inner.ends_with('/')) && inner.len() > 1 {
            inner.pop();
        }

        PathBuf::from(inner)
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_quotes_and_trailing_separator() {
        assert_eq!(Args::sanitize_path(Path::new("'~/.zshrc'")), PathBuf::from("~/.zshrc"));
        assert_eq!(Args::sanitize_path(Path::new("\"/tmp/a b/\"")), PathBuf::from("/tmp/a b"));
        assert_eq!(Args::sanitize_path(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn debug_flag_beats_log_level() {
        let args = Args::try_parse_from(["dotsync", "--log-level", "quiet", "-d", "list"]).unwrap();
        assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));

        let mut cfg = Config::default();
        Args::try_parse_from(["dotsync", "list", "--log-level", "info"])
            .unwrap()
            .apply_overrides(&mut cfg);
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from(["dotsync", "add", "~/.zshrc", "-n", "zsh", "-y"]).unwrap();
        match args.command {
            Command::Add { path, name, yes } => {
                assert_eq!(path, PathBuf::from("~/.zshrc"));
                assert_eq!(name.as_deref(), Some("zsh"));
                assert!(yes);
            }
            other => panic!("unexpected {other:?}"),
        }

        let args = Args::try_parse_from(["dotsync", "init", "google-drive"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Init { provider: Some(Provider::GoogleDrive), path: None }
        ));
        assert!(Args::try_parse_from(["dotsync", "init", "box"]).is_err());
    }
}
