//! Tracing initialization.
//!
//! One registry with an EnvFilter, a console layer on stderr and, when the log
//! file can be opened safely, a non-blocking file layer. `--json` switches both
//! layers to JSON. The level comes from LogLevel only; RUST_LOG is ignored.

use anyhow::Result;
use chrono::Local;
use dotsync::config::{LogLevel, default_log_path, path_has_symlink_ancestor};
use dotsync::output as out;
use dotsync::platform::open_log_file_secure_append;
use std::fmt as stdfmt;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// DD/MM/YY HH:MM:SS in local time.
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

fn filter_for(lvl: LogLevel) -> EnvFilter {
    EnvFilter::new(match lvl {
        LogLevel::Quiet => "error",
        LogLevel::Normal => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
    })
}

/// Open the log file for a non-blocking writer, or say on stderr why not.
fn open_file_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            eprintln!(
                "Refusing to enable file logging: ancestor of {} is a symlink; proceeding without file logging.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!(
                "Error checking log path {} for symlinks: {e}; proceeding without file logging.",
                path.display()
            );
            return None;
        }
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", path.display());
            None
        }
    }
}

/// Install the global subscriber. The returned guard flushes the file layer
/// when dropped, so hold it until exit.
pub fn init_tracing(lvl: LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let opened = log_file.and_then(open_file_writer);
    if opened.is_none()
        && let Some(path) = log_file
    {
        out::print_warn(&format!(
            "File logging to '{}' was not enabled. Check that the parent directory is writable and that no ancestor is a symlink.",
            path.display()
        ));
        if let Ok(def) = default_log_path()
            && def != path
        {
            out::print_info(&format!("The default log path is {}", def.display()));
        }
    }
    let (writer, guard) = opened.unzip();

    // Exactly one of each pair is Some; a None layer is a no-op.
    let console_text = (!json).then(|| {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_target(false)
            .compact()
            .with_writer(io::stderr)
    });
    let console_json = json.then(|| {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_target(false)
            .with_writer(io::stderr)
    });
    let (file_text, file_json) = match writer {
        Some(w) if json => (
            None,
            Some(
                tsfmt::layer()
                    .event_format(tsfmt::format().json())
                    .with_timer(LocalHumanTime)
                    .with_writer(w),
            ),
        ),
        Some(w) => (
            Some(
                tsfmt::layer()
                    .with_timer(LocalHumanTime)
                    .with_ansi(false)
                    .compact()
                    .with_writer(w),
            ),
            None,
        ),
        None => (None, None),
    };

    registry()
        .with(filter_for(lvl))
        .with(console_text)
        .with(console_json)
        .with(file_text)
        .with(file_json)
        .try_init()?;
    Ok(guard)
}
