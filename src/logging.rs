//! Logging setup
//!
//! Installs a `tracing` subscriber with:
//! - an `EnvFilter` taken from `RUST_LOG`, or from the verbosity flag when
//!   `RUST_LOG` is unset
//! - a console layer on stderr
//! - optionally a plain-text file layer appending to `<log_dir>/trainer.log`
//!
//! Components log with bracketed prefixes (`[SELFPLAY]`, `[TRAIN]`,
//! `[ENGINE]`, ...) so one component can be grepped out of a long run.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file name inside the log directory
pub const LOG_FILENAME: &str = "trainer.log";

/// Default filter directive for a verbosity count (`-v` flags)
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn open_log_file(log_dir: &Path) -> std::io::Result<File> {
    fs::create_dir_all(log_dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILENAME))
}

/// Install the global subscriber
///
/// Fails when a subscriber is already installed. A log file that cannot be
/// opened only disables the file layer.
pub fn init(verbosity: u8, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let mut file_error = None;
    let file_layer = log_dir.and_then(|dir| match open_log_file(dir) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(e) => {
            file_error = Some((dir.to_path_buf(), e));
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    if let Some((dir, e)) = file_error {
        tracing::warn!("[LOG] Could not open log file in {:?}: {}", dir, e);
    }
    Ok(())
}
