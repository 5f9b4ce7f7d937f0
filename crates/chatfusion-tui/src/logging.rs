use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use chatfusion_core::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Overrides the log directory; each process then gets its own file.
pub const LOG_DIR_ENV: &str = "CHATFUSION_LOG_DIR";

const DEFAULT_FILTER: &str = "chatfusion=info,chatfusion_core=info";

/// Route tracing output to a log file. The terminal belongs to the UI, so
/// when no file can be opened logging stays off.
pub fn init() -> Option<PathBuf> {
    let (path, file) = open_log_file()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok()?;

    tracing::info!(path = ?path, version = env!("CARGO_PKG_VERSION"), "tracing initialized");
    Some(path)
}

fn log_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from) {
        return Some(dir.join(format!("chatfusion.{}.log", std::process::id())));
    }
    Config::config_dir()
        .ok()
        .map(|dir| dir.join("logs").join("chatfusion.log"))
}

fn open_log_file() -> Option<(PathBuf, File)> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    Some((path, file))
}
