//! Logging setup
//!
//! Human-readable logs go to stderr so stdout stays clean for JSON output.
//! When a log file is configured, the same events are also written as JSON
//! lines through a non-blocking writer over a size-rotated file.

use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{LogConfig, LogLevel};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(String),
}

/// Keeps the background log writer alive; dropping it flushes pending lines
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Installs the global subscriber
///
/// # Arguments
/// * `config` - Level, optional log file and rotation limits
///
/// # Returns
/// A guard that must be held for as long as file logging should run.
pub fn init(config: &LogConfig) -> Result<LogGuard, LoggingError> {
    let filter = create_env_filter(config.level);

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(cfg!(debug_assertions));

    let (file_layer, worker) = match &config.file {
        Some(path) => {
            let writer = SizeRotatingFile::open(path, config.max_bytes, config.keep_files)
                .map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(
        level = config.level.as_str(),
        file = ?config.file,
        "Logging initialized"
    );

    Ok(LogGuard { _worker: worker })
}

/// `RUST_LOG` wins; otherwise the configured level for this crate only
fn create_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "folio={},hyper=warn,reqwest=warn,rusqlite=warn",
            level.as_str()
        ))
    })
}

/// Append-only log file that rotates by size
///
/// Before a write would push the file past `max_bytes`, the file is renamed
/// to `<name>.<timestamp>.bak` and a fresh one is started. Only the newest
/// `keep` backups are retained.
#[derive(Debug)]
pub struct SizeRotatingFile {
    path: PathBuf,
    max_bytes: u64,
    keep: usize,
    file: File,
    written: u64,
}

impl SizeRotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, keep: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            keep,
            file,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotated files, oldest first
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let Some(dir) = self.path.parent() else {
            return Ok(Vec::new());
        };
        let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
        let prefix = format!("{}.", self.file_name());

        let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".bak"))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "folio.log".to_string())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let stamp = Utc::now().format("%Y%m%d%H%M%S%6f");
        let mut backup = self.path.with_file_name(format!("{}.{}.bak", self.file_name(), stamp));
        let mut n = 1;
        while backup.exists() {
            backup = self
                .path
                .with_file_name(format!("{}.{}_{}.bak", self.file_name(), stamp, n));
            n += 1;
        }

        fs::rename(&self.path, &backup)?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        self.prune()
    }

    fn prune(&self) -> io::Result<()> {
        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(self.keep);
        for old in backups.into_iter().take(excess) {
            fs::remove_file(old)?;
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for SizeRotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
