//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to stderr and to a log file in
//! the app log directory. The file is rotated by size: `<name>.log` is the
//! current file, `<name>.1.log` the previous one, and so on up to a fixed count.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Rotate once the current file would grow past this size
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;
/// Number of files kept, current one included
pub const DEFAULT_MAX_FILES: usize = 5;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log file error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to install logger: {0}")]
    Init(String),
}

/// Size-rotated log file
pub struct RollingFileWriter {
    dir: PathBuf,
    name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RollingFileWriter {
    pub fn new(dir: impl Into<PathBuf>, name: &str, max_bytes: u64, max_files: usize) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let path = file_path(&dir, name, 0);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir,
            name: name.to_string(),
            max_bytes,
            max_files: max_files.max(1),
            file,
            written,
        })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        file_path(&self.dir, &self.name, 0)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        // With a single file the truncating reopen below is enough
        let oldest = file_path(&self.dir, &self.name, self.max_files - 1);
        if self.max_files > 1 && oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.max_files - 1).rev() {
            let from = file_path(&self.dir, &self.name, index);
            if from.exists() {
                fs::rename(&from, file_path(&self.dir, &self.name, index + 1))?;
            }
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.current_path())?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFileWriter {
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

fn file_path(dir: &Path, name: &str, index: usize) -> PathBuf {
    if index == 0 {
        dir.join(format!("{}.log", name))
    } else {
        dir.join(format!("{}.{}.log", name, index))
    }
}

/// Local wall-clock timestamps
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        use std::fmt::Write as _;
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    let writer = RollingFileWriter::new(log_dir, app_name, DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES)?;
    let log_path = writer.current_path();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_writer(io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(LocalTime)
                .with_writer(Mutex::new(writer)),
        )
        .try_init()
        .map_err(|e| LoggerError::Init(e.to_string()))?;

    tracing::info!("Logging to {}", log_path.display());
    Ok(())
}

/// Log an info line
pub fn info(message: &str) {
    tracing::info!("{}", message);
}

/// Log an error line
pub fn error(message: &str) {
    tracing::error!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingFileWriter::new(dir.path(), "app", 10, 3).unwrap();

        writer.write_all(b"first\n").unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.write_all(b"third\n").unwrap();
        writer.write_all(b"fourth\n").unwrap();
        writer.flush().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("app.log"), "fourth\n");
        assert_eq!(read("app.1.log"), "third\n");
        assert_eq!(read("app.2.log"), "second\n");
        assert!(!dir.path().join("app.3.log").exists());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut writer = RollingFileWriter::new(dir.path(), "app", 1024, 2).unwrap();
            writer.write_all(b"one\n").unwrap();
        }
        let mut writer = RollingFileWriter::new(dir.path(), "app", 1024, 2).unwrap();
        writer.write_all(b"two\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(writer.current_path()).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_single_file_limit_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingFileWriter::new(dir.path(), "app", 4, 1).unwrap();
        writer.write_all(b"abcd").unwrap();
        writer.write_all(b"efgh").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("app.log")).unwrap(), "efgh");
        assert!(!dir.path().join("app.1.log").exists());
    }
}
