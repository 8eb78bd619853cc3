//! Logging setup shared by Asset Relay binaries.
//!
//! Every event goes to a size-rotated file under the relay home; stderr only
//! shows warnings unless `--verbose` is given, so command output on stdout
//! stays readable.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "assetrelay=info,assetrelay_transfer=info";
const VERBOSE_LOG_FILTER: &str = "assetrelay=debug,assetrelay_transfer=debug";
pub const MAX_LOG_FILES: usize = 5;
pub const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub app_name: String,
    pub verbose: bool,
    pub log_dir: PathBuf,
    pub max_files: usize,
    pub max_file_size: u64,
}

impl LogConfig {
    pub fn new(app_name: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            verbose: false,
            log_dir: log_dir.into(),
            max_files: MAX_LOG_FILES,
            max_file_size: MAX_LOG_FILE_SIZE,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Install the global subscriber: rotating file layer plus stderr layer.
///
/// `RUST_LOG` overrides the file filter when set.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let writer = RotatingWriter::open(
        &config.log_dir,
        &config.app_name,
        config.max_files,
        config.max_file_size,
    )
    .with_context(|| format!("Failed to open log file in {}", config.log_dir.display()))?;

    let default_filter = if config.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let console_filter = if config.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// Append-only log file that rolls over to `<name>.log.1 .. <name>.log.N-1`
/// once it would grow past `max_size`.
struct RotatingFile {
    dir: PathBuf,
    stem: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    written: u64,
}

impl RotatingFile {
    fn open(dir: &Path, app_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut log = Self {
            dir: dir.to_path_buf(),
            stem: file_stem(app_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            written: 0,
        };
        log.reopen()?;
        if log.written > log.max_size {
            log.roll_over()?;
        }
        Ok(log)
    }

    fn path(&self, generation: usize) -> PathBuf {
        match generation {
            0 => self.dir.join(format!("{}.log", self.stem)),
            n => self.dir.join(format!("{}.log.{n}", self.stem)),
        }
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(0))?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Shift every generation up by one, dropping the oldest.
    fn roll_over(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        let oldest = self.max_files - 1;
        if oldest == 0 {
            // Single-file mode: start over in place.
            fs::remove_file(self.path(0)).or_else(ignore_missing)?;
        } else {
            fs::remove_file(self.path(oldest)).or_else(ignore_missing)?;
            for generation in (0..oldest).rev() {
                fs::rename(self.path(generation), self.path(generation + 1))
                    .or_else(ignore_missing)?;
            }
        }

        self.reopen()
    }
}

fn ignore_missing(err: io::Error) -> io::Result<()> {
    if err.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(err)
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.roll_over()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Cloneable handle handed to `tracing_subscriber` as a [`MakeWriter`].
#[derive(Clone)]
struct RotatingWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingWriter {
    fn open(dir: &Path, app_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(RotatingFile::open(
                dir, app_name, max_files, max_size,
            )?)),
        })
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut RotatingFile) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut file)
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for RotatingWriter {
    type Writer = RotatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn file_stem(app_name: &str) -> String {
    let stem: String = app_name
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '_',
        })
        .collect();
    if stem.is_empty() {
        "assetrelay".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_append_to_current_file() {
        let temp = TempDir::new().unwrap();
        let mut log = RotatingFile::open(temp.path(), "assetrelay", 3, 1024).unwrap();
        log.write_all(b"first\n").unwrap();
        log.write_all(b"second\n").unwrap();
        log.flush().unwrap();

        let content = fs::read_to_string(temp.path().join("assetrelay.log")).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_rollover_keeps_at_most_max_files() {
        let temp = TempDir::new().unwrap();
        let mut log = RotatingFile::open(temp.path(), "assetrelay", 3, 10).unwrap();
        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            log.write_all(line.as_bytes()).unwrap();
        }
        log.flush().unwrap();

        assert_eq!(
            log_names(temp.path()),
            vec!["assetrelay.log", "assetrelay.log.1", "assetrelay.log.2"]
        );
        let read = |name: &str| fs::read_to_string(temp.path().join(name)).unwrap();
        assert_eq!(read("assetrelay.log"), "dddddddd\n");
        assert_eq!(read("assetrelay.log.1"), "cccccccc\n");
        assert_eq!(read("assetrelay.log.2"), "bbbbbbbb\n");
    }

    #[test]
    fn test_oversized_existing_file_rolls_on_open() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("assetrelay.log"), "x".repeat(64)).unwrap();

        let log = RotatingFile::open(temp.path(), "assetrelay", 2, 16).unwrap();
        assert_eq!(log.written, 0);
        assert_eq!(
            log_names(temp.path()),
            vec!["assetrelay.log", "assetrelay.log.1"]
        );
    }

    #[test]
    fn test_single_file_mode_truncates() {
        let temp = TempDir::new().unwrap();
        let mut log = RotatingFile::open(temp.path(), "relay", 1, 8).unwrap();
        log.write_all(b"12345678").unwrap();
        log.write_all(b"abc").unwrap();
        log.flush().unwrap();

        assert_eq!(log_names(temp.path()), vec!["relay.log"]);
        assert_eq!(
            fs::read_to_string(temp.path().join("relay.log")).unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_shared_writer_serializes_through_one_file() {
        let temp = TempDir::new().unwrap();
        let writer = RotatingWriter::open(temp.path(), "assetrelay", 2, 1024).unwrap();
        let mut a = writer.make_writer();
        let mut b = writer.make_writer();
        a.write_all(b"from a\n").unwrap();
        b.write_all(b"from b\n").unwrap();
        a.flush().unwrap();

        let content = fs::read_to_string(temp.path().join("assetrelay.log")).unwrap();
        assert_eq!(content, "from a\nfrom b\n");
    }

    #[test]
    fn test_file_stem_replaces_path_characters() {
        assert_eq!(file_stem("asset relay/../x"), "asset_relay____x");
        assert_eq!(file_stem(""), "assetrelay");
    }

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::new("assetrelay", "/tmp/logs").verbose(true);
        assert!(config.verbose);
        assert_eq!(config.max_files, MAX_LOG_FILES);
        assert_eq!(config.max_file_size, MAX_LOG_FILE_SIZE);
    }
}
