//! Diagnostic logging with time-based file rotation
//!
//! The process-wide subscriber carries two sinks: a console layer and a
//! file layer. The file layer writes through a [`SwappableWriter`], a
//! shared handle that the controller swaps for a freshly named file when
//! the rotation interval elapses. The swap replaces the handle under a
//! write lock held only for the replacement; individual log writes take
//! the read lock, so a message lands in exactly one file — whichever was
//! active when it was emitted — and none are lost across the swap.
//!
//! Line format (comma separated):
//! relative-ms, timestamp, level, process id, thread name, module, message

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use parking_lot::RwLock;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::DebugLevel;
use crate::error::{Result, RotationError};

/// Build the path for a new log file.
///
/// `<folder>/<prefix>_<YYYY-MM-DD_HHMMSS>.<ext>`, with spaces in folder
/// and prefix replaced by underscores. Creates the folder if missing.
pub fn log_file_path(folder: &str, prefix: &str, extension: &str) -> Result<PathBuf> {
    let folder = folder.replace(' ', "_");
    let prefix = prefix.replace(' ', "_");

    std::fs::create_dir_all(&folder).map_err(|e| RotationError::CreateFolder {
        path: folder.clone(),
        reason: e.to_string(),
    })?;

    let stamp = Local::now().format("%Y-%m-%d_%H%M%S");
    Ok(PathBuf::from(folder).join(format!("{prefix}_{stamp}.{extension}")))
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            RotationError::OpenFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// File sink handle whose underlying file can be swapped at runtime
#[derive(Clone)]
pub struct SwappableWriter {
    inner: Arc<RwLock<File>>,
}

impl SwappableWriter {
    pub fn new(file: File) -> Self {
        Self {
            inner: Arc::new(RwLock::new(file)),
        }
    }

    /// Install `file` as the active sink. The displaced handle closes
    /// when it drops, after the replacement is already in place.
    pub fn swap(&self, file: File) {
        let mut guard = self.inner.write();
        *guard = file;
    }
}

impl io::Write for SwappableWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.inner.read()).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.inner.read()).flush()
    }
}

impl<'a> MakeWriter<'a> for SwappableWriter {
    type Writer = SwappableWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Comma-separated event formatter shared by the console and file layers
#[derive(Clone, Copy)]
pub struct CsvFormat {
    epoch: Instant,
}

impl CsvFormat {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, N> FormatEvent<S, N> for CsvFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let thread = std::thread::current();
        write!(
            writer,
            "{},{},{},{},{},{},",
            self.epoch.elapsed().as_millis(),
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            meta.level(),
            std::process::id(),
            thread.name().unwrap_or("unnamed"),
            meta.target(),
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Rotation state: which file is active and when it was installed
pub struct LogRotator {
    writer: SwappableWriter,
    folder: String,
    prefix: String,
    extension: String,
    active_path: PathBuf,
    interval: Duration,
    started_at: Instant,
}

impl LogRotator {
    /// Currently active log file
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// Whether the configured interval has elapsed since the last swap
    pub fn due(&self) -> bool {
        self.started_at.elapsed() > self.interval
    }

    /// Swap in a freshly named log file and reset the rotation clock.
    ///
    /// The new file is opened before the old handle is displaced, so a
    /// failure here leaves the previous sink intact (and is fatal to the
    /// caller: the diagnostic channel itself is compromised).
    pub fn rotate(&mut self) -> Result<PathBuf> {
        let path = log_file_path(&self.folder, &self.prefix, &self.extension)?;
        let file = open_log_file(&path)?;
        self.writer.swap(file);
        self.active_path = path.clone();
        self.started_at = Instant::now();
        Ok(path)
    }

    /// Rotation check run once per controller iteration
    pub fn check(&mut self) -> Result<Option<PathBuf>> {
        if self.due() {
            let path = self.rotate()?;
            tracing::info!("log rotated to {}", path.display());
            return Ok(Some(path));
        }
        Ok(None)
    }
}

/// Install the process-wide subscriber and return the rotation handle.
///
/// Console and file layers share the CSV formatter; `RUST_LOG` overrides
/// the configured debug level when set. Call once at startup.
pub fn init(
    debug_level: DebugLevel,
    folder: &str,
    prefix: &str,
    extension: &str,
    interval: Duration,
) -> Result<LogRotator> {
    let active_path = log_file_path(folder, prefix, extension)?;
    let file = open_log_file(&active_path)?;
    let writer = SwappableWriter::new(file);
    let format = CsvFormat::new();

    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| debug_level.filter_directive().into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_ansi(false)
                .with_writer(writer.clone()),
        )
        .init();

    tracing::info!("logger initiated: {}", active_path.display());

    Ok(LogRotator {
        writer,
        folder: folder.to_string(),
        prefix: prefix.to_string(),
        extension: extension.to_string(),
        active_path,
        interval,
        started_at: Instant::now(),
    })
}
