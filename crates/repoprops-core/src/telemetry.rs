//! Dual-sink logging: coloured console lines and a per-run log file.
//!
//! Call [`init_logging`] once at program start. It creates the output
//! directory, opens `LOG_<manifest>_<DDMmmYYYY_HHMM>.log` inside it and
//! installs a global subscriber with two formatters:
//!
//! - console: `DDMmmYYYY_HHMMSS: <message>`, red for errors, yellow for
//!   warnings, green for successes. Warnings and errors go to stderr.
//! - file: `YYYY-MM-DD HH:MM:SS,mmm - <LEVEL> - : <message>`.
//!
//! A success is an `info!` event carrying `success = true`.
//!
//! Respects `RUST_LOG`; falls back to the supplied level.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use colored::Colorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt, OrElse, WithMaxLevel};
use tracing_subscriber::fmt::{self as subscriber_fmt, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Field that marks an `info!` event as a success.
pub const SUCCESS_FIELD: &str = "success";

const CONSOLE_TIMESTAMP: &str = "%d%b%Y_%H%M%S";
const FILE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S,%3f";
const FILE_NAME_TIMESTAMP: &str = "%d%b%Y_%H%M";

/// Log severity as presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn from_level(level: &Level, success: bool) -> Self {
        match *level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            Level::INFO if success => Severity::Success,
            Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }

    /// Level tag written to the log file.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info | Severity::Success => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// Flattens an event into its message, trailing `key=value` fields and the
/// success flag.
#[derive(Default)]
struct EventText {
    message: String,
    fields: String,
    success: bool,
}

impl EventText {
    fn collect(event: &Event<'_>) -> Self {
        let mut text = EventText::default();
        event.record(&mut text);
        text
    }

    fn rendered(&self) -> String {
        format!("{}{}", self.message, self.fields)
    }
}

impl Visit for EventText {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == SUCCESS_FIELD {
            self.success = value;
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Render a console line, colour included.
pub fn render_console_line(now: &DateTime<Local>, severity: Severity, text: &str) -> String {
    let line = format!("{}: {}", now.format(CONSOLE_TIMESTAMP), text);
    match severity {
        Severity::Error => line.red().to_string(),
        Severity::Warning => line.yellow().to_string(),
        Severity::Success => line.green().to_string(),
        Severity::Info | Severity::Debug => line,
    }
}

/// Render a log file line.
pub fn render_file_line(now: &DateTime<Local>, severity: Severity, text: &str) -> String {
    format!(
        "{} - {} - : {}",
        now.format(FILE_TIMESTAMP),
        severity.file_tag(),
        text
    )
}

/// Console event formatter.
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let text = EventText::collect(event);
        let severity = Severity::from_level(event.metadata().level(), text.success);
        writeln!(
            writer,
            "{}",
            render_console_line(&Local::now(), severity, &text.rendered())
        )
    }
}

/// Log file event formatter.
pub struct FileFormat;

impl<S, N> FormatEvent<S, N> for FileFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let text = EventText::collect(event);
        let severity = Severity::from_level(event.metadata().level(), text.success);
        writeln!(
            writer,
            "{}",
            render_file_line(&Local::now(), severity, &text.rendered())
        )
    }
}

/// `LOG_<manifest stem>_<DDMmmYYYY_HHMM>.log`
pub fn log_file_name(manifest_path: &Path, now: &DateTime<Local>) -> String {
    let stem = manifest_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    format!("LOG_{}_{}.log", stem, now.format(FILE_NAME_TIMESTAMP))
}

/// Create `output_dir` (idempotent) and open the run's log file in it.
pub fn open_log_file(
    output_dir: &Path,
    manifest_path: &Path,
) -> Result<(RollingFileAppender, PathBuf), ConfigError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ConfigError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let file_name = log_file_name(manifest_path, &Local::now());
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.clone())
        .build(output_dir)
        .map_err(|e| ConfigError::LogFile {
            path: output_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok((appender, output_dir.join(file_name)))
}

/// Route warnings and errors to `stderr`, everything else to `stdout`.
pub fn console_writer<E, O>(stderr: E, stdout: O) -> OrElse<WithMaxLevel<E>, O>
where
    E: for<'w> MakeWriter<'w>,
    O: for<'w> MakeWriter<'w>,
{
    stderr.with_max_level(Level::WARN).or_else(stdout)
}

/// Install the global subscriber. Returns the log file path.
///
/// Safe to call more than once; only the first subscriber takes effect.
pub fn init_logging(
    output_dir: &Path,
    manifest_path: &Path,
    level: Level,
) -> Result<PathBuf, ConfigError> {
    let (appender, log_path) = open_log_file(output_dir, manifest_path)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            subscriber_fmt::layer()
                .event_format(ConsoleFormat)
                .with_writer(console_writer(std::io::stderr, std::io::stdout)),
        )
        .with(
            subscriber_fmt::layer()
                .event_format(FileFormat)
                .with_ansi(false)
                .with_writer(appender),
        )
        .try_init()
        .ok();

    Ok(log_path)
}
