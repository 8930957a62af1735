//! Diagnostic logging for the `occsense` binary.
//!
//! Events go to stderr so reports written with `--stdout` stay clean JSON.
//! `--log-level` sets the default verbosity; `--log-filter` (or
//! `OCCSENSE_LOG`) adds per-target directives such as
//! `occsense_core::frame=trace` on top of it.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Environment variable read for `--log-filter`.
pub const LOG_FILTER_ENV: &str = "OCCSENSE_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn build_filter(level: LogLevel, directives: Option<&str>) -> Result<EnvFilter, ParseError> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .parse(directives.unwrap_or_default())
}

/// Install the stderr subscriber; a second call is a no-op.
///
/// Event targets are printed only when per-target directives are given.
///
/// # Errors
/// Returns the parse error of a malformed `directives` string.
pub fn init_logging(
    format: LogFormat,
    level: LogLevel,
    directives: Option<&str>,
) -> Result<(), ParseError> {
    let filter = build_filter(level, directives)?;
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(directives.is_some());

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
    Ok(())
}
