use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use occsense_core::{
    Attribute, AttributeError, CacheConfig, CacheError, DEFAULT_GENERATED_AT, DecodeError,
    FileFrameSource, FrameSource, SensorCache, decode, fixtures::SAMPLE_FRAME,
    make_decode_report, read_attribute,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;

mod logging;

use logging::{LOG_FILTER_ENV, LogFormat, LogLevel, init_logging};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("OCCSENSE_BUILD_COMMIT"),
    ", ",
    env!("OCCSENSE_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  occsense frame decode frame.bin -o report.json\n  occsense frame decode frame.bin --stdout --pretty\n  occsense frame attr frame.bin temp1_input temp1_label\n  occsense frame sample -o sample.bin";

#[derive(Parser, Debug)]
#[command(name = "occsense")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for OCC sensor telemetry frames (temperature / frequency / power).",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log verbosity (stderr)
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "warn",
        env = "OCCSENSE_LOG_LEVEL"
    )]
    log_level: LogLevel,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "text",
        env = "OCCSENSE_LOG_FORMAT"
    )]
    log_format: LogFormat,

    /// Per-target log directives, e.g. `occsense_core::frame=trace`
    #[arg(long, global = true, env = LOG_FILTER_ENV)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on captured OCC poll response frames.
    Frame {
        #[command(subcommand)]
        command: FrameCommands,
    },
}

#[derive(Subcommand, Debug)]
enum FrameCommands {
    /// Decode a frame and write a versioned JSON report.
    #[command(after_help = EXAMPLES)]
    Decode {
        /// Path to a .bin frame capture
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Print named sensor attributes (e.g. temp1_input, temp1_label, all).
    Attr {
        /// Path to a .bin frame capture
        input: PathBuf,

        /// Attribute names, printed one value per line in order
        #[arg(required = true)]
        names: Vec<String>,

        /// Minimum interval between frame re-reads, in milliseconds
        #[arg(long, default_value_t = 1000, env = "OCCSENSE_REFRESH_MS")]
        refresh_ms: u64,
    },
    /// Write the reference sample frame to a file.
    Sample {
        /// Output frame path
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_format, cli.log_level, cli.log_filter.as_deref()) {
        return report_error(CliError::new(
            format!("invalid log filter: {}", err),
            Some("use directives such as `occsense_core=debug,occsense=info`".to_string()),
        ));
    }

    let result = match cli.command {
        Commands::Frame { command } => match command {
            FrameCommands::Decode {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
            } => cmd_frame_decode(input, report, stdout, pretty, compact, quiet),
            FrameCommands::Attr {
                input,
                names,
                refresh_ms,
            } => cmd_frame_attr(input, names, refresh_ms),
            FrameCommands::Sample {
                output,
                force,
                quiet,
            } => cmd_frame_sample(output, force, quiet),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(err),
    }
}

fn report_error(err: CliError) -> ExitCode {
    eprintln!("error: {}", err.message);
    if let Some(hint) = err.hint {
        eprintln!("hint: {}", hint);
    }
    ExitCode::from(2)
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<DecodeError> for CliError {
    fn from(err: DecodeError) -> Self {
        let hint = match err {
            DecodeError::BadFrameMarker { .. } => "input is not an OCC sensor poll response",
            DecodeError::TooShort { .. }
            | DecodeError::TruncatedBlockHeader { .. }
            | DecodeError::TruncatedSensorRecord { .. } => {
                "the capture ends early; re-read the frame from the device"
            }
            DecodeError::FrameTooLong { .. } | DecodeError::DeclaredLengthExceedsMax { .. } => {
                "frames are at most 4096 bytes"
            }
            DecodeError::NoSensorBlocks => "the device reported no sensor data",
            DecodeError::AllocationFailure { .. } => "retry with more free memory",
        };
        CliError::new(format!("frame decode failed: {}", err), Some(hint.to_string()))
    }
}

impl From<CacheError> for CliError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Decode(err) => err.into(),
            CacheError::Source(err) => CliError::new(
                format!("failed to read frame: {}", err),
                Some("use a .bin frame capture of at most 4096 bytes".to_string()),
            ),
        }
    }
}

impl From<AttributeError> for CliError {
    fn from(err: AttributeError) -> Self {
        let hint = match err {
            AttributeError::UnknownName { .. } => {
                "expected all, temp<N>_input, temp<N>_label, freq<N>_input, freq<N>_label, power<N>_input or power<N>_label"
            }
            AttributeError::Unavailable { .. } => "use the `all` attribute to list available sensors",
        };
        CliError::new(err.to_string(), Some(hint.to_string()))
    }
}

fn cmd_frame_decode(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        let report_abs = report_path
            .parent()
            .map(|parent| {
                if parent.as_os_str().is_empty() {
                    fs::canonicalize(".")
                } else {
                    fs::canonicalize(parent)
                }
            })
            .transpose()
            .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
        if let Some(report_dir) = report_abs {
            let report_target = report_dir.join(
                report_path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
            );
            if report_target == input_abs {
                return Err(CliError::new(
                    format!(
                        "report path must differ from input: {}",
                        report_path.display()
                    ),
                    Some("choose a different output path".to_string()),
                ));
            }
        }
    }

    info!(path = %resolved_input.display(), "decoding frame");
    let frame = FileFrameSource::new(&resolved_input)
        .read_frame()
        .map_err(CacheError::Source)?;
    let response = decode(&frame, None)?;
    let mut rep = make_decode_report(
        &resolved_input.display().to_string(),
        frame.len() as u64,
        response,
    );
    rep.generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string());
    let json = serialize_report(&rep, pretty, compact)?;

    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    Ok(())
}

fn cmd_frame_attr(input: PathBuf, names: Vec<String>, refresh_ms: u64) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let attributes = names
        .iter()
        .map(|name| name.parse::<Attribute>())
        .collect::<Result<Vec<_>, _>>()?;

    let config = CacheConfig {
        min_refresh_interval: Duration::from_millis(refresh_ms),
    };
    let cache = SensorCache::new(FileFrameSource::new(&resolved_input), config);
    for attribute in attributes {
        let response = cache.current()?;
        let value = read_attribute(&response, attribute)?;
        println!("{}", value);
    }
    Ok(())
}

fn cmd_frame_sample(output: PathBuf, force: bool, quiet: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        return Err(CliError::new(
            format!("output already exists: {}", output.display()),
            Some("pass --force to overwrite".to_string()),
        ));
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&output, SAMPLE_FRAME)
        .with_context(|| format!("Failed to write sample frame: {}", output.display()))?;
    if !quiet {
        eprintln!("OK: sample frame written -> {}", output.display());
    }
    Ok(())
}

fn serialize_report(
    rep: &occsense_core::DecodeReport,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .bin frame capture".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .bin frame capture".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "bin" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .bin frame capture".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected a .bin frame capture".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single frame file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
