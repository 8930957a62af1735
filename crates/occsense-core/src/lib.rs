//! occsense core library: OCC sensor telemetry frame decoding.
//!
//! An On-Chip Controller periodically publishes power, thermal and frequency
//! readings as a self-describing binary frame. This crate turns one such
//! frame into a strongly-typed [`Response`]:
//! frame sources deliver raw bytes, the `frame` decoder (layout/reader/parser)
//! validates and walks them, and higher layers read the result directly,
//! through named [`Attribute`]s, or via a rate-limited [`SensorCache`].
//! Decoding is byte-oriented and side-effect free; all I/O is isolated in
//! `source` modules.
//!
//! Invariants:
//! - No read ever goes past the end of the input buffer.
//! - Records advance by the block's declared stride, not their logical size.
//! - A failed decode returns an error and nothing else.
//! - Unknown block types are skipped, never fatal.
//!
//! # Examples
//! ```no_run
//! use occsense_core::{FileFrameSource, FrameSource, decode};
//!
//! let frame = FileFrameSource::new("frame.bin").read_frame()?;
//! let response = decode(&frame, None)?;
//! if let Some(temps) = response.temperature_block() {
//!     println!("{} temperature sensors", temps.records().len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::Serialize;

pub mod attributes;
pub mod cache;
pub mod fixtures;
pub mod frame;
pub mod response;
mod source;

pub use attributes::{Attribute, AttributeError, AttributeField, AttributeValue, read_attribute};
pub use cache::{CacheConfig, CacheError, SensorCache};
pub use frame::decode;
pub use frame::error::DecodeError;
pub use response::{
    Block, BlockDescriptor, BlockKind, BlockTag, CodeLevel, FixedAscii, FrameChecksum,
    FrameHeader, PowerRecord, Response, SensorRecord, ValueRecord,
};
pub use source::{FileFrameSource, FrameSource, SourceError, StaticFrameSource};

/// Current decode report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the caller supplies none.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Versioned JSON envelope around one decoded frame.
///
/// # Examples
/// ```
/// use occsense_core::{decode, fixtures::SAMPLE_FRAME, make_decode_report};
///
/// let response = decode(&SAMPLE_FRAME, None)?;
/// let report = make_decode_report("frame.bin", SAMPLE_FRAME.len() as u64, response);
/// assert_eq!(report.report_version, occsense_core::REPORT_VERSION);
/// # Ok::<(), occsense_core::DecodeError>(())
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    /// Input frame metadata.
    pub input: InputInfo,
    /// The decoded frame.
    pub response: Response,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use occsense_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "occsense".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "occsense");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input frame metadata embedded in reports.
#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Wrap a decoded response in a report with base fields filled.
pub fn make_decode_report(input_path: &str, input_bytes: u64, response: Response) -> DecodeReport {
    DecodeReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "occsense".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        response,
    }
}
