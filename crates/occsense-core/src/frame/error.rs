use thiserror::Error;

/// Errors returned by frame decoding.
///
/// Every variant is terminal for one decode attempt; no partially decoded
/// response is ever returned alongside an error.
///
/// # Examples
/// ```
/// use occsense_core::{DecodeError, decode};
///
/// let err = decode(&[0u8; 10], None).unwrap_err();
/// assert!(matches!(err, DecodeError::TooShort { needed: 45, actual: 10 }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("frame length {length} exceeds maximum of {max} bytes")]
    FrameTooLong { length: usize, max: usize },
    #[error("declared data length {length} exceeds maximum of {max} bytes")]
    DeclaredLengthExceedsMax { length: u16, max: usize },
    #[error("bad frame marker at byte {offset}: expected \"SENSOR\", got {found:?}")]
    BadFrameMarker { offset: usize, found: String },
    #[error("frame declares no sensor blocks")]
    NoSensorBlocks,
    #[error(
        "truncated header for sensor block {block} at byte {offset}: need {needed} bytes, {remaining} remain"
    )]
    TruncatedBlockHeader {
        block: usize,
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error(
        "truncated record {record} of sensor block {block} at byte {offset}: need {needed} bytes, {remaining} remain"
    )]
    TruncatedSensorRecord {
        block: usize,
        record: usize,
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("allocation failed for {count} {what}")]
    AllocationFailure { what: &'static str, count: usize },
}

/// A bounds violation reported by the frame cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncated {
    pub offset: usize,
    pub needed: usize,
    pub remaining: usize,
}

impl Truncated {
    pub(crate) fn block_header(self, block: usize) -> DecodeError {
        DecodeError::TruncatedBlockHeader {
            block,
            offset: self.offset,
            needed: self.needed,
            remaining: self.remaining,
        }
    }

    pub(crate) fn sensor_record(self, block: usize, record: usize) -> DecodeError {
        DecodeError::TruncatedSensorRecord {
            block,
            record,
            offset: self.offset,
            needed: self.needed,
            remaining: self.remaining,
        }
    }
}

impl From<Truncated> for DecodeError {
    fn from(value: Truncated) -> Self {
        DecodeError::TooShort {
            needed: value.offset + value.needed,
            actual: value.offset + value.remaining,
        }
    }
}
