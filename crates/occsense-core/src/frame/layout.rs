//! Byte layout of an OCC poll response frame.
//!
//! Offsets are absolute within the frame. Multi-byte integers are big-endian.

pub const SEQUENCE_OFFSET: usize = 0;
pub const COMMAND_TYPE_OFFSET: usize = 1;
pub const RETURN_STATUS_OFFSET: usize = 2;
pub const DATA_LENGTH_RANGE: std::ops::Range<usize> = 3..5;

pub const STATUS_OFFSET: usize = 5;
pub const EXT_STATUS_OFFSET: usize = 6;
pub const OCCS_PRESENT_OFFSET: usize = 7;
pub const CONFIG_OFFSET: usize = 8;
pub const OCC_STATE_OFFSET: usize = 9;
pub const RESERVED_LOW_RANGE: std::ops::Range<usize> = 10..12;
pub const ERROR_LOG_ID_OFFSET: usize = 12;
pub const ERROR_LOG_ADDR_RANGE: std::ops::Range<usize> = 13..17;
pub const ERROR_LOG_LENGTH_RANGE: std::ops::Range<usize> = 17..19;
pub const RESERVED_HIGH_RANGE: std::ops::Range<usize> = 19..21;
pub const CODE_LEVEL_RANGE: std::ops::Range<usize> = 21..37;
pub const MARKER_RANGE: std::ops::Range<usize> = 37..43;
pub const BLOCK_COUNT_OFFSET: usize = 43;
pub const DATA_VERSION_OFFSET: usize = 44;

/// Size of the fixed header; the first block descriptor starts here.
pub const HEADER_LEN: usize = 45;
/// Bytes preceding the status block (sequence, command, status, length).
pub const RESPONSE_PREAMBLE_LEN: usize = 5;

pub const CODE_LEVEL_LEN: usize = CODE_LEVEL_RANGE.end - CODE_LEVEL_RANGE.start;
pub const MARKER: &[u8; 6] = b"SENSOR";

pub const FRAME_MAX_LEN: usize = 4096;

pub const DESCRIPTOR_LEN: usize = 8;
pub const TAG_LEN: usize = 4;
pub const TAG_TEMPERATURE: &[u8; 4] = b"TEMP";
pub const TAG_FREQUENCY: &[u8; 4] = b"FREQ";
pub const TAG_POWER: &[u8; 4] = b"POWR";

/// Logical size of a temperature/frequency record (id + value).
pub const VALUE_RECORD_LEN: usize = 4;
/// Logical size of a power record (id + update tag + accumulator + value).
pub const POWER_RECORD_LEN: usize = 12;

pub const CHECKSUM_LEN: usize = 2;
