//! Decoded poll response model.
//!
//! A [`Response`] is built in one piece by [`crate::decode`] and is read-only
//! afterwards: there is no mutation API, and a new decode always yields a new
//! value. Block lookups by kind follow scan order, so when a tag repeats the
//! later block wins. Blocks without records are never the block of a kind.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::frame::layout;

/// Fixed-width ASCII field, NUL padded on the wire.
///
/// The raw bytes are kept so a field can be re-encoded exactly; display and
/// serialization use the lossy text form with trailing NULs removed.
///
/// # Examples
/// ```
/// use occsense_core::FixedAscii;
///
/// let level = FixedAscii::new(*b"op_occ\0\0");
/// assert_eq!(level.to_string_lossy(), "op_occ");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedAscii<const N: usize>([u8; N]);

impl<const N: usize> FixedAscii<N> {
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0)
            .trim_end_matches('\0')
            .to_string()
    }
}

impl<const N: usize> fmt::Debug for FixedAscii<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl<const N: usize> fmt::Display for FixedAscii<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl<const N: usize> Serialize for FixedAscii<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// Four-character block type tag (e.g. `TEMP`).
pub type BlockTag = FixedAscii<{ layout::TAG_LEN }>;
/// Firmware code level string carried in the header.
pub type CodeLevel = FixedAscii<{ layout::CODE_LEVEL_LEN }>;

/// Fixed-offset header fields preceding the sensor blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameHeader {
    /// Sequence number echoed from the poll command.
    pub sequence: u8,
    pub command_type: u8,
    pub return_status: u8,
    /// Declared length of the data following the 5-byte preamble.
    pub data_length: u16,
    pub status: u8,
    pub ext_status: u8,
    pub occs_present: u8,
    pub config: u8,
    pub occ_state: u8,
    /// Reserved bytes at offsets 10, 11, 19 and 20.
    pub reserved: [u8; 4],
    pub error_log_id: u8,
    pub error_log_addr: u32,
    pub error_log_length: u16,
    pub code_level: CodeLevel,
    /// Number of sensor blocks that follow the header.
    pub block_count: u8,
    pub data_version: u8,
}

/// Record layout selected by a block's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Temperature,
    Frequency,
    Power,
    /// Tag not known to this protocol version; the block body is skipped.
    Unknown,
}

impl BlockKind {
    /// Resolve the kind for a raw tag.
    ///
    /// # Examples
    /// ```
    /// use occsense_core::BlockKind;
    ///
    /// assert_eq!(BlockKind::from_tag(b"TEMP"), BlockKind::Temperature);
    /// assert_eq!(BlockKind::from_tag(b"CAPS"), BlockKind::Unknown);
    /// ```
    pub fn from_tag(tag: &[u8; layout::TAG_LEN]) -> Self {
        match tag {
            t if t == layout::TAG_TEMPERATURE => BlockKind::Temperature,
            t if t == layout::TAG_FREQUENCY => BlockKind::Frequency,
            t if t == layout::TAG_POWER => BlockKind::Power,
            _ => BlockKind::Unknown,
        }
    }
}

/// 8-byte sub-header introducing each sensor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockDescriptor {
    pub tag: BlockTag,
    pub reserved: u8,
    pub format: u8,
    /// Byte distance between successive records; may exceed the record size.
    pub stride: u8,
    pub record_count: u8,
}

impl BlockDescriptor {
    /// Size of the block body that follows the descriptor.
    pub fn body_len(&self) -> usize {
        usize::from(self.stride) * usize::from(self.record_count)
    }

    /// True when the block carries no record data.
    pub fn is_empty(&self) -> bool {
        self.stride == 0 || self.record_count == 0
    }
}

/// Temperature or frequency reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueRecord {
    pub sensor_id: u16,
    pub value: u16,
}

/// Power reading with its update tag and accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerRecord {
    pub sensor_id: u16,
    pub update_tag: u32,
    pub accumulator: u32,
    pub value: u16,
}

/// One decoded sensor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorRecord {
    Value(ValueRecord),
    Power(PowerRecord),
}

impl SensorRecord {
    pub fn sensor_id(&self) -> u16 {
        match self {
            SensorRecord::Value(record) => record.sensor_id,
            SensorRecord::Power(record) => record.sensor_id,
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            SensorRecord::Value(record) => record.value,
            SensorRecord::Power(record) => record.value,
        }
    }

    pub fn as_power(&self) -> Option<&PowerRecord> {
        match self {
            SensorRecord::Power(record) => Some(record),
            SensorRecord::Value(_) => None,
        }
    }
}

/// A decoded sensor block: its descriptor, the records it materialized and
/// the raw body they were read from.
///
/// Empty blocks (zero stride or zero count) and unknown blocks keep their
/// descriptor but hold no records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    #[serde(flatten)]
    descriptor: BlockDescriptor,
    kind: BlockKind,
    records: Vec<SensorRecord>,
    #[serde(skip)]
    body: Vec<u8>,
}

impl Block {
    pub(crate) fn new(
        descriptor: BlockDescriptor,
        records: Vec<SensorRecord>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            kind: BlockKind::from_tag(descriptor.tag.as_bytes()),
            descriptor,
            records,
            body,
        }
    }

    pub fn descriptor(&self) -> &BlockDescriptor {
        &self.descriptor
    }

    pub fn tag(&self) -> BlockTag {
        self.descriptor.tag
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn stride(&self) -> u8 {
        self.descriptor.stride
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    /// Record at `index` (0-based), or `None` when out of range.
    pub fn sensor(&self, index: usize) -> Option<&SensorRecord> {
        self.records.get(index)
    }

    /// Body bytes as carried in the frame (`stride * record_count`), padding
    /// and unknown payloads included.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Checksum trailing the last block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameChecksum {
    /// Value carried in the frame.
    pub stated: u16,
    /// Wrapping 16-bit sum of every byte before the checksum.
    pub computed: u16,
}

impl FrameChecksum {
    pub fn is_valid(&self) -> bool {
        self.stated == self.computed
    }
}

/// A fully decoded poll response.
///
/// # Examples
/// ```
/// use occsense_core::{BlockKind, decode, fixtures::SAMPLE_FRAME};
///
/// let response = decode(&SAMPLE_FRAME, None)?;
/// let temps = response.temperature_block().expect("temperature block");
/// assert_eq!(temps.kind(), BlockKind::Temperature);
/// assert_eq!(temps.records().len(), 10);
/// assert!(response.sensor_by_index(0, 10).is_none());
/// # Ok::<(), occsense_core::DecodeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    header: FrameHeader,
    blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    power_index: Option<usize>,
    consumed_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<FrameChecksum>,
}

impl Response {
    pub(crate) fn new(
        header: FrameHeader,
        blocks: Vec<Block>,
        consumed_len: usize,
        checksum: Option<FrameChecksum>,
    ) -> Self {
        let mut temperature_index = None;
        let mut frequency_index = None;
        let mut power_index = None;
        let populated = blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.records().is_empty());
        for (index, block) in populated {
            match block.kind() {
                BlockKind::Temperature => temperature_index = Some(index),
                BlockKind::Frequency => frequency_index = Some(index),
                BlockKind::Power => power_index = Some(index),
                BlockKind::Unknown => {}
            }
        }
        Self {
            header,
            blocks,
            temperature_index,
            frequency_index,
            power_index,
            consumed_len,
            checksum,
        }
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Blocks in frame order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Index of the last block of `kind` holding at least one record.
    pub fn block_index(&self, kind: BlockKind) -> Option<usize> {
        match kind {
            BlockKind::Temperature => self.temperature_index,
            BlockKind::Frequency => self.frequency_index,
            BlockKind::Power => self.power_index,
            BlockKind::Unknown => None,
        }
    }

    pub fn block_of(&self, kind: BlockKind) -> Option<&Block> {
        self.block_index(kind).and_then(|index| self.block(index))
    }

    pub fn temperature_block(&self) -> Option<&Block> {
        self.block_of(BlockKind::Temperature)
    }

    pub fn frequency_block(&self) -> Option<&Block> {
        self.block_of(BlockKind::Frequency)
    }

    pub fn power_block(&self) -> Option<&Block> {
        self.block_of(BlockKind::Power)
    }

    /// Record `index` (0-based) of block `block`; `None` when either is out of range.
    pub fn sensor_by_index(&self, block: usize, index: usize) -> Option<&SensorRecord> {
        self.block(block).and_then(|block| block.sensor(index))
    }

    /// Bytes covered by the header and all blocks.
    pub fn consumed_len(&self) -> usize {
        self.consumed_len
    }

    pub fn checksum(&self) -> Option<FrameChecksum> {
        self.checksum
    }
}
