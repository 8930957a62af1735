//! Frame fixtures for tests and golden files.
//!
//! [`FrameBuilder`] assembles synthetic frames and [`encode_response`]
//! re-encodes a decoded [`Response`]. Neither is a device write path; they
//! exist so decoding can be exercised against known byte layouts.

use crate::frame::layout;
use crate::frame::reader::checksum16;
use crate::response::{Block, CodeLevel, FrameHeader, Response, SensorRecord};

/// Reference poll response shipped with the OCC firmware bring-up tools.
///
/// Blocks: `TEMP` (10 records, stride 4), `FREQ` (10 records, stride 4),
/// `POWR` (0 records, stride 12) and an unsupported `CAPS` block (1 record,
/// stride 12), followed by the checksum `0x17c5`.
pub const SAMPLE_FRAME: [u8; 171] = [
    0x69, 0x00, 0x00, 0x00, 0xa4, 0xc3, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x6f, 0x70, 0x5f, 0x6f, 0x63, 0x63, 0x5f, 0x31, 0x35, 0x30, 0x37,
    0x31, 0x36, 0x61, 0x00, 0x00, 0x53, 0x45, 0x4e, 0x53, 0x4f, 0x52, 0x04, 0x01, 0x54, 0x45, 0x4d,
    0x50, 0x00, 0x01, 0x04, 0x0a, 0x00, 0x6a, 0x00, 0x00, 0x00, 0x6c, 0x00, 0x00, 0x00, 0x6d, 0x00,
    0x00, 0x00, 0x6e, 0x00, 0x00, 0x00, 0x6f, 0x00, 0x00, 0x00, 0x70, 0x00, 0x00, 0x00, 0x71, 0x00,
    0x00, 0x00, 0x73, 0x00, 0x00, 0x00, 0x74, 0x00, 0x00, 0x00, 0x75, 0x00, 0x00, 0x46, 0x52, 0x45,
    0x51, 0x00, 0x01, 0x04, 0x0a, 0x00, 0x76, 0x00, 0x00, 0x00, 0x78, 0x00, 0x00, 0x00, 0x79, 0x00,
    0x00, 0x00, 0x7a, 0x00, 0x00, 0x00, 0x7b, 0x00, 0x00, 0x00, 0x7c, 0x00, 0x00, 0x00, 0x7d, 0x00,
    0x00, 0x00, 0x7f, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x81, 0x00, 0x00, 0x50, 0x4f, 0x57,
    0x52, 0x00, 0x01, 0x0c, 0x00, 0x43, 0x41, 0x50, 0x53, 0x00, 0x01, 0x0c, 0x01, 0x00, 0x00, 0x00,
    0x00, 0x04, 0xb0, 0x09, 0x60, 0x04, 0x4c, 0x00, 0x00, 0x17, 0xc5,
];

#[derive(Debug, Clone, Copy)]
enum ChecksumMode {
    Omit,
    Computed,
    Value(u16),
}

#[derive(Debug, Clone)]
struct RawBlock {
    tag: [u8; layout::TAG_LEN],
    format: u8,
    stride: u8,
    record_count: u8,
    body: Vec<u8>,
}

/// Builder for synthetic frames.
///
/// Defaults: sequence 1, marker `SENSOR`, data version 1, no checksum.
/// `block_count` and `data_length` are derived from the added blocks unless
/// overridden.
///
/// # Examples
/// ```
/// use occsense_core::{decode, fixtures::FrameBuilder};
///
/// let frame = FrameBuilder::new()
///     .temperature(4, &[(0x6a, 45), (0x6c, 47)])
///     .power(12, &[(1, 7, 1000, 250)])
///     .build();
/// let response = decode(&frame, None)?;
/// assert_eq!(response.blocks().len(), 2);
/// # Ok::<(), occsense_core::DecodeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    header: FrameHeader,
    marker: [u8; 6],
    block_count: Option<u8>,
    data_length: Option<u16>,
    blocks: Vec<RawBlock>,
    checksum: ChecksumMode,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            header: FrameHeader {
                sequence: 1,
                command_type: 0,
                return_status: 0,
                data_length: 0,
                status: 0,
                ext_status: 0,
                occs_present: 1,
                config: 0,
                occ_state: 1,
                reserved: [0; 4],
                error_log_id: 0,
                error_log_addr: 0,
                error_log_length: 0,
                code_level: code_level("op_occ_test"),
                block_count: 0,
                data_version: 1,
            },
            marker: *layout::MARKER,
            block_count: None,
            data_length: None,
            blocks: Vec::new(),
            checksum: ChecksumMode::Omit,
        }
    }

    pub fn sequence(mut self, sequence: u8) -> Self {
        self.header.sequence = sequence;
        self
    }

    pub fn status(mut self, status: u8) -> Self {
        self.header.status = status;
        self
    }

    pub fn error_log(mut self, id: u8, addr: u32, length: u16) -> Self {
        self.header.error_log_id = id;
        self.header.error_log_addr = addr;
        self.header.error_log_length = length;
        self
    }

    pub fn code_level(mut self, level: &str) -> Self {
        self.header.code_level = code_level(level);
        self
    }

    pub fn marker(mut self, marker: [u8; 6]) -> Self {
        self.marker = marker;
        self
    }

    /// Override the block count written to the header.
    pub fn block_count(mut self, count: u8) -> Self {
        self.block_count = Some(count);
        self
    }

    /// Override the declared data length written to the header.
    pub fn data_length(mut self, length: u16) -> Self {
        self.data_length = Some(length);
        self
    }

    pub fn temperature(self, stride: u8, records: &[(u16, u16)]) -> Self {
        self.value_block(*layout::TAG_TEMPERATURE, stride, records)
    }

    pub fn frequency(self, stride: u8, records: &[(u16, u16)]) -> Self {
        self.value_block(*layout::TAG_FREQUENCY, stride, records)
    }

    /// Add a `POWR` block from `(sensor_id, update_tag, accumulator, value)` tuples.
    pub fn power(self, stride: u8, records: &[(u16, u32, u32, u16)]) -> Self {
        let mut body = Vec::new();
        for (sensor_id, update_tag, accumulator, value) in records {
            let mut record = Vec::with_capacity(layout::POWER_RECORD_LEN);
            record.extend_from_slice(&sensor_id.to_be_bytes());
            record.extend_from_slice(&update_tag.to_be_bytes());
            record.extend_from_slice(&accumulator.to_be_bytes());
            record.extend_from_slice(&value.to_be_bytes());
            push_strided(&mut body, &record, stride);
        }
        self.raw_block(*layout::TAG_POWER, stride, records.len() as u8, &body)
    }

    /// Add a block with an arbitrary tag and body.
    pub fn raw_block(mut self, tag: [u8; 4], stride: u8, record_count: u8, body: &[u8]) -> Self {
        self.blocks.push(RawBlock {
            tag,
            format: 1,
            stride,
            record_count,
            body: body.to_vec(),
        });
        self
    }

    /// Append the checksum the device would compute.
    pub fn with_checksum(mut self) -> Self {
        self.checksum = ChecksumMode::Computed;
        self
    }

    /// Append a fixed checksum value.
    pub fn checksum_value(mut self, value: u16) -> Self {
        self.checksum = ChecksumMode::Value(value);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut header = self.header;
        header.block_count = self
            .block_count
            .unwrap_or_else(|| self.blocks.len().min(usize::from(u8::MAX)) as u8);

        let mut out = Vec::new();
        write_header(&mut out, &header, &self.marker);
        for block in &self.blocks {
            write_descriptor(
                &mut out,
                &block.tag,
                0,
                block.format,
                block.stride,
                block.record_count,
            );
            out.extend_from_slice(&block.body);
        }

        let data_length = self.data_length.unwrap_or_else(|| derived_data_length(&out));
        out[layout::DATA_LENGTH_RANGE].copy_from_slice(&data_length.to_be_bytes());

        match self.checksum {
            ChecksumMode::Omit => {}
            ChecksumMode::Computed => {
                let sum = checksum16(&out);
                out.extend_from_slice(&sum.to_be_bytes());
            }
            ChecksumMode::Value(value) => out.extend_from_slice(&value.to_be_bytes()),
        }
        out
    }

    fn value_block(self, tag: [u8; 4], stride: u8, records: &[(u16, u16)]) -> Self {
        let mut body = Vec::new();
        for (sensor_id, value) in records {
            let mut record = Vec::with_capacity(layout::VALUE_RECORD_LEN);
            record.extend_from_slice(&sensor_id.to_be_bytes());
            record.extend_from_slice(&value.to_be_bytes());
            push_strided(&mut body, &record, stride);
        }
        self.raw_block(tag, stride, records.len() as u8, &body)
    }
}

/// Re-encode a decoded response.
///
/// Each block body is written back as decoded, with the record fields laid
/// over the start of every stride slot, so padding and unknown payloads
/// survive. The stated checksum, when present, is carried over unchanged.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut out = Vec::with_capacity(response.consumed_len() + layout::CHECKSUM_LEN);
    write_header(&mut out, response.header(), layout::MARKER);
    for block in response.blocks() {
        write_block(&mut out, block);
    }
    if let Some(checksum) = response.checksum() {
        out.extend_from_slice(&checksum.stated.to_be_bytes());
    }
    out
}

fn write_header(out: &mut Vec<u8>, header: &FrameHeader, marker: &[u8; 6]) {
    out.push(header.sequence);
    out.push(header.command_type);
    out.push(header.return_status);
    out.extend_from_slice(&header.data_length.to_be_bytes());
    out.push(header.status);
    out.push(header.ext_status);
    out.push(header.occs_present);
    out.push(header.config);
    out.push(header.occ_state);
    out.extend_from_slice(&header.reserved[..2]);
    out.push(header.error_log_id);
    out.extend_from_slice(&header.error_log_addr.to_be_bytes());
    out.extend_from_slice(&header.error_log_length.to_be_bytes());
    out.extend_from_slice(&header.reserved[2..]);
    out.extend_from_slice(header.code_level.as_bytes());
    out.extend_from_slice(marker);
    out.push(header.block_count);
    out.push(header.data_version);
}

fn write_descriptor(
    out: &mut Vec<u8>,
    tag: &[u8; 4],
    reserved: u8,
    format: u8,
    stride: u8,
    record_count: u8,
) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&[reserved, format, stride, record_count]);
}

fn write_block(out: &mut Vec<u8>, block: &Block) {
    let descriptor = block.descriptor();
    write_descriptor(
        out,
        descriptor.tag.as_bytes(),
        descriptor.reserved,
        descriptor.format,
        descriptor.stride,
        descriptor.record_count,
    );
    let body_start = out.len();
    out.extend_from_slice(block.body());
    let stride = usize::from(descriptor.stride);
    for (index, record) in block.records().iter().enumerate() {
        let bytes = record_bytes(record);
        let slot = body_start + index * stride;
        let len = bytes.len().min(stride);
        if let Some(target) = out.get_mut(slot..slot + len) {
            target.copy_from_slice(&bytes[..len]);
        }
    }
}

fn record_bytes(record: &SensorRecord) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(layout::POWER_RECORD_LEN);
    match record {
        SensorRecord::Value(value) => {
            bytes.extend_from_slice(&value.sensor_id.to_be_bytes());
            bytes.extend_from_slice(&value.value.to_be_bytes());
        }
        SensorRecord::Power(power) => {
            bytes.extend_from_slice(&power.sensor_id.to_be_bytes());
            bytes.extend_from_slice(&power.update_tag.to_be_bytes());
            bytes.extend_from_slice(&power.accumulator.to_be_bytes());
            bytes.extend_from_slice(&power.value.to_be_bytes());
        }
    }
    bytes
}

/// Append `record` occupying exactly `stride` bytes (zero padded or cut).
fn push_strided(out: &mut Vec<u8>, record: &[u8], stride: u8) {
    let stride = usize::from(stride);
    let written = record.len().min(stride);
    out.extend_from_slice(&record[..written]);
    out.resize(out.len() + (stride - written), 0);
}

fn code_level(level: &str) -> CodeLevel {
    let mut bytes = [0u8; layout::CODE_LEVEL_LEN];
    let len = level.len().min(bytes.len());
    bytes[..len].copy_from_slice(&level.as_bytes()[..len]);
    CodeLevel::new(bytes)
}

fn derived_data_length(frame: &[u8]) -> u16 {
    let len = frame.len().saturating_sub(layout::RESPONSE_PREAMBLE_LEN);
    u16::try_from(len).unwrap_or(u16::MAX)
}
