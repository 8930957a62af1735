use tracing::{debug, trace, warn};

use super::error::{DecodeError, Truncated};
use super::layout;
use super::reader::{FrameCursor, RecordWindow, checksum16};
use crate::response::{
    Block, BlockDescriptor, BlockKind, BlockTag, CodeLevel, FrameChecksum, FrameHeader,
    PowerRecord, Response, SensorRecord, ValueRecord,
};

/// Decode one poll response frame.
///
/// `hint` is the number of valid bytes delivered by the transport, when it
/// differs from `raw.len()`; bytes past the hint are ignored. Decoding is
/// pure: it performs no I/O and returns either a complete [`Response`] or a
/// [`DecodeError`], never a partial result.
///
/// # Errors
/// Returns a distinct [`DecodeError`] variant for each kind of malformed
/// input (short buffer, oversized length, bad marker, missing blocks,
/// truncated descriptor or record) and for allocation failure.
///
/// # Examples
/// ```
/// use occsense_core::{decode, fixtures::SAMPLE_FRAME};
///
/// let response = decode(&SAMPLE_FRAME, None)?;
/// assert_eq!(response.blocks().len(), 4);
/// assert_eq!(response.header().code_level.to_string_lossy(), "op_occ_150716a");
/// # Ok::<(), occsense_core::DecodeError>(())
/// ```
pub fn decode(raw: &[u8], hint: Option<usize>) -> Result<Response, DecodeError> {
    let frame = frame_window(raw, hint)?;
    if frame.len() < layout::HEADER_LEN {
        return Err(DecodeError::TooShort {
            needed: layout::HEADER_LEN,
            actual: frame.len(),
        });
    }

    let mut cursor = FrameCursor::new(frame);
    let header = decode_header(&mut cursor)?;
    if header.block_count == 0 {
        return Err(DecodeError::NoSensorBlocks);
    }

    let block_count = usize::from(header.block_count);
    let mut blocks = reserve("sensor blocks", block_count)?;
    for index in 0..block_count {
        blocks.push(decode_block(&mut cursor, index)?);
    }

    let consumed_len = cursor.position();
    let checksum = read_checksum(&mut cursor);
    if let Some(checksum) = checksum.filter(|checksum| !checksum.is_valid()) {
        warn!(
            stated = checksum.stated,
            computed = checksum.computed,
            "frame checksum mismatch"
        );
    }

    debug!(
        sequence = header.sequence,
        blocks = blocks.len(),
        consumed_len,
        "decoded sensor frame"
    );
    Ok(Response::new(header, blocks, consumed_len, checksum))
}

fn frame_window(raw: &[u8], hint: Option<usize>) -> Result<&[u8], DecodeError> {
    let length = hint.unwrap_or(raw.len());
    if length > layout::FRAME_MAX_LEN {
        return Err(DecodeError::FrameTooLong {
            length,
            max: layout::FRAME_MAX_LEN,
        });
    }
    raw.get(..length).ok_or(DecodeError::TooShort {
        needed: length,
        actual: raw.len(),
    })
}

fn decode_header(cursor: &mut FrameCursor<'_>) -> Result<FrameHeader, DecodeError> {
    let sequence = cursor.read_u8()?;
    let command_type = cursor.read_u8()?;
    let return_status = cursor.read_u8()?;
    let data_length = cursor.read_u16_be()?;
    if usize::from(data_length) > layout::FRAME_MAX_LEN {
        return Err(DecodeError::DeclaredLengthExceedsMax {
            length: data_length,
            max: layout::FRAME_MAX_LEN,
        });
    }

    let status = cursor.read_u8()?;
    let ext_status = cursor.read_u8()?;
    let occs_present = cursor.read_u8()?;
    let config = cursor.read_u8()?;
    let occ_state = cursor.read_u8()?;
    let [reserved0, reserved1] = cursor.read_array::<2>()?;
    let error_log_id = cursor.read_u8()?;
    let error_log_addr = cursor.read_u32_be()?;
    let error_log_length = cursor.read_u16_be()?;
    let [reserved2, reserved3] = cursor.read_array::<2>()?;
    let code_level = CodeLevel::new(cursor.read_array()?);

    let marker_offset = cursor.position();
    let marker = cursor.take(layout::MARKER.len())?;
    if marker != layout::MARKER {
        return Err(DecodeError::BadFrameMarker {
            offset: marker_offset,
            found: String::from_utf8_lossy(marker).into_owned(),
        });
    }

    let block_count = cursor.read_u8()?;
    let data_version = cursor.read_u8()?;

    Ok(FrameHeader {
        sequence,
        command_type,
        return_status,
        data_length,
        status,
        ext_status,
        occs_present,
        config,
        occ_state,
        reserved: [reserved0, reserved1, reserved2, reserved3],
        error_log_id,
        error_log_addr,
        error_log_length,
        code_level,
        block_count,
        data_version,
    })
}

fn decode_descriptor(
    cursor: &mut FrameCursor<'_>,
    index: usize,
) -> Result<BlockDescriptor, DecodeError> {
    let bytes: [u8; layout::DESCRIPTOR_LEN] = cursor
        .read_array()
        .map_err(|err| err.block_header(index))?;
    let [t0, t1, t2, t3, reserved, format, stride, record_count] = bytes;
    Ok(BlockDescriptor {
        tag: BlockTag::new([t0, t1, t2, t3]),
        reserved,
        format,
        stride,
        record_count,
    })
}

/// Record layout of a block kind the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordLayout {
    /// `TEMP` and `FREQ`: id, value.
    Value,
    /// `POWR`: id, update tag, accumulator, value.
    Power,
}

impl RecordLayout {
    fn for_kind(kind: BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Temperature | BlockKind::Frequency => Some(RecordLayout::Value),
            BlockKind::Power => Some(RecordLayout::Power),
            BlockKind::Unknown => None,
        }
    }
}

fn reserve<T>(what: &'static str, count: usize) -> Result<Vec<T>, DecodeError> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(count)
        .map_err(|_| DecodeError::AllocationFailure { what, count })?;
    Ok(items)
}

fn decode_block(cursor: &mut FrameCursor<'_>, index: usize) -> Result<Block, DecodeError> {
    let descriptor = decode_descriptor(cursor, index)?;
    let kind = BlockKind::from_tag(descriptor.tag.as_bytes());
    debug!(
        block = index,
        tag = %descriptor.tag,
        records = descriptor.record_count,
        stride = descriptor.stride,
        "sensor block"
    );

    if descriptor.is_empty() {
        return Ok(Block::new(descriptor, Vec::new(), Vec::new()));
    }

    let mut body = reserve("block body", descriptor.body_len())?;
    let Some(record_layout) = RecordLayout::for_kind(kind) else {
        warn!(block = index, tag = %descriptor.tag, "sensor block type not supported, skipping");
        let skipped = cursor
            .take(descriptor.body_len())
            .map_err(|err| err.sensor_record(index, 0))?;
        body.extend_from_slice(skipped);
        return Ok(Block::new(descriptor, Vec::new(), body));
    };

    let count = usize::from(descriptor.record_count);
    let stride = usize::from(descriptor.stride);
    let mut records = reserve("sensor records", count)?;
    for record in 0..count {
        let window_offset = cursor.position();
        let window = cursor
            .take(stride)
            .map_err(|err| err.sensor_record(index, record))?;
        let decoded = decode_record(record_layout, window).map_err(|err| {
            DecodeError::TruncatedSensorRecord {
                block: index,
                record,
                offset: window_offset + err.offset,
                needed: err.needed,
                remaining: err.remaining,
            }
        })?;
        trace!(
            block = index,
            record,
            sensor_id = decoded.sensor_id(),
            value = decoded.value(),
            "sensor record"
        );
        body.extend_from_slice(window);
        records.push(decoded);
    }

    Ok(Block::new(descriptor, records, body))
}

/// Decode one record from the start of its stride window.
///
/// A stride shorter than the layout's logical size cannot hold the record and
/// is reported as truncated.
fn decode_record(
    record_layout: RecordLayout,
    window: &[u8],
) -> Result<SensorRecord, Truncated> {
    let mut reader = RecordWindow::new(window);
    match record_layout {
        RecordLayout::Power => Ok(SensorRecord::Power(PowerRecord {
            sensor_id: reader.read_u16_be()?,
            update_tag: reader.read_u32_be()?,
            accumulator: reader.read_u32_be()?,
            value: reader.read_u16_be()?,
        })),
        RecordLayout::Value => Ok(SensorRecord::Value(ValueRecord {
            sensor_id: reader.read_u16_be()?,
            value: reader.read_u16_be()?,
        })),
    }
}

fn read_checksum(cursor: &mut FrameCursor<'_>) -> Option<FrameChecksum> {
    if cursor.remaining() < layout::CHECKSUM_LEN {
        return None;
    }
    let computed = checksum16(cursor.consumed());
    let stated = cursor.read_u16_be().ok()?;
    Some(FrameChecksum { stated, computed })
}

#[cfg(test)]
mod tests {
    use super::decode;
    use crate::frame::error::DecodeError;
    use crate::frame::layout;
    use crate::fixtures::{FrameBuilder, SAMPLE_FRAME};
    use crate::response::BlockKind;

    #[test]
    fn decode_sample_frame() {
        let response = decode(&SAMPLE_FRAME, None).unwrap();
        let header = response.header();
        assert_eq!(header.sequence, 0x69);
        assert_eq!(header.data_length, 0x00a4);
        assert_eq!(header.status, 0xc3);
        assert_eq!(header.occs_present, 3);
        assert_eq!(header.occ_state, 1);
        assert_eq!(header.block_count, 4);
        assert_eq!(header.data_version, 1);

        let kinds: Vec<_> = response.blocks().iter().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Temperature,
                BlockKind::Frequency,
                BlockKind::Power,
                BlockKind::Unknown
            ]
        );
        assert_eq!(response.consumed_len(), 169);
        let checksum = response.checksum().unwrap();
        assert_eq!(checksum.stated, 0x17c5);
        assert!(checksum.is_valid());
    }

    #[test]
    fn sample_frame_power_block_is_empty() {
        let response = decode(&SAMPLE_FRAME, None).unwrap();
        let power = response.block(2).unwrap();
        assert_eq!(power.kind(), BlockKind::Power);
        assert_eq!(power.descriptor().stride, 12);
        assert!(power.records().is_empty());
        assert!(power.body().is_empty());
        assert_eq!(response.block_index(BlockKind::Power), None);
        assert!(response.power_block().is_none());
    }

    #[test]
    fn sample_frame_keeps_unknown_body() {
        let response = decode(&SAMPLE_FRAME, None).unwrap();
        let caps = response.block(3).unwrap();
        assert_eq!(caps.kind(), BlockKind::Unknown);
        assert_eq!(caps.body(), &SAMPLE_FRAME[157..169]);
    }

    #[test]
    fn hint_limits_the_window() {
        let frame = FrameBuilder::new().temperature(4, &[(1, 2)]).build();
        let mut padded = frame.clone();
        padded.extend_from_slice(&[0xff; 7]);
        let response = decode(&padded, Some(frame.len())).unwrap();
        assert_eq!(response.consumed_len(), frame.len());
        assert!(response.checksum().is_none());
    }

    #[test]
    fn hint_past_buffer_is_too_short() {
        let frame = FrameBuilder::new().temperature(4, &[(1, 2)]).build();
        let err = decode(&frame, Some(frame.len() + 1)).unwrap_err();
        assert!(matches!(err, DecodeError::TooShort { .. }));
    }

    #[test]
    fn oversized_buffer_rejected() {
        let raw = vec![0u8; layout::FRAME_MAX_LEN + 1];
        let err = decode(&raw, None).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FrameTooLong {
                length: layout::FRAME_MAX_LEN + 1,
                max: layout::FRAME_MAX_LEN
            }
        );
    }

    #[test]
    fn declared_length_checked_before_marker() {
        let mut frame = FrameBuilder::new().temperature(4, &[(1, 2)]).build();
        frame[layout::DATA_LENGTH_RANGE].copy_from_slice(&4097u16.to_be_bytes());
        frame[layout::MARKER_RANGE].copy_from_slice(b"XXXXXX");
        let err = decode(&frame, None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DeclaredLengthExceedsMax { length: 4097, .. }
        ));
    }

    #[test]
    fn declared_length_at_max_accepted() {
        let mut frame = FrameBuilder::new().temperature(4, &[(1, 2)]).build();
        frame[layout::DATA_LENGTH_RANGE].copy_from_slice(&4096u16.to_be_bytes());
        assert!(decode(&frame, None).is_ok());
    }

    #[test]
    fn zero_block_count_rejected() {
        let mut frame = FrameBuilder::new().temperature(4, &[(1, 2)]).build();
        frame[layout::BLOCK_COUNT_OFFSET] = 0;
        assert_eq!(decode(&frame, None).unwrap_err(), DecodeError::NoSensorBlocks);
    }

    #[test]
    fn stride_shorter_than_record_is_truncated() {
        let frame = FrameBuilder::new()
            .raw_block(*b"POWR", 4, 1, &[0u8; 4])
            .build();
        let err = decode(&frame, None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedSensorRecord {
                block: 0,
                record: 0,
                ..
            }
        ));
    }

    #[test]
    fn padded_stride_reads_from_window_start() {
        let frame = FrameBuilder::new()
            .raw_block(
                *b"TEMP",
                6,
                2,
                &[0x00, 0x01, 0x00, 0x10, 0xaa, 0xbb, 0x00, 0x02, 0x00, 0x20, 0xcc, 0xdd],
            )
            .build();
        let response = decode(&frame, None).unwrap();
        let temps = response.temperature_block().unwrap();
        let records = temps.records();
        assert_eq!(records[0].sensor_id(), 1);
        assert_eq!(records[0].value(), 0x10);
        assert_eq!(records[1].sensor_id(), 2);
        assert_eq!(records[1].value(), 0x20);
        assert_eq!(temps.body(), &frame[layout::HEADER_LEN + layout::DESCRIPTOR_LEN..]);
    }

    #[test]
    fn power_record_fields() {
        let frame = FrameBuilder::new()
            .power(12, &[(0x0102, 0x0a0b_0c0d, 0x1122_3344, 0x0304)])
            .build();
        let response = decode(&frame, None).unwrap();
        let record = response.power_block().unwrap().sensor(0).unwrap();
        let power = record.as_power().expect("power record");
        assert_eq!(power.sensor_id, 0x0102);
        assert_eq!(power.update_tag, 0x0a0b_0c0d);
        assert_eq!(power.accumulator, 0x1122_3344);
        assert_eq!(power.value, 0x0304);
    }

    #[test]
    fn unknown_block_truncated_body_rejected() {
        let mut frame = FrameBuilder::new()
            .raw_block(*b"FOOX", 8, 2, &[0u8; 16])
            .build();
        frame.truncate(frame.len() - 1);
        let err = decode(&frame, None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedSensorRecord { block: 0, .. }
        ));
    }

    #[test]
    fn single_trailing_byte_has_no_checksum() {
        let mut frame = FrameBuilder::new().frequency(4, &[(1, 2)]).build();
        frame.push(0x00);
        let response = decode(&frame, None).unwrap();
        assert!(response.checksum().is_none());
    }

    #[test]
    fn checksum_mismatch_is_not_fatal() {
        let frame = FrameBuilder::new()
            .frequency(4, &[(1, 2)])
            .checksum_value(0xbeef)
            .build();
        let response = decode(&frame, None).unwrap();
        let checksum = response.checksum().unwrap();
        assert_eq!(checksum.stated, 0xbeef);
        assert!(!checksum.is_valid());
    }
}
