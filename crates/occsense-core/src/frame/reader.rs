use super::error::Truncated;

/// Bounds-checked forward cursor over a frame.
///
/// Every read goes through [`FrameCursor::take`], so no accessor can index
/// past the end of the buffer. On failure the position is left unchanged.
pub struct FrameCursor<'a> {
    frame: &'a [u8],
    pos: usize,
}

impl<'a> FrameCursor<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { frame, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.frame.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> &'a [u8] {
        &self.frame[..self.pos]
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], Truncated> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.frame.len())
            .ok_or(Truncated {
                offset: self.pos,
                needed: len,
                remaining: self.remaining(),
            })?;
        let bytes = &self.frame[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Truncated> {
        let [value] = self.read_array::<1>()?;
        Ok(value)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, Truncated> {
        self.read_array::<2>().map(u16::from_be_bytes)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Truncated> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }
}

/// Read-only view of a single record window (one stride).
///
/// Fields are always read from the start of the window; bytes past the
/// record's logical size are padding.
pub struct RecordWindow<'a> {
    cursor: FrameCursor<'a>,
}

impl<'a> RecordWindow<'a> {
    pub fn new(window: &'a [u8]) -> Self {
        Self {
            cursor: FrameCursor::new(window),
        }
    }

    pub fn read_u16_be(&mut self) -> Result<u16, Truncated> {
        self.cursor.read_u16_be()
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Truncated> {
        self.cursor.read_u32_be()
    }
}

/// Wrapping 16-bit sum of `bytes`, as computed by the device.
pub fn checksum16(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, byte| acc.wrapping_add(u16::from(*byte)))
}

#[cfg(test)]
mod tests {
    use super::{FrameCursor, RecordWindow, checksum16};
    use crate::frame::error::Truncated;

    #[test]
    fn take_advances_position() {
        let bytes = [1, 2, 3, 4, 5];
        let mut cursor = FrameCursor::new(&bytes);
        assert_eq!(cursor.take(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 3);
        assert_eq!(cursor.consumed(), &[1, 2]);
    }

    #[test]
    fn take_past_end_leaves_position() {
        let bytes = [1, 2, 3];
        let mut cursor = FrameCursor::new(&bytes);
        cursor.take(1).unwrap();
        let err = cursor.take(3).unwrap_err();
        assert_eq!(
            err,
            Truncated {
                offset: 1,
                needed: 3,
                remaining: 2
            }
        );
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn take_exactly_to_end() {
        let bytes = [0u8; 4];
        let mut cursor = FrameCursor::new(&bytes);
        cursor.take(4).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.take(1).is_err());
        assert!(cursor.take(0).is_ok());
    }

    #[test]
    fn take_huge_length_does_not_overflow() {
        let bytes = [0u8; 4];
        let mut cursor = FrameCursor::new(&bytes);
        cursor.take(2).unwrap();
        assert!(cursor.take(usize::MAX).is_err());
    }

    #[test]
    fn reads_big_endian_integers() {
        let bytes = [0x12, 0x34, 0xde, 0xad, 0xbe, 0xef, 0x7f];
        let mut cursor = FrameCursor::new(&bytes);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32_be().unwrap(), 0xdead_beef);
        assert_eq!(cursor.read_u8().unwrap(), 0x7f);
        assert!(cursor.read_u8().is_err());
    }

    #[test]
    fn record_window_reads_from_start() {
        let bytes = [0x00, 0x6a, 0x01, 0x02, 0xff, 0xff];
        let mut window = RecordWindow::new(&bytes);
        assert_eq!(window.read_u16_be().unwrap(), 0x006a);
        assert_eq!(window.read_u16_be().unwrap(), 0x0102);
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum16(&[]), 0);
        assert_eq!(checksum16(&[0xff; 3]), 0x02fd);
        assert_eq!(checksum16(&[0xff; 258]), 0x00fe);
        assert_eq!(checksum16(&vec![0xff; 300]), 300u16.wrapping_mul(0xff));
    }
}
