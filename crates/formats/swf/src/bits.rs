use crate::error::{Error, Result};

/// Minimum number of bits needed to hold `value` in two's complement.
///
/// Always at least 1 (a single sign bit encodes 0 and -1).
pub fn bits_for_signed(value: i32) -> u32 {
    let magnitude = if value < 0 { !value } else { value } as u32;
    33 - magnitude.leading_zeros()
}

/// Minimum number of bits needed to hold `value` unsigned. Zero needs none.
pub fn bits_for_unsigned(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// Bit- and byte-granular read cursor over a byte slice.
///
/// Byte-level reads are little-endian and require the cursor to be byte
/// aligned; only the bit-level primitives may leave it mid-byte, and callers
/// must `align` before the next byte-level read. Bits within a byte are
/// consumed most-significant first.
#[derive(Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Sub-byte offset, 0-7.
    bit: u32,
    /// Stack of byte offsets for nested length verification.
    marks: Vec<usize>,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit: 0,
            marks: Vec::new(),
        }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Remaining whole bytes from the current byte position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Discard any partial byte so the next read starts on a byte boundary.
    pub fn align(&mut self) {
        if self.bit != 0 {
            self.bit = 0;
            self.pos += 1;
        }
    }

    // ── Marks ────────────────────────────────────────────────────────────────

    /// Push the current byte offset. Marks nest: each record body containing
    /// sub-records pushes its own mark and pops it when done.
    pub fn mark(&mut self) {
        self.marks.push(self.pos);
    }

    /// Pop the most recent mark.
    pub fn unmark(&mut self) {
        self.marks.pop();
    }

    /// Bytes consumed since the most recent `mark`.
    pub fn bytes_read(&self) -> usize {
        self.pos - self.marks.last().copied().unwrap_or(0)
    }

    /// Verify that exactly `expected` bytes were consumed since the most
    /// recent `mark`. Does not pop the mark.
    pub fn check(&self, expected: u32) -> Result<()> {
        let consumed = self.bytes_read();
        if consumed as u64 != expected as u64 {
            return Err(Error::LengthMismatch {
                offset: self.pos,
                expected,
                delta: consumed as i64 - expected as i64,
            });
        }
        Ok(())
    }

    // ── Bit-level reads ──────────────────────────────────────────────────────

    /// Read `n` bits (0-32) as an unsigned value, most significant bit first.
    pub fn read_ubits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 32, "bit reads are limited to 32 bits");
        let mut value: u32 = 0;
        let mut remaining = n;
        while remaining > 0 {
            if self.pos >= self.data.len() {
                return Err(Error::UnexpectedEof {
                    offset: self.pos,
                    need: 1,
                    have: 0,
                });
            }
            let avail = 8 - self.bit;
            let take = remaining.min(avail);
            let byte = self.data[self.pos] as u32;
            let chunk = (byte >> (avail - take)) & ((1u32 << take) - 1);
            value = (value << take) | chunk;
            self.bit += take;
            if self.bit == 8 {
                self.bit = 0;
                self.pos += 1;
            }
            remaining -= take;
        }
        Ok(value)
    }

    /// Read `n` bits (0-32) as a signed value, sign-extending from bit `n-1`.
    pub fn read_sbits(&mut self, n: u32) -> Result<i32> {
        let raw = self.read_ubits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n < 32 && raw & (1 << (n - 1)) != 0 {
            Ok((raw | (u32::MAX << n)) as i32)
        } else {
            Ok(raw as i32)
        }
    }

    /// Read `n` bits without consuming them.
    pub fn scan_ubits(&self, n: u32) -> Result<u32> {
        self.clone().read_ubits(n)
    }

    // ── Byte-level reads ─────────────────────────────────────────────────────

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read an 8.8 fixed-point value as its raw 16-bit representation.
    pub fn read_fixed8(&mut self) -> Result<u16> {
        self.read_u16()
    }

    /// Read a null-terminated UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let nul = self.data[self.pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::UnexpectedEof {
                offset: self.pos,
                need: 1,
                have: 0,
            })?;
        let bytes = self.data[self.pos..self.pos + nul].to_vec();
        self.pos += nul + 1;
        String::from_utf8(bytes).map_err(|e| Error::InvalidString {
            offset: start,
            source: e,
        })
    }

    /// Read a 16-bit word without consuming it.
    pub fn scan_u16(&self) -> Result<u16> {
        self.clone().read_u16()
    }

    fn ensure(&self, n: usize) -> Result<()> {
        debug_assert_eq!(self.bit, 0, "byte read at non-aligned bit position");
        if self.pos + n > self.data.len() {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

/// Bit- and byte-granular writer building a byte buffer. Mirrors `BitReader`:
/// byte-level writes are little-endian and require alignment, bits are
/// emitted most-significant first.
pub struct BitWriter {
    buf: Vec<u8>,
    /// Bits used in the trailing partial byte, 0-7.
    bit: u32,
    marks: Vec<usize>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            bit: 0,
            marks: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
            bit: 0,
            marks: Vec::new(),
        }
    }

    /// Whole bytes written so far (a partial byte counts once started).
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Zero-pad any partial byte so the next write starts on a byte boundary.
    pub fn align(&mut self) {
        self.bit = 0;
    }

    /// Finish any partial byte. Alias of `align` for end-of-stream use.
    pub fn flush(&mut self) {
        self.align();
    }

    // ── Marks ────────────────────────────────────────────────────────────────

    pub fn mark(&mut self) {
        self.marks.push(self.buf.len());
    }

    pub fn unmark(&mut self) {
        self.marks.pop();
    }

    /// Bytes written since the most recent `mark`.
    pub fn bytes_written(&self) -> usize {
        self.buf.len() - self.marks.last().copied().unwrap_or(0)
    }

    /// Verify that exactly `expected` bytes were written since the most
    /// recent `mark`. Does not pop the mark.
    pub fn check(&self, expected: u32) -> Result<()> {
        let written = self.bytes_written();
        if written as u64 != expected as u64 {
            return Err(Error::LengthMismatch {
                offset: self.buf.len(),
                expected,
                delta: written as i64 - expected as i64,
            });
        }
        Ok(())
    }

    // ── Bit-level writes ─────────────────────────────────────────────────────

    /// Write the low `n` bits (0-32) of `value`, most significant bit first.
    pub fn write_ubits(&mut self, n: u32, value: u32) {
        debug_assert!(n <= 32, "bit writes are limited to 32 bits");
        debug_assert!(n == 32 || value < (1u64 << n) as u32, "value wider than {n} bits");
        let mut remaining = n;
        while remaining > 0 {
            if self.bit == 0 {
                self.buf.push(0);
            }
            let avail = 8 - self.bit;
            let take = remaining.min(avail);
            let shift = remaining - take;
            let chunk = ((value >> shift) & ((1u64 << take) as u32).wrapping_sub(1)) as u8;
            let last = self.buf.last_mut().expect("partial byte exists");
            *last |= chunk << (avail - take);
            self.bit = (self.bit + take) % 8;
            remaining -= take;
        }
    }

    /// Write `value` in `n` bits of two's complement.
    pub fn write_sbits(&mut self, n: u32, value: i32) {
        let mask = if n == 32 { u32::MAX } else { (1u32 << n) - 1 };
        self.write_ubits(n, value as u32 & mask);
    }

    // ── Byte-level writes ────────────────────────────────────────────────────

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        debug_assert_eq!(self.bit, 0, "byte write at non-aligned bit position");
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        debug_assert_eq!(self.bit, 0, "byte write at non-aligned bit position");
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// Write an 8.8 fixed-point value from its raw 16-bit representation.
    pub fn write_fixed8(&mut self, v: u16) {
        self.write_u16(v);
    }

    /// Write a null-terminated UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
        self.buf.push(0);
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.buf
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_widths() {
        assert_eq!(bits_for_signed(0), 1);
        assert_eq!(bits_for_signed(-1), 1);
        assert_eq!(bits_for_signed(1), 2);
        assert_eq!(bits_for_signed(-2), 2);
        assert_eq!(bits_for_signed(-5), 4);
        assert_eq!(bits_for_signed(5), 4);
        assert_eq!(bits_for_signed(10), 5);
        assert_eq!(bits_for_signed(-10), 5);
        assert_eq!(bits_for_signed(100), 8);
        assert_eq!(bits_for_signed(i32::MAX), 32);
        assert_eq!(bits_for_signed(i32::MIN), 32);
    }

    #[test]
    fn unsigned_widths() {
        assert_eq!(bits_for_unsigned(0), 0);
        assert_eq!(bits_for_unsigned(1), 1);
        assert_eq!(bits_for_unsigned(2), 2);
        assert_eq!(bits_for_unsigned(255), 8);
    }

    #[test]
    fn sign_extension_round_trips_all_widths() {
        for n in 1..=32u32 {
            let min = if n == 32 { i32::MIN } else { -(1i32 << (n - 1)) };
            let max = if n == 32 { i32::MAX } else { (1i32 << (n - 1)) - 1 };
            for &v in &[min, max, -1, 0] {
                if v < min || v > max {
                    continue;
                }
                let mut w = BitWriter::new();
                w.write_sbits(n, v);
                let bytes = w.into_bytes();
                let mut r = BitReader::new(&bytes);
                assert_eq!(r.read_sbits(n).unwrap(), v, "width {n} value {v}");
            }
        }
    }

    #[test]
    fn mixed_bit_and_byte_reads() {
        let mut w = BitWriter::new();
        w.write_ubits(4, 0b1010);
        w.write_ubits(6, 0b110011);
        w.align();
        w.write_u16(0xBEEF);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_ubits(4).unwrap(), 0b1010);
        assert_eq!(r.read_ubits(6).unwrap(), 0b110011);
        r.align();
        assert_eq!(r.read_u16().unwrap(), 0xBEEF);
    }

    #[test]
    fn bit_reads_cross_byte_boundaries() {
        let data = [0b1011_0110, 0b0100_1101, 0xFF];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_ubits(3).unwrap(), 0b101);
        assert_eq!(r.read_ubits(10).unwrap(), 0b1_0110_0100_1);
        assert_eq!(r.read_ubits(3).unwrap(), 0b101);
    }

    #[test]
    fn marks_nest() {
        let data = [0u8; 16];
        let mut r = BitReader::new(&data);
        r.mark();
        r.read_u32().unwrap();
        r.mark();
        r.read_u16().unwrap();
        assert_eq!(r.bytes_read(), 2);
        r.check(2).unwrap();
        r.unmark();
        assert_eq!(r.bytes_read(), 6);
        r.read_u16().unwrap();
        r.check(8).unwrap();
        r.unmark();
    }

    #[test]
    fn check_reports_signed_delta() {
        let data = [0u8; 8];
        let mut r = BitReader::new(&data);
        r.mark();
        r.read_u32().unwrap();
        let err = r.check(6).unwrap_err();
        match err {
            Error::LengthMismatch {
                expected, delta, ..
            } => {
                assert_eq!(expected, 6);
                assert_eq!(delta, -2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scan_does_not_consume() {
        let data = [0x34, 0x12, 0xAB];
        let r = BitReader::new(&data);
        assert_eq!(r.scan_u16().unwrap(), 0x1234);
        assert_eq!(r.scan_u16().unwrap(), 0x1234);
        assert_eq!(r.scan_ubits(8).unwrap(), 0x34);
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn string_round_trip() {
        let mut w = BitWriter::new();
        w.write_string("label");
        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_string().unwrap(), "label");
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn eof_reports_offset() {
        let data = [0u8; 2];
        let mut r = BitReader::new(&data);
        let err = r.read_u32().unwrap_err();
        match err {
            Error::UnexpectedEof { offset, need, have } => {
                assert_eq!(offset, 0);
                assert_eq!(need, 4);
                assert_eq!(have, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
