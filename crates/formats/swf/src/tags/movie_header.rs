use crate::bits::{BitReader, BitWriter};
use crate::error::Result;
use crate::types::Rect;

/// The envelope's fixed fields, modeled as the movie's first record.
///
/// It has no tag code and no length prefix; the envelope codec reads and
/// writes it directly, before the tag loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieHeader {
    /// Stage bounds in twips. By convention the minima are zero.
    pub frame_size: Rect,
    /// Frames per second, raw 8.8 fixed-point.
    pub frame_rate: u16,
    /// Advisory frame count. Not validated against the tag sequence and
    /// re-emitted verbatim, so a movie whose count disagrees with its
    /// ShowFrame tags survives a round trip unchanged.
    pub frame_count: u16,
}

impl MovieHeader {
    pub fn body_size(&self) -> Result<u32> {
        Ok(self.frame_size.byte_size()? + 4)
    }

    pub fn decode(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self {
            frame_size: Rect::decode(r)?,
            frame_rate: r.read_fixed8()?,
            frame_count: r.read_u16()?,
        })
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        self.frame_size.encode(w)?;
        w.write_fixed8(self.frame_rate);
        w.write_u16(self.frame_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_and_matches_size() {
        let header = MovieHeader {
            frame_size: Rect {
                x_min: 0,
                x_max: 11000,
                y_min: 0,
                y_max: 8000,
            },
            frame_rate: 12 << 8 | 128, // 12.5 fps
            frame_count: 240,
        };
        let mut w = BitWriter::new();
        header.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len() as u32, header.body_size().unwrap());

        let mut r = BitReader::new(&bytes);
        assert_eq!(MovieHeader::decode(&mut r).unwrap(), header);
        assert_eq!(r.position(), bytes.len());
    }
}
