//! Timeline control tags with small fixed or near-fixed bodies.

use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::Result;
use crate::tag::Tag;
use crate::types::Color;

/// Sets the stage background. The color is always three-channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBackgroundColor {
    pub color: Color,
}

impl SetBackgroundColor {
    pub fn body_size(&self) -> Result<u32> {
        Ok(3)
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        self.color.encode_rgb(w);
        Ok(())
    }
}

/// Names the current frame so scripts can jump to it by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLabel {
    pub name: String,
    /// Named-anchor flag, a trailing byte introduced in format version 6.
    /// Older files end the body at the name's terminator, so its presence is
    /// detected from the declared length. A trailing byte of zero decodes to
    /// `false` and re-encodes with no byte at all: the one-shorter form is
    /// equivalent, so this is a normalization, not a loss.
    pub anchor: bool,
}

impl FrameLabel {
    pub fn body_size(&self) -> Result<u32> {
        Ok(self.name.len() as u32 + 1 + self.anchor as u32)
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        w.write_string(&self.name);
        if self.anchor {
            w.write_u8(1);
        }
        Ok(())
    }
}

/// Removes the object at a display list depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveObject2 {
    pub depth: u16,
}

impl RemoveObject2 {
    pub fn body_size(&self) -> Result<u32> {
        Ok(2)
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        w.write_u16(self.depth);
        Ok(())
    }
}

// ── Registry strategies ──────────────────────────────────────────────────────

pub(crate) fn decode_end(
    _code: u16,
    _length: u32,
    _r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Tag> {
    Ok(Tag::End)
}

pub(crate) fn decode_show_frame(
    _code: u16,
    _length: u32,
    _r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Tag> {
    Ok(Tag::ShowFrame)
}

pub(crate) fn decode_set_background_color(
    _code: u16,
    _length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Tag> {
    Ok(Tag::SetBackgroundColor(SetBackgroundColor {
        color: Color::decode_rgb(r)?,
    }))
}

pub(crate) fn decode_frame_label(
    _code: u16,
    length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Tag> {
    let name = r.read_string()?;
    let anchor = r.bytes_read() < length as usize && r.read_u8()? != 0;
    Ok(Tag::FrameLabel(FrameLabel { name, anchor }))
}

pub(crate) fn decode_remove_object2(
    _code: u16,
    _length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Tag> {
    Ok(Tag::RemoveObject2(RemoveObject2 {
        depth: r.read_u16()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::registry::{self, TagRegistry};
    use crate::tag;

    fn round_trip(tag: &Tag) -> Tag {
        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        let length = tag.prepare(&mut ctx).unwrap();

        let mut w = BitWriter::new();
        tag::write_tag_header(&mut w, tag.code().unwrap(), length).unwrap();
        w.mark();
        tag.encode_body(&mut w, &mut ctx).unwrap();
        w.check(length).unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        let decoded = registry::decode_tag(&mut r, &mut ctx).unwrap();
        assert_eq!(r.position(), bytes.len());
        decoded
    }

    #[test]
    fn background_color_round_trips() {
        let tag = Tag::SetBackgroundColor(SetBackgroundColor {
            color: Color::rgb(0x33, 0x66, 0x99),
        });
        assert_eq!(round_trip(&tag), tag);
    }

    #[test]
    fn frame_label_with_and_without_anchor() {
        let plain = Tag::FrameLabel(FrameLabel {
            name: "intro".into(),
            anchor: false,
        });
        assert_eq!(round_trip(&plain), plain);

        let anchored = Tag::FrameLabel(FrameLabel {
            name: "chapter2".into(),
            anchor: true,
        });
        assert_eq!(round_trip(&anchored), anchored);
    }

    #[test]
    fn explicit_zero_anchor_byte_normalizes_to_the_short_form() {
        // Code 43, length 7: "start\0" plus a zero anchor byte.
        let bytes = [0xC7, 0x0A, b's', b't', b'a', b'r', b't', 0, 0];
        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        let mut r = BitReader::new(&bytes);
        let decoded = registry::decode_tag(&mut r, &mut ctx).unwrap();
        assert_eq!(
            decoded,
            Tag::FrameLabel(FrameLabel {
                name: "start".into(),
                anchor: false,
            })
        );
        // Re-encoding drops the redundant byte; see the `anchor` field note.
        assert_eq!(decoded.prepare(&mut ctx).unwrap(), 6);
    }

    #[test]
    fn remove_object_round_trips() {
        let tag = Tag::RemoveObject2(RemoveObject2 { depth: 7 });
        assert_eq!(round_trip(&tag), tag);
    }

    #[test]
    fn zero_length_tags_round_trip() {
        assert_eq!(round_trip(&Tag::ShowFrame), Tag::ShowFrame);
        assert_eq!(round_trip(&Tag::End), Tag::End);
    }
}
