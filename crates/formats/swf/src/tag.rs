//! The length-prefixed tag protocol.
//!
//! Every tag is a 16-bit header — top 10 bits the type code, low 6 bits the
//! body length — followed by the body. The length value 0x3F is reserved as
//! an escape to a 32-bit length field, so a genuine 63-byte body must also
//! use the extended form. Encoding is two-phase: `prepare` computes the
//! exact body length (publishing shared sizing parameters into the context),
//! then `encode_body` emits exactly that many bytes.

use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::tags::control::{FrameLabel, RemoveObject2, SetBackgroundColor};
use crate::tags::define_shape::DefineShape;
use crate::tags::do_action::DoAction;
use crate::tags::movie_header::MovieHeader;
use crate::tags::opaque::OpaqueTag;
use crate::tags::place::{PlaceObject2, PlaceObject3};

pub const TAG_END: u16 = 0;
pub const TAG_SHOW_FRAME: u16 = 1;
pub const TAG_DEFINE_SHAPE: u16 = 2;
pub const TAG_SET_BACKGROUND_COLOR: u16 = 9;
pub const TAG_DO_ACTION: u16 = 12;
pub const TAG_DEFINE_SHAPE2: u16 = 22;
pub const TAG_PLACE_OBJECT2: u16 = 26;
pub const TAG_REMOVE_OBJECT2: u16 = 28;
pub const TAG_DEFINE_SHAPE3: u16 = 32;
pub const TAG_FRAME_LABEL: u16 = 43;
pub const TAG_PLACE_OBJECT3: u16 = 70;

/// Reserved short-length value signalling a 32-bit length field.
pub const EXTENDED_LENGTH: u32 = 0x3F;

/// Largest tag code representable in the 10-bit field.
pub const MAX_TAG_CODE: u16 = 0x3FF;

/// One record of a movie's tag sequence.
///
/// The tag code space is closed per format version, so unhandled codes are
/// an explicit `Opaque` case rather than an open hierarchy; they hold their
/// raw body for byte-identical pass-through. `Header` is the pseudo-record
/// built from the envelope's fixed fields — it has no tag code and no
/// length prefix, but participates in both encode phases like any record.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Envelope pseudo-record: stage size, frame rate, frame count.
    Header(MovieHeader),
    /// End-of-sequence sentinel.
    End,
    ShowFrame,
    SetBackgroundColor(SetBackgroundColor),
    FrameLabel(FrameLabel),
    RemoveObject2(RemoveObject2),
    DefineShape(DefineShape),
    PlaceObject2(PlaceObject2),
    PlaceObject3(PlaceObject3),
    DoAction(DoAction),
    Opaque(OpaqueTag),
}

impl Tag {
    /// Wire tag code. `None` for the header pseudo-record.
    pub fn code(&self) -> Option<u16> {
        Some(match self {
            Self::Header(_) => return None,
            Self::End => TAG_END,
            Self::ShowFrame => TAG_SHOW_FRAME,
            Self::SetBackgroundColor(_) => TAG_SET_BACKGROUND_COLOR,
            Self::FrameLabel(_) => TAG_FRAME_LABEL,
            Self::RemoveObject2(_) => TAG_REMOVE_OBJECT2,
            Self::DefineShape(shape) => shape.kind.code(),
            Self::PlaceObject2(_) => TAG_PLACE_OBJECT2,
            Self::PlaceObject3(_) => TAG_PLACE_OBJECT3,
            Self::DoAction(_) => TAG_DO_ACTION,
            Self::Opaque(opaque) => opaque.code,
        })
    }

    /// Size phase: the exact body length in bytes.
    ///
    /// A pure function of the record's fields, except that shared sizing
    /// parameters (style index widths) are published into the context for
    /// the write phase. Called exactly once per record per encode pass, in
    /// traversal order.
    pub fn prepare(&self, ctx: &mut Context<'_>) -> Result<u32> {
        match self {
            Self::Header(header) => header.body_size(),
            Self::End | Self::ShowFrame => Ok(0),
            Self::SetBackgroundColor(tag) => tag.body_size(),
            Self::FrameLabel(tag) => tag.body_size(),
            Self::RemoveObject2(tag) => tag.body_size(),
            Self::DefineShape(tag) => tag.body_size(ctx),
            Self::PlaceObject2(tag) => tag.body_size(ctx),
            Self::PlaceObject3(tag) => tag.body_size(ctx),
            Self::DoAction(tag) => tag.body_size(),
            Self::Opaque(tag) => tag.body_size(),
        }
    }

    /// Write phase: emit the body only. The caller writes the header first
    /// and verifies the emitted byte count against the `prepare` result.
    pub fn encode_body(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        match self {
            Self::Header(header) => header.encode(w),
            Self::End | Self::ShowFrame => Ok(()),
            Self::SetBackgroundColor(tag) => tag.encode(w),
            Self::FrameLabel(tag) => tag.encode(w),
            Self::RemoveObject2(tag) => tag.encode(w),
            Self::DefineShape(tag) => tag.encode(w, ctx),
            Self::PlaceObject2(tag) => tag.encode(w, ctx),
            Self::PlaceObject3(tag) => tag.encode(w, ctx),
            Self::DoAction(tag) => tag.encode(w),
            Self::Opaque(tag) => tag.encode(w),
        }
    }
}

/// Read a tag header: the packed 16-bit word, plus the 32-bit length field
/// when the short length is the reserved escape value.
pub fn read_tag_header(r: &mut BitReader<'_>) -> Result<(u16, u32)> {
    let word = r.read_u16()?;
    let code = word >> 6;
    let short = (word & 0x3F) as u32;
    let length = if short == EXTENDED_LENGTH {
        r.read_u32()?
    } else {
        short
    };
    Ok((code, length))
}

/// Write a tag header, choosing the short or extended form.
///
/// Any length at or above the escape value takes the extended form; the
/// escape value itself never encodes a genuine length.
pub fn write_tag_header(w: &mut BitWriter, code: u16, length: u32) -> Result<()> {
    if code > MAX_TAG_CODE {
        return Err(Error::InvalidValue {
            context: "tag code",
            value: code as i64,
        });
    }
    if length >= EXTENDED_LENGTH {
        w.write_u16(code << 6 | EXTENDED_LENGTH as u16);
        w.write_u32(length);
    } else {
        w.write_u16(code << 6 | length as u16);
    }
    Ok(())
}

/// Size of the header that `write_tag_header` will emit for a body length.
pub fn tag_header_size(length: u32) -> u32 {
    if length >= EXTENDED_LENGTH { 6 } else { 2 }
}
