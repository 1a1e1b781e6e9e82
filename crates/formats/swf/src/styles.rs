use std::collections::HashMap;

use crate::bits::{BitReader, BitWriter};
use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};
use crate::registry::{self, FillStyleDecoder};
use crate::types::{CharacterId, Color, Matrix};

/// Fill style type bytes.
const FILL_SOLID: u8 = 0x00;
const FILL_LINEAR_GRADIENT: u8 = 0x10;
const FILL_RADIAL_GRADIENT: u8 = 0x12;
const FILL_BITMAP_TILED: u8 = 0x40;
const FILL_BITMAP_CLIPPED: u8 = 0x41;
const FILL_BITMAP_UNSMOOTHED_TILED: u8 = 0x42;
const FILL_BITMAP_UNSMOOTHED_CLIPPED: u8 = 0x43;

/// One control point of a gradient ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientRecord {
    /// Position along the ramp, 0-255.
    pub ratio: u8,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFillKind {
    Tiled,
    Clipped,
    UnsmoothedTiled,
    UnsmoothedClipped,
}

impl BitmapFillKind {
    fn code(self) -> u8 {
        match self {
            Self::Tiled => FILL_BITMAP_TILED,
            Self::Clipped => FILL_BITMAP_CLIPPED,
            Self::UnsmoothedTiled => FILL_BITMAP_UNSMOOTHED_TILED,
            Self::UnsmoothedClipped => FILL_BITMAP_UNSMOOTHED_CLIPPED,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            FILL_BITMAP_TILED => Some(Self::Tiled),
            FILL_BITMAP_CLIPPED => Some(Self::Clipped),
            FILL_BITMAP_UNSMOOTHED_TILED => Some(Self::UnsmoothedTiled),
            FILL_BITMAP_UNSMOOTHED_CLIPPED => Some(Self::UnsmoothedClipped),
            _ => None,
        }
    }
}

/// How the interior of a shape is painted.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    Solid(Color),
    Gradient {
        radial: bool,
        /// Maps gradient space (±16384 twips square) onto the shape.
        matrix: Matrix,
        /// 1-15 control points, ascending ratio.
        records: Vec<GradientRecord>,
    },
    Bitmap {
        kind: BitmapFillKind,
        bitmap: CharacterId,
        matrix: Matrix,
    },
}

impl FillStyle {
    /// Encoded size in bytes, including the leading type byte.
    pub fn byte_size(&self, ctx: &Context<'_>) -> Result<u32> {
        match self {
            Self::Solid(_) => Ok(1 + Color::byte_size(ctx)),
            Self::Gradient {
                matrix, records, ..
            } => {
                if records.is_empty() || records.len() > 15 {
                    return Err(Error::InvalidValue {
                        context: "gradient record count",
                        value: records.len() as i64,
                    });
                }
                Ok(1 + matrix.byte_size()?
                    + 1
                    + records.len() as u32 * (1 + Color::byte_size(ctx)))
            }
            Self::Bitmap { matrix, .. } => Ok(1 + 2 + matrix.byte_size()?),
        }
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &Context<'_>) -> Result<()> {
        match self {
            Self::Solid(color) => {
                w.write_u8(FILL_SOLID);
                color.encode(w, ctx);
            }
            Self::Gradient {
                radial,
                matrix,
                records,
            } => {
                if records.is_empty() || records.len() > 15 {
                    return Err(Error::InvalidValue {
                        context: "gradient record count",
                        value: records.len() as i64,
                    });
                }
                w.write_u8(if *radial {
                    FILL_RADIAL_GRADIENT
                } else {
                    FILL_LINEAR_GRADIENT
                });
                matrix.encode(w)?;
                w.write_u8(records.len() as u8);
                for record in records {
                    w.write_u8(record.ratio);
                    record.color.encode(w, ctx);
                }
            }
            Self::Bitmap {
                kind,
                bitmap,
                matrix,
            } => {
                w.write_u8(kind.code());
                bitmap.encode(w);
                matrix.encode(w)?;
            }
        }
        Ok(())
    }
}

fn decode_solid(_code: u8, r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<FillStyle> {
    Ok(FillStyle::Solid(Color::decode(r, ctx)?))
}

fn decode_gradient(code: u8, r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<FillStyle> {
    let matrix = Matrix::decode(r)?;
    // Low nibble is the record count; the high bits carry spread and
    // interpolation modes that only exist in later shape versions.
    let count = (r.read_u8()? & 0x0F) as usize;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(GradientRecord {
            ratio: r.read_u8()?,
            color: Color::decode(r, ctx)?,
        });
    }
    Ok(FillStyle::Gradient {
        radial: code == FILL_RADIAL_GRADIENT,
        matrix,
        records,
    })
}

fn decode_bitmap(code: u8, r: &mut BitReader<'_>, _ctx: &mut Context<'_>) -> Result<FillStyle> {
    let kind = BitmapFillKind::from_code(code).ok_or(Error::Parse {
        context: "bitmap fill",
        message: format!("type byte {code:#04x} is not a bitmap fill"),
    })?;
    Ok(FillStyle::Bitmap {
        kind,
        bitmap: CharacterId::decode(r)?,
        matrix: Matrix::decode(r)?,
    })
}

pub(crate) fn default_fill_decoders() -> HashMap<u8, FillStyleDecoder> {
    let mut map: HashMap<u8, FillStyleDecoder> = HashMap::new();
    map.insert(FILL_SOLID, decode_solid);
    map.insert(FILL_LINEAR_GRADIENT, decode_gradient);
    map.insert(FILL_RADIAL_GRADIENT, decode_gradient);
    map.insert(FILL_BITMAP_TILED, decode_bitmap);
    map.insert(FILL_BITMAP_CLIPPED, decode_bitmap);
    map.insert(FILL_BITMAP_UNSMOOTHED_TILED, decode_bitmap);
    map.insert(FILL_BITMAP_UNSMOOTHED_CLIPPED, decode_bitmap);
    map
}

/// Stroke applied along a shape's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    /// Stroke width in twips.
    pub width: u16,
    pub color: Color,
}

impl LineStyle {
    pub fn byte_size(ctx: &Context<'_>) -> u32 {
        2 + Color::byte_size(ctx)
    }

    pub fn decode(r: &mut BitReader<'_>, ctx: &Context<'_>) -> Result<Self> {
        Ok(Self {
            width: r.read_u16()?,
            color: Color::decode(r, ctx)?,
        })
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &Context<'_>) {
        w.write_u16(self.width);
        self.color.encode(w, ctx);
    }
}

// ── Style arrays ─────────────────────────────────────────────────────────────
//
// A style array is a count followed by that many styles. Under
// `ExtendedStyleArrays` a count byte of 0xFF escapes to a 16-bit count;
// otherwise 0xFF is an ordinary literal count.

fn count_size(len: usize, ctx: &Context<'_>) -> Result<u32> {
    let extended = ctx.get_or(ContextKey::ExtendedStyleArrays, 0) != 0;
    if extended && len >= 0xFF {
        Ok(3)
    } else if len > 0xFF {
        Err(Error::InvalidValue {
            context: "style array count",
            value: len as i64,
        })
    } else {
        Ok(1)
    }
}

fn decode_count(r: &mut BitReader<'_>, ctx: &Context<'_>) -> Result<usize> {
    let count = r.read_u8()? as usize;
    let extended = ctx.get_or(ContextKey::ExtendedStyleArrays, 0) != 0;
    if extended && count == 0xFF {
        Ok(r.read_u16()? as usize)
    } else {
        Ok(count)
    }
}

fn encode_count(w: &mut BitWriter, len: usize, ctx: &Context<'_>) -> Result<()> {
    match count_size(len, ctx)? {
        3 => {
            w.write_u8(0xFF);
            w.write_u16(len as u16);
        }
        _ => w.write_u8(len as u8),
    }
    Ok(())
}

pub fn fill_styles_size(fills: &[FillStyle], ctx: &Context<'_>) -> Result<u32> {
    let mut size = count_size(fills.len(), ctx)?;
    for fill in fills {
        size += fill.byte_size(ctx)?;
    }
    Ok(size)
}

pub fn decode_fill_styles(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Vec<FillStyle>> {
    let count = decode_count(r, ctx)?;
    let mut fills = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        fills.push(registry::decode_fill_style(r, ctx)?);
    }
    Ok(fills)
}

pub fn encode_fill_styles(
    w: &mut BitWriter,
    fills: &[FillStyle],
    ctx: &Context<'_>,
) -> Result<()> {
    encode_count(w, fills.len(), ctx)?;
    for fill in fills {
        fill.encode(w, ctx)?;
    }
    Ok(())
}

pub fn line_styles_size(lines: &[LineStyle], ctx: &Context<'_>) -> Result<u32> {
    Ok(count_size(lines.len(), ctx)? + lines.len() as u32 * LineStyle::byte_size(ctx))
}

pub fn decode_line_styles(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Vec<LineStyle>> {
    let count = decode_count(r, ctx)?;
    let mut lines = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        lines.push(LineStyle::decode(r, ctx)?);
    }
    Ok(lines)
}

pub fn encode_line_styles(
    w: &mut BitWriter,
    lines: &[LineStyle],
    ctx: &Context<'_>,
) -> Result<()> {
    encode_count(w, lines.len(), ctx)?;
    for line in lines {
        line.encode(w, ctx);
    }
    Ok(())
}
