//! Bit-packed shape outline records.
//!
//! A shape body is a run of heterogeneous bit-packed records: style changes,
//! straight edges, and curved edges. Nothing here is byte-aligned except the
//! leading index-width nibbles, the optional embedded style arrays, and the
//! trailing terminator padding. Field widths are data-dependent: each edge
//! carries a 4-bit size field selecting the width of its deltas, and style
//! index widths are inherited through the context and may be redefined
//! mid-outline by a style change that embeds new style arrays.

use crate::bits::{BitReader, BitWriter, bits_for_signed, bits_for_unsigned};
use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};
use crate::registry::ShapeRecordKind;
use crate::styles::{
    self, FillStyle, LineStyle, decode_fill_styles, decode_line_styles, encode_fill_styles,
    encode_line_styles,
};

/// A straight edge, as a delta from the current point in twips.
///
/// Purely horizontal or vertical edges omit the zero delta on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Line {
    pub dx: i32,
    pub dy: i32,
}

/// A quadratic curve: control point and anchor point deltas in twips, each
/// relative to the previous point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Curve {
    pub control_dx: i32,
    pub control_dy: i32,
    pub anchor_dx: i32,
    pub anchor_dy: i32,
}

/// Replacement style arrays embedded in a style change record.
///
/// Emitting these re-declares the fill and line index widths for all
/// subsequent records of the same shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewStyles {
    pub fills: Vec<FillStyle>,
    pub lines: Vec<LineStyle>,
}

/// Moves the draw position and/or selects fill and line styles mid-outline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleChange {
    /// Absolute move in twips.
    pub move_to: Option<(i32, i32)>,
    /// Fill style index for the left side of following edges (0 = none).
    pub fill0: Option<u32>,
    /// Fill style index for the right side of following edges (0 = none).
    pub fill1: Option<u32>,
    /// Line style index (0 = none).
    pub line: Option<u32>,
    pub new_styles: Option<NewStyles>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRecord {
    StyleChange(StyleChange),
    Line(Line),
    Curve(Curve),
}

/// A complete shape outline: the records between the index-width nibbles and
/// the all-zero terminator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub records: Vec<ShapeRecord>,
}

/// Edge delta widths are stored as `width - 2` in a 4-bit field.
const EDGE_WIDTH_MIN: u32 = 2;
const EDGE_WIDTH_MAX: u32 = 17;

fn edge_width(deltas: &[i32]) -> Result<u32> {
    let width = deltas
        .iter()
        .map(|&d| bits_for_signed(d))
        .max()
        .unwrap_or(1)
        .max(EDGE_WIDTH_MIN);
    if width > EDGE_WIDTH_MAX {
        return Err(Error::InvalidValue {
            context: "edge delta",
            value: deltas.iter().map(|d| d.unsigned_abs()).max().unwrap_or(0) as i64,
        });
    }
    Ok(width)
}

fn index_fits(value: u32, width: u32, context: &'static str) -> Result<()> {
    if width < 32 && value >= 1 << width {
        return Err(Error::InvalidValue {
            context,
            value: value as i64,
        });
    }
    Ok(())
}

impl Line {
    fn is_general(&self) -> bool {
        self.dx != 0 && self.dy != 0
    }

    fn width(&self) -> Result<u32> {
        edge_width(&[self.dx, self.dy])
    }

    /// Record bits: 2 discriminator + 4 size + 1 general flag + deltas.
    fn record_bits(&self) -> Result<u32> {
        let w = self.width()?;
        Ok(2 + 4 + 1 + if self.is_general() { 2 * w } else { 1 + w })
    }

    fn encode(&self, w: &mut BitWriter) -> Result<()> {
        let width = self.width()?;
        w.write_ubits(2, 0b11);
        w.write_ubits(4, width - EDGE_WIDTH_MIN);
        if self.is_general() {
            w.write_ubits(1, 1);
            w.write_sbits(width, self.dx);
            w.write_sbits(width, self.dy);
        } else {
            w.write_ubits(1, 0);
            let vertical = self.dx == 0;
            w.write_ubits(1, vertical as u32);
            w.write_sbits(width, if vertical { self.dy } else { self.dx });
        }
        Ok(())
    }
}

impl Curve {
    fn deltas(&self) -> [i32; 4] {
        [
            self.control_dx,
            self.control_dy,
            self.anchor_dx,
            self.anchor_dy,
        ]
    }

    fn width(&self) -> Result<u32> {
        edge_width(&self.deltas())
    }

    /// Record bits: 2 discriminator + 4 size + four deltas at one width.
    fn record_bits(&self) -> Result<u32> {
        Ok(2 + 4 + 4 * self.width()?)
    }

    fn encode(&self, w: &mut BitWriter) -> Result<()> {
        let width = self.width()?;
        w.write_ubits(2, 0b10);
        w.write_ubits(4, width - EDGE_WIDTH_MIN);
        for delta in self.deltas() {
            w.write_sbits(width, delta);
        }
        Ok(())
    }
}

impl StyleChange {
    /// A style change with all five flags clear encodes as six zero bits,
    /// which on the wire is the end-of-shape terminator. It can never be
    /// emitted.
    fn check_not_empty(&self) -> Result<()> {
        if self.move_to.is_none()
            && self.fill0.is_none()
            && self.fill1.is_none()
            && self.line.is_none()
            && self.new_styles.is_none()
        {
            return Err(Error::InvalidValue {
                context: "style change with no fields",
                value: 0,
            });
        }
        Ok(())
    }

    fn move_bits(&self) -> Result<Option<u32>> {
        let Some((dx, dy)) = self.move_to else {
            return Ok(None);
        };
        let n = bits_for_signed(dx).max(bits_for_signed(dy));
        if n > 31 {
            return Err(Error::InvalidValue {
                context: "move delta",
                value: dx as i64,
            });
        }
        Ok(Some(n))
    }

    /// Accumulate this record's bits onto `total`, using the context's index
    /// widths and redefining them if new style arrays are embedded. `total`
    /// is the bit position from the start of the shape, needed because the
    /// embedded arrays are preceded by alignment padding.
    fn add_bits(&self, total: u32, ctx: &mut Context<'_>) -> Result<u32> {
        self.check_not_empty()?;
        let mut bits = total + 6;
        if let Some(n) = self.move_bits()? {
            bits += 5 + 2 * n;
        }
        if self.fill0.is_some() {
            bits += ctx.get(ContextKey::FillIndexBits) as u32;
        }
        if self.fill1.is_some() {
            bits += ctx.get(ContextKey::FillIndexBits) as u32;
        }
        if self.line.is_some() {
            bits += ctx.get(ContextKey::LineIndexBits) as u32;
        }
        if let Some(ns) = &self.new_styles {
            bits = bits.next_multiple_of(8);
            let arrays =
                styles::fill_styles_size(&ns.fills, ctx)? + styles::line_styles_size(&ns.lines, ctx)?;
            bits += arrays * 8 + 8;
            ctx.put(
                ContextKey::FillIndexBits,
                bits_for_unsigned(ns.fills.len() as u32) as i32,
            );
            ctx.put(
                ContextKey::LineIndexBits,
                bits_for_unsigned(ns.lines.len() as u32) as i32,
            );
        }
        Ok(bits)
    }

    fn encode(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        self.check_not_empty()?;
        let fill_bits = ctx.get(ContextKey::FillIndexBits) as u32;
        let line_bits = ctx.get(ContextKey::LineIndexBits) as u32;

        w.write_ubits(1, 0);
        w.write_ubits(1, self.new_styles.is_some() as u32);
        w.write_ubits(1, self.line.is_some() as u32);
        w.write_ubits(1, self.fill1.is_some() as u32);
        w.write_ubits(1, self.fill0.is_some() as u32);
        w.write_ubits(1, self.move_to.is_some() as u32);

        if let Some((dx, dy)) = self.move_to {
            let n = self.move_bits()?.expect("move present");
            w.write_ubits(5, n);
            w.write_sbits(n, dx);
            w.write_sbits(n, dy);
        }
        if let Some(index) = self.fill0 {
            index_fits(index, fill_bits, "fill style index")?;
            w.write_ubits(fill_bits, index);
        }
        if let Some(index) = self.fill1 {
            index_fits(index, fill_bits, "fill style index")?;
            w.write_ubits(fill_bits, index);
        }
        if let Some(index) = self.line {
            index_fits(index, line_bits, "line style index")?;
            w.write_ubits(line_bits, index);
        }
        if let Some(ns) = &self.new_styles {
            w.align();
            encode_fill_styles(w, &ns.fills, ctx)?;
            encode_line_styles(w, &ns.lines, ctx)?;
            let new_fill_bits = bits_for_unsigned(ns.fills.len() as u32);
            let new_line_bits = bits_for_unsigned(ns.lines.len() as u32);
            w.write_ubits(4, new_fill_bits);
            w.write_ubits(4, new_line_bits);
            ctx.put(ContextKey::FillIndexBits, new_fill_bits as i32);
            ctx.put(ContextKey::LineIndexBits, new_line_bits as i32);
        }
        Ok(())
    }
}

// ── Registry strategies ──────────────────────────────────────────────────────
//
// Each decoder is entered after the discriminator bits have been consumed.

pub(crate) fn decode_straight_edge(
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<ShapeRecord> {
    let width = r.read_ubits(4)? + EDGE_WIDTH_MIN;
    let (dx, dy) = if r.read_ubits(1)? == 1 {
        (r.read_sbits(width)?, r.read_sbits(width)?)
    } else if r.read_ubits(1)? == 1 {
        (0, r.read_sbits(width)?)
    } else {
        (r.read_sbits(width)?, 0)
    };
    Ok(ShapeRecord::Line(Line { dx, dy }))
}

pub(crate) fn decode_curved_edge(
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<ShapeRecord> {
    let width = r.read_ubits(4)? + EDGE_WIDTH_MIN;
    Ok(ShapeRecord::Curve(Curve {
        control_dx: r.read_sbits(width)?,
        control_dy: r.read_sbits(width)?,
        anchor_dx: r.read_sbits(width)?,
        anchor_dy: r.read_sbits(width)?,
    }))
}

pub(crate) fn decode_style_change(
    r: &mut BitReader<'_>,
    ctx: &mut Context<'_>,
) -> Result<ShapeRecord> {
    let has_new_styles = r.read_ubits(1)? == 1;
    let has_line = r.read_ubits(1)? == 1;
    let has_fill1 = r.read_ubits(1)? == 1;
    let has_fill0 = r.read_ubits(1)? == 1;
    let has_move = r.read_ubits(1)? == 1;

    let move_to = if has_move {
        let n = r.read_ubits(5)?;
        Some((r.read_sbits(n)?, r.read_sbits(n)?))
    } else {
        None
    };
    let fill_bits = ctx.get(ContextKey::FillIndexBits) as u32;
    let line_bits = ctx.get(ContextKey::LineIndexBits) as u32;
    let fill0 = if has_fill0 {
        Some(r.read_ubits(fill_bits)?)
    } else {
        None
    };
    let fill1 = if has_fill1 {
        Some(r.read_ubits(fill_bits)?)
    } else {
        None
    };
    let line = if has_line {
        Some(r.read_ubits(line_bits)?)
    } else {
        None
    };
    let new_styles = if has_new_styles {
        r.align();
        let fills = decode_fill_styles(r, ctx)?;
        let lines = decode_line_styles(r, ctx)?;
        let new_fill_bits = r.read_ubits(4)?;
        let new_line_bits = r.read_ubits(4)?;
        // Subsequent sibling records are decoded at the redefined widths.
        ctx.put(ContextKey::FillIndexBits, new_fill_bits as i32);
        ctx.put(ContextKey::LineIndexBits, new_line_bits as i32);
        Some(NewStyles { fills, lines })
    } else {
        None
    };

    Ok(ShapeRecord::StyleChange(StyleChange {
        move_to,
        fill0,
        fill1,
        line,
        new_styles,
    }))
}

impl Shape {
    /// Decode the index-width nibbles, the record run, and the terminator.
    /// Leaves the reader byte-aligned.
    pub fn decode(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Self> {
        r.align();
        let fill_bits = r.read_ubits(4)?;
        let line_bits = r.read_ubits(4)?;
        ctx.put(ContextKey::FillIndexBits, fill_bits as i32);
        ctx.put(ContextKey::LineIndexBits, line_bits as i32);

        let mut records = Vec::new();
        loop {
            // The terminator is a reserved all-zero 6-bit code.
            if r.scan_ubits(6)? == 0 {
                r.read_ubits(6)?;
                break;
            }
            let kind = if r.read_ubits(1)? == 1 {
                if r.read_ubits(1)? == 1 {
                    ShapeRecordKind::StraightEdge
                } else {
                    ShapeRecordKind::CurvedEdge
                }
            } else {
                ShapeRecordKind::StyleChange
            };
            let decoder = ctx.registry().shape_decoder(kind);
            records.push(decoder(r, ctx)?);
        }
        r.align();
        Ok(Self { records })
    }

    /// Size phase: exact encoded size in bytes, including nibbles, terminator
    /// and trailing alignment.
    ///
    /// The caller must have set `FillIndexBits`/`LineIndexBits` for the
    /// leading nibbles. The running bit total is kept in the context so that
    /// the alignment padding before an embedded style array is computed from
    /// the true bit position, and so that a style change's width redefinition
    /// is visible to the records that follow it.
    pub fn prepare(&self, ctx: &mut Context<'_>) -> Result<u32> {
        let mut total = 8u32; // index-width nibbles
        ctx.put(ContextKey::ShapeBitTotal, total as i32);
        for record in &self.records {
            total = match record {
                ShapeRecord::Line(line) => total + line.record_bits()?,
                ShapeRecord::Curve(curve) => total + curve.record_bits()?,
                ShapeRecord::StyleChange(sc) => sc.add_bits(total, ctx)?,
            };
            ctx.put(ContextKey::ShapeBitTotal, total as i32);
        }
        total += 6; // terminator
        Ok(total.div_ceil(8))
    }

    /// Write phase. Must be preceded by `prepare` in the same traversal with
    /// the same context so the index widths match. Leaves the writer
    /// byte-aligned.
    pub fn encode(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        w.align();
        w.write_ubits(4, ctx.get(ContextKey::FillIndexBits) as u32);
        w.write_ubits(4, ctx.get(ContextKey::LineIndexBits) as u32);
        for record in &self.records {
            match record {
                ShapeRecord::Line(line) => line.encode(w)?,
                ShapeRecord::Curve(curve) => curve.encode(w)?,
                ShapeRecord::StyleChange(sc) => sc.encode(w, ctx)?,
            }
        }
        w.write_ubits(6, 0);
        w.align();
        Ok(())
    }
}
