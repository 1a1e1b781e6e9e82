use crate::bits::{BitReader, BitWriter, bits_for_unsigned};
use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::styles::{
    self, FillStyle, LineStyle, decode_fill_styles, decode_line_styles, encode_fill_styles,
    encode_line_styles,
};
use crate::tag::{TAG_DEFINE_SHAPE, TAG_DEFINE_SHAPE2, TAG_DEFINE_SHAPE3, Tag};
use crate::types::{CharacterId, Rect};

/// The three shape definition tags share one body layout; the tag code
/// selects the count escape and color channel rules for the nested records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineShapeKind {
    /// Original form: byte counts only, three-channel colors.
    Shape,
    /// Adds the 0xFF count escape in style arrays.
    Shape2,
    /// Adds the alpha channel to every nested color.
    Shape3,
}

impl DefineShapeKind {
    pub fn code(self) -> u16 {
        match self {
            Self::Shape => TAG_DEFINE_SHAPE,
            Self::Shape2 => TAG_DEFINE_SHAPE2,
            Self::Shape3 => TAG_DEFINE_SHAPE3,
        }
    }

    fn from_code(code: u16) -> Option<Self> {
        match code {
            TAG_DEFINE_SHAPE => Some(Self::Shape),
            TAG_DEFINE_SHAPE2 => Some(Self::Shape2),
            TAG_DEFINE_SHAPE3 => Some(Self::Shape3),
            _ => None,
        }
    }

    fn extended_style_arrays(self) -> bool {
        !matches!(self, Self::Shape)
    }

    fn alpha_colors(self) -> bool {
        matches!(self, Self::Shape3)
    }
}

/// A shape definition: id, bounds, the top-level style arrays, and the
/// bit-packed outline.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineShape {
    pub kind: DefineShapeKind,
    pub id: CharacterId,
    /// Bounding box of the outline in twips.
    pub bounds: Rect,
    pub fills: Vec<FillStyle>,
    pub lines: Vec<LineStyle>,
    pub shape: Shape,
}

impl DefineShape {
    /// Context entries for one pass over the body. Index widths start from
    /// the top-level array lengths; a style change with embedded arrays may
    /// redefine them mid-outline, and the scope restores everything on exit.
    fn entries(&self) -> [(ContextKey, i32); 5] {
        [
            (ContextKey::AlphaColors, self.kind.alpha_colors() as i32),
            (
                ContextKey::ExtendedStyleArrays,
                self.kind.extended_style_arrays() as i32,
            ),
            (
                ContextKey::FillIndexBits,
                bits_for_unsigned(self.fills.len() as u32) as i32,
            ),
            (
                ContextKey::LineIndexBits,
                bits_for_unsigned(self.lines.len() as u32) as i32,
            ),
            (ContextKey::ShapeBitTotal, 0),
        ]
    }

    pub fn body_size(&self, ctx: &mut Context<'_>) -> Result<u32> {
        ctx.with(&self.entries(), |ctx| {
            Ok(2 + self.bounds.byte_size()?
                + styles::fill_styles_size(&self.fills, ctx)?
                + styles::line_styles_size(&self.lines, ctx)?
                + self.shape.prepare(ctx)?)
        })
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        ctx.with(&self.entries(), |ctx| {
            self.id.encode(w);
            self.bounds.encode(w)?;
            encode_fill_styles(w, &self.fills, ctx)?;
            encode_line_styles(w, &self.lines, ctx)?;
            self.shape.encode(w, ctx)
        })
    }
}

pub(crate) fn decode(
    code: u16,
    _length: u32,
    r: &mut BitReader<'_>,
    ctx: &mut Context<'_>,
) -> Result<Tag> {
    let kind = DefineShapeKind::from_code(code).ok_or(Error::Parse {
        context: "shape definition",
        message: format!("tag code {code} is not a shape definition"),
    })?;
    ctx.with(
        &[
            (ContextKey::AlphaColors, kind.alpha_colors() as i32),
            (
                ContextKey::ExtendedStyleArrays,
                kind.extended_style_arrays() as i32,
            ),
            (ContextKey::FillIndexBits, 0),
            (ContextKey::LineIndexBits, 0),
        ],
        |ctx| {
            let id = CharacterId::decode(r)?;
            let bounds = Rect::decode(r)?;
            let fills = decode_fill_styles(r, ctx)?;
            let lines = decode_line_styles(r, ctx)?;
            let shape = Shape::decode(r, ctx)?;
            Ok(Tag::DefineShape(DefineShape {
                kind,
                id,
                bounds,
                fills,
                lines,
                shape,
            }))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{self, TagRegistry};
    use crate::shape::{Line, ShapeRecord, StyleChange};
    use crate::tag;
    use crate::types::Color;

    fn rectangle_outline() -> Shape {
        Shape {
            records: vec![
                ShapeRecord::StyleChange(StyleChange {
                    move_to: Some((0, 0)),
                    fill0: Some(1),
                    ..Default::default()
                }),
                ShapeRecord::Line(Line { dx: 2000, dy: 0 }),
                ShapeRecord::Line(Line { dx: 0, dy: 1000 }),
                ShapeRecord::Line(Line { dx: -2000, dy: 0 }),
                ShapeRecord::Line(Line { dx: 0, dy: -1000 }),
            ],
        }
    }

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

    fn shape_tag(kind: DefineShapeKind, color: Color) -> Tag {
        Tag::DefineShape(DefineShape {
            kind,
            id: CharacterId::new(1).unwrap(),
            bounds: Rect {
                x_min: 0,
                x_max: 2000,
                y_min: 0,
                y_max: 1000,
            },
            fills: vec![FillStyle::Solid(color)],
            lines: vec![],
            shape: rectangle_outline(),
        })
    }

    #[test]
    fn original_form_round_trips_without_alpha() {
        let tag = shape_tag(DefineShapeKind::Shape, Color::rgb(255, 0, 0));
        assert_eq!(round_trip(&tag), tag);
    }

    #[test]
    fn shape2_round_trips() {
        let tag = shape_tag(DefineShapeKind::Shape2, Color::rgb(0, 128, 0));
        assert_eq!(round_trip(&tag), tag);
    }

    #[test]
    fn shape3_preserves_alpha() {
        let tag = shape_tag(DefineShapeKind::Shape3, Color::rgba(0, 0, 255, 77));
        let decoded = round_trip(&tag);
        let Tag::DefineShape(ref shape) = decoded else {
            panic!("expected a shape definition");
        };
        assert_eq!(shape.fills[0], FillStyle::Solid(Color::rgba(0, 0, 255, 77)));
        assert_eq!(decoded, tag);
    }

    #[test]
    fn alpha_mode_does_not_leak_between_tags() {
        // After a DefineShape3 body, a sibling tag must decode colors at
        // three channels again.
        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        let tag = shape_tag(DefineShapeKind::Shape3, Color::rgba(1, 2, 3, 4));
        tag.prepare(&mut ctx).unwrap();
        assert!(!ctx.contains(ContextKey::AlphaColors));
        assert!(!ctx.contains(ContextKey::FillIndexBits));
    }
}
