use std::collections::HashMap;

use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::registry::{self, FilterDecoder};
use crate::types::Color;

const FILTER_DROP_SHADOW: u8 = 0;
const FILTER_BLUR: u8 = 1;
const FILTER_GLOW: u8 = 2;
const FILTER_COLOR_MATRIX: u8 = 6;

/// A rendering filter attached to a placed object.
///
/// Filters have no length prefix, so the id space is closed: an
/// unrecognized id is a decode error, not an opaque fallback. Fixed-point
/// fields are kept raw for byte-identical re-encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    DropShadow {
        color: Color,
        /// Horizontal blur, raw 16.16 fixed-point.
        blur_x: i32,
        /// Vertical blur, raw 16.16 fixed-point.
        blur_y: i32,
        /// Shadow angle in radians, raw 16.16 fixed-point.
        angle: i32,
        /// Shadow distance in pixels, raw 16.16 fixed-point.
        distance: i32,
        /// Strength, raw 8.8 fixed-point.
        strength: i16,
        /// Inner/knockout/composite flags plus a 5-bit pass count.
        flags: u8,
    },
    Blur {
        blur_x: i32,
        blur_y: i32,
        /// Pass count in the top 5 bits; low 3 bits reserved.
        passes: u8,
    },
    Glow {
        color: Color,
        blur_x: i32,
        blur_y: i32,
        strength: i16,
        flags: u8,
    },
    ColorMatrix {
        /// 4×5 row-major matrix applied to (r, g, b, a, 1).
        matrix: [f32; 20],
    },
}

impl Filter {
    fn code(&self) -> u8 {
        match self {
            Self::DropShadow { .. } => FILTER_DROP_SHADOW,
            Self::Blur { .. } => FILTER_BLUR,
            Self::Glow { .. } => FILTER_GLOW,
            Self::ColorMatrix { .. } => FILTER_COLOR_MATRIX,
        }
    }

    /// Encoded size in bytes, including the leading id byte.
    pub fn byte_size(&self) -> u32 {
        match self {
            Self::DropShadow { .. } => 1 + 4 + 4 + 4 + 4 + 4 + 2 + 1,
            Self::Blur { .. } => 1 + 4 + 4 + 1,
            Self::Glow { .. } => 1 + 4 + 4 + 4 + 2 + 1,
            Self::ColorMatrix { .. } => 1 + 20 * 4,
        }
    }

    pub fn encode(&self, w: &mut BitWriter) {
        w.write_u8(self.code());
        match self {
            Self::DropShadow {
                color,
                blur_x,
                blur_y,
                angle,
                distance,
                strength,
                flags,
            } => {
                color.encode_rgba(w);
                w.write_i32(*blur_x);
                w.write_i32(*blur_y);
                w.write_i32(*angle);
                w.write_i32(*distance);
                w.write_i16(*strength);
                w.write_u8(*flags);
            }
            Self::Blur {
                blur_x,
                blur_y,
                passes,
            } => {
                w.write_i32(*blur_x);
                w.write_i32(*blur_y);
                w.write_u8(*passes);
            }
            Self::Glow {
                color,
                blur_x,
                blur_y,
                strength,
                flags,
            } => {
                color.encode_rgba(w);
                w.write_i32(*blur_x);
                w.write_i32(*blur_y);
                w.write_i16(*strength);
                w.write_u8(*flags);
            }
            Self::ColorMatrix { matrix } => {
                for term in matrix {
                    w.write_f32(*term);
                }
            }
        }
    }
}

fn decode_drop_shadow(_code: u8, r: &mut BitReader<'_>, _ctx: &mut Context<'_>) -> Result<Filter> {
    Ok(Filter::DropShadow {
        color: Color::decode_rgba(r)?,
        blur_x: r.read_i32()?,
        blur_y: r.read_i32()?,
        angle: r.read_i32()?,
        distance: r.read_i32()?,
        strength: r.read_i16()?,
        flags: r.read_u8()?,
    })
}

fn decode_blur(_code: u8, r: &mut BitReader<'_>, _ctx: &mut Context<'_>) -> Result<Filter> {
    Ok(Filter::Blur {
        blur_x: r.read_i32()?,
        blur_y: r.read_i32()?,
        passes: r.read_u8()?,
    })
}

fn decode_glow(_code: u8, r: &mut BitReader<'_>, _ctx: &mut Context<'_>) -> Result<Filter> {
    Ok(Filter::Glow {
        color: Color::decode_rgba(r)?,
        blur_x: r.read_i32()?,
        blur_y: r.read_i32()?,
        strength: r.read_i16()?,
        flags: r.read_u8()?,
    })
}

fn decode_color_matrix(_code: u8, r: &mut BitReader<'_>, _ctx: &mut Context<'_>) -> Result<Filter> {
    let mut matrix = [0f32; 20];
    for term in &mut matrix {
        *term = r.read_f32()?;
    }
    Ok(Filter::ColorMatrix { matrix })
}

pub(crate) fn default_filter_decoders() -> HashMap<u8, FilterDecoder> {
    let mut map: HashMap<u8, FilterDecoder> = HashMap::new();
    map.insert(FILTER_DROP_SHADOW, decode_drop_shadow);
    map.insert(FILTER_BLUR, decode_blur);
    map.insert(FILTER_GLOW, decode_glow);
    map.insert(FILTER_COLOR_MATRIX, decode_color_matrix);
    map
}

/// The count is a single byte.
fn check_count(len: usize) -> Result<()> {
    if len > 0xFF {
        return Err(Error::InvalidValue {
            context: "filter list count",
            value: len as i64,
        });
    }
    Ok(())
}

/// A filter list: a count byte followed by the filters.
pub fn filter_list_size(filters: &[Filter]) -> Result<u32> {
    check_count(filters.len())?;
    Ok(1 + filters.iter().map(Filter::byte_size).sum::<u32>())
}

pub fn decode_filter_list(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Vec<Filter>> {
    let count = r.read_u8()? as usize;
    let mut filters = Vec::with_capacity(count);
    for _ in 0..count {
        filters.push(registry::decode_filter(r, ctx)?);
    }
    Ok(filters)
}

pub fn encode_filter_list(w: &mut BitWriter, filters: &[Filter]) -> Result<()> {
    check_count(filters.len())?;
    w.write_u8(filters.len() as u8);
    for filter in filters {
        filter.encode(w);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::TagRegistry;

    #[test]
    fn filter_list_round_trips() {
        let filters = vec![
            Filter::DropShadow {
                color: Color::rgba(0, 0, 0, 128),
                blur_x: 5 << 16,
                blur_y: 5 << 16,
                angle: 0x4000,
                distance: 4 << 16,
                strength: 0x100,
                flags: 0b0010_0001,
            },
            Filter::Blur {
                blur_x: 10 << 16,
                blur_y: 2 << 16,
                passes: 3 << 3,
            },
            Filter::Glow {
                color: Color::rgba(255, 0, 0, 255),
                blur_x: 1 << 16,
                blur_y: 1 << 16,
                strength: 0x200,
                flags: 0b0010_0001,
            },
            Filter::ColorMatrix {
                matrix: {
                    let mut m = [0f32; 20];
                    m[0] = 1.0;
                    m[6] = 1.0;
                    m[12] = 1.0;
                    m[18] = 0.5;
                    m
                },
            },
        ];

        let mut w = BitWriter::new();
        encode_filter_list(&mut w, &filters).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len() as u32, filter_list_size(&filters).unwrap());

        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        let mut r = BitReader::new(&bytes);
        assert_eq!(decode_filter_list(&mut r, &mut ctx).unwrap(), filters);
        assert_eq!(r.position(), bytes.len());
    }

    #[test]
    fn oversized_filter_list_is_rejected() {
        // A count byte of 256 would wrap to 0 and silently orphan every
        // filter body behind it.
        let filters = vec![
            Filter::Blur {
                blur_x: 1 << 16,
                blur_y: 1 << 16,
                passes: 1 << 3,
            };
            256
        ];
        assert!(matches!(
            filter_list_size(&filters),
            Err(Error::InvalidValue { .. })
        ));
        let mut w = BitWriter::new();
        assert!(matches!(
            encode_filter_list(&mut w, &filters),
            Err(Error::InvalidValue { .. })
        ));

        let filters = filters[..255].to_vec();
        assert_eq!(filter_list_size(&filters).unwrap(), 1 + 255 * 10);
    }

    #[test]
    fn unknown_filter_id_is_an_error() {
        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        let bytes = [0x09u8];
        let mut r = BitReader::new(&bytes);
        let err = registry::decode_filter(&mut r, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnknownFilter { code: 9, offset: 0 }));
    }
}
