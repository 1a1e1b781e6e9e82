use crate::bits::{BitReader, BitWriter, bits_for_signed};
use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};

/// Identifier of a defined character (shape, sprite, bitmap, ...).
///
/// Valid identifiers are 1..=65535; zero is reserved. The range is enforced
/// here, at construction, so an invalid graph can never reach the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(u16);

impl CharacterId {
    pub fn new(id: u16) -> Result<Self> {
        if id == 0 {
            return Err(Error::InvalidValue {
                context: "character id",
                value: id as i64,
            });
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub(crate) fn decode(r: &mut BitReader<'_>) -> Result<Self> {
        Self::new(r.read_u16()?)
    }

    pub(crate) fn encode(self, w: &mut BitWriter) {
        w.write_u16(self.0);
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned bounding rectangle in twips (1/20 px).
///
/// On the wire: byte-aligned, a 5-bit field width, then the four coordinates
/// at that width, then padding to the next byte boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Rect {
    fn field_bits(&self) -> Result<u32> {
        let n = bits_for_signed(self.x_min)
            .max(bits_for_signed(self.x_max))
            .max(bits_for_signed(self.y_min))
            .max(bits_for_signed(self.y_max));
        if n > 31 {
            return Err(Error::InvalidValue {
                context: "rect coordinate",
                value: self.x_min as i64,
            });
        }
        Ok(n)
    }

    /// Encoded size in bytes, including trailing alignment.
    pub fn byte_size(&self) -> Result<u32> {
        Ok((5 + 4 * self.field_bits()?).div_ceil(8))
    }

    pub fn decode(r: &mut BitReader<'_>) -> Result<Self> {
        r.align();
        let n = r.read_ubits(5)?;
        let rect = Self {
            x_min: r.read_sbits(n)?,
            x_max: r.read_sbits(n)?,
            y_min: r.read_sbits(n)?,
            y_max: r.read_sbits(n)?,
        };
        r.align();
        Ok(rect)
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        let n = self.field_bits()?;
        w.align();
        w.write_ubits(5, n);
        w.write_sbits(n, self.x_min);
        w.write_sbits(n, self.x_max);
        w.write_sbits(n, self.y_min);
        w.write_sbits(n, self.y_max);
        w.align();
        Ok(())
    }
}

/// RGB or RGBA color. Whether the alpha channel travels on the wire is
/// decided by the `AlphaColors` context flag of the enclosing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Wire size in bytes under the active alpha mode.
    pub fn byte_size(ctx: &Context<'_>) -> u32 {
        if ctx.get_or(ContextKey::AlphaColors, 0) != 0 { 4 } else { 3 }
    }

    pub fn decode(r: &mut BitReader<'_>, ctx: &Context<'_>) -> Result<Self> {
        if ctx.get_or(ContextKey::AlphaColors, 0) != 0 {
            Self::decode_rgba(r)
        } else {
            Self::decode_rgb(r)
        }
    }

    pub fn decode_rgb(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self::rgb(r.read_u8()?, r.read_u8()?, r.read_u8()?))
    }

    pub fn decode_rgba(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self::rgba(
            r.read_u8()?,
            r.read_u8()?,
            r.read_u8()?,
            r.read_u8()?,
        ))
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &Context<'_>) {
        if ctx.get_or(ContextKey::AlphaColors, 0) != 0 {
            self.encode_rgba(w);
        } else {
            self.encode_rgb(w);
        }
    }

    pub fn encode_rgb(&self, w: &mut BitWriter) {
        w.write_u8(self.r);
        w.write_u8(self.g);
        w.write_u8(self.b);
    }

    pub fn encode_rgba(&self, w: &mut BitWriter) {
        w.write_u8(self.r);
        w.write_u8(self.g);
        w.write_u8(self.b);
        w.write_u8(self.a);
    }
}

/// 2×3 affine transform.
///
/// Scale and rotate/skew terms are raw 16.16 fixed-point, translation is in
/// twips. Raw fixed-point is kept rather than floats so a decoded matrix
/// re-encodes to the identical bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Matrix {
    /// (scale_x, scale_y) as raw 16.16 fixed-point, if present.
    pub scale: Option<(i32, i32)>,
    /// (rotate_skew_0, rotate_skew_1) as raw 16.16 fixed-point, if present.
    pub rotate: Option<(i32, i32)>,
    /// (translate_x, translate_y) in twips.
    pub translate: (i32, i32),
}

impl Matrix {
    /// The identity transform: no scale, no rotate, zero translation.
    pub const IDENTITY: Self = Self {
        scale: None,
        rotate: None,
        translate: (0, 0),
    };

    fn pair_bits(pair: (i32, i32)) -> Result<u32> {
        let n = bits_for_signed(pair.0).max(bits_for_signed(pair.1));
        if n > 31 {
            return Err(Error::InvalidValue {
                context: "matrix term",
                value: pair.0 as i64,
            });
        }
        Ok(n)
    }

    fn total_bits(&self) -> Result<u32> {
        let mut bits = 2; // has-scale and has-rotate flags
        if let Some(pair) = self.scale {
            bits += 5 + 2 * Self::pair_bits(pair)?;
        }
        if let Some(pair) = self.rotate {
            bits += 5 + 2 * Self::pair_bits(pair)?;
        }
        bits += 5 + 2 * Self::pair_bits(self.translate)?;
        Ok(bits)
    }

    /// Encoded size in bytes, including trailing alignment.
    pub fn byte_size(&self) -> Result<u32> {
        Ok(self.total_bits()?.div_ceil(8))
    }

    pub fn decode(r: &mut BitReader<'_>) -> Result<Self> {
        r.align();
        let scale = if r.read_ubits(1)? == 1 {
            let n = r.read_ubits(5)?;
            Some((r.read_sbits(n)?, r.read_sbits(n)?))
        } else {
            None
        };
        let rotate = if r.read_ubits(1)? == 1 {
            let n = r.read_ubits(5)?;
            Some((r.read_sbits(n)?, r.read_sbits(n)?))
        } else {
            None
        };
        let n = r.read_ubits(5)?;
        let translate = (r.read_sbits(n)?, r.read_sbits(n)?);
        r.align();
        Ok(Self {
            scale,
            rotate,
            translate,
        })
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        w.align();
        match self.scale {
            Some(pair) => {
                let n = Self::pair_bits(pair)?;
                w.write_ubits(1, 1);
                w.write_ubits(5, n);
                w.write_sbits(n, pair.0);
                w.write_sbits(n, pair.1);
            }
            None => w.write_ubits(1, 0),
        }
        match self.rotate {
            Some(pair) => {
                let n = Self::pair_bits(pair)?;
                w.write_ubits(1, 1);
                w.write_ubits(5, n);
                w.write_sbits(n, pair.0);
                w.write_sbits(n, pair.1);
            }
            None => w.write_ubits(1, 0),
        }
        let n = Self::pair_bits(self.translate)?;
        w.write_ubits(5, n);
        w.write_sbits(n, self.translate.0);
        w.write_sbits(n, self.translate.1);
        w.align();
        Ok(())
    }
}

/// Per-channel color adjustment: `channel * mult / 256 + add`.
///
/// Terms are raw fixed-point, mirroring `Matrix`. The alpha terms travel on
/// the wire only under the `AlphaColors` context flag; when decoding the
/// three-channel form they default to the identity (mult 256, add 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTransform {
    /// (r, g, b, a) multiply terms, 8.8 fixed-point.
    pub mult: Option<(i32, i32, i32, i32)>,
    /// (r, g, b, a) add terms.
    pub add: Option<(i32, i32, i32, i32)>,
}

impl ColorTransform {
    pub const IDENTITY: Self = Self {
        mult: None,
        add: None,
    };

    fn terms(&self, alpha: bool) -> Vec<i32> {
        let mut out = Vec::with_capacity(8);
        for quad in [self.mult, self.add].into_iter().flatten() {
            out.push(quad.0);
            out.push(quad.1);
            out.push(quad.2);
            if alpha {
                out.push(quad.3);
            }
        }
        out
    }

    fn field_bits(&self, alpha: bool) -> Result<u32> {
        let n = self
            .terms(alpha)
            .iter()
            .map(|&v| bits_for_signed(v))
            .max()
            .unwrap_or(1);
        if n > 15 {
            return Err(Error::InvalidValue {
                context: "color transform term",
                value: 0,
            });
        }
        Ok(n)
    }

    /// Encoded size in bytes, including trailing alignment.
    pub fn byte_size(&self, ctx: &Context<'_>) -> Result<u32> {
        let alpha = ctx.get_or(ContextKey::AlphaColors, 0) != 0;
        let n = self.field_bits(alpha)?;
        Ok((6 + n * self.terms(alpha).len() as u32).div_ceil(8))
    }

    pub fn decode(r: &mut BitReader<'_>, ctx: &Context<'_>) -> Result<Self> {
        let alpha = ctx.get_or(ContextKey::AlphaColors, 0) != 0;
        r.align();
        let has_add = r.read_ubits(1)? == 1;
        let has_mult = r.read_ubits(1)? == 1;
        let n = r.read_ubits(4)?;
        let mut read_quad = |r: &mut BitReader<'_>, identity: i32| -> Result<(i32, i32, i32, i32)> {
            Ok((
                r.read_sbits(n)?,
                r.read_sbits(n)?,
                r.read_sbits(n)?,
                if alpha { r.read_sbits(n)? } else { identity },
            ))
        };
        let mult = if has_mult {
            Some(read_quad(r, 256)?)
        } else {
            None
        };
        let add = if has_add { Some(read_quad(r, 0)?) } else { None };
        r.align();
        Ok(Self { mult, add })
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &Context<'_>) -> Result<()> {
        let alpha = ctx.get_or(ContextKey::AlphaColors, 0) != 0;
        let n = self.field_bits(alpha)?;
        w.align();
        w.write_ubits(1, self.add.is_some() as u32);
        w.write_ubits(1, self.mult.is_some() as u32);
        w.write_ubits(4, n);
        let mut write_quad = |w: &mut BitWriter, quad: (i32, i32, i32, i32)| {
            w.write_sbits(n, quad.0);
            w.write_sbits(n, quad.1);
            w.write_sbits(n, quad.2);
            if alpha {
                w.write_sbits(n, quad.3);
            }
        };
        if let Some(quad) = self.mult {
            write_quad(w, quad);
        }
        if let Some(quad) = self.add {
            write_quad(w, quad);
        }
        w.align();
        Ok(())
    }
}
