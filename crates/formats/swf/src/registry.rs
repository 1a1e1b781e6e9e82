use std::collections::HashMap;

use log::warn;

use crate::actions::Action;
use crate::bits::BitReader;
use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};
use crate::filters::Filter;
use crate::shape::ShapeRecord;
use crate::styles::FillStyle;
use crate::tag::{self, Tag};

/// Decodes one movie tag. Invoked with the scanned code and declared body
/// length; the tag header has already been consumed and a mark pushed at the
/// body start.
pub type TagDecoder =
    fn(code: u16, length: u32, r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Tag>;

/// Decodes one action record, after its opcode and length header.
pub type ActionDecoder =
    fn(code: u8, length: u32, r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Action>;

/// Decodes one fill style, after its leading type byte.
pub type FillStyleDecoder =
    fn(code: u8, r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<FillStyle>;

/// Decodes one shape record, after its discriminator bits.
pub type ShapeRecordDecoder = fn(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<ShapeRecord>;

/// Decodes one filter, after its leading id byte.
pub type FilterDecoder = fn(code: u8, r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Filter>;

/// The three shape record shapes selected by the leading discriminator bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRecordKind {
    StyleChange,
    StraightEdge,
    CurvedEdge,
}

/// Maps type codes to decoding strategies for the five record families.
///
/// Registries are cheap to clone, so a caller can take the default, override
/// one family's strategy, and run a decode pass without mutating any shared
/// instance. A registry is never mutated mid-pass.
#[derive(Clone)]
pub struct TagRegistry {
    movie: HashMap<u16, TagDecoder>,
    /// Fallback for unrecognized movie tag codes: opaque pass-through.
    movie_fallback: TagDecoder,
    actions: HashMap<u8, ActionDecoder>,
    /// Fallback for unrecognized action opcodes: opaque pass-through.
    action_fallback: ActionDecoder,
    fills: HashMap<u8, FillStyleDecoder>,
    style_change: ShapeRecordDecoder,
    straight_edge: ShapeRecordDecoder,
    curved_edge: ShapeRecordDecoder,
    filters: HashMap<u8, FilterDecoder>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self {
            movie: crate::tags::default_movie_decoders(),
            movie_fallback: crate::tags::opaque::decode,
            actions: crate::actions::default_action_decoders(),
            action_fallback: crate::actions::decode_opaque,
            fills: crate::styles::default_fill_decoders(),
            style_change: crate::shape::decode_style_change,
            straight_edge: crate::shape::decode_straight_edge,
            curved_edge: crate::shape::decode_curved_edge,
            filters: crate::filters::default_filter_decoders(),
        }
    }
}

impl TagRegistry {
    /// Strategy for a movie tag code, or the opaque fallback.
    pub fn movie_decoder(&self, code: u16) -> TagDecoder {
        self.movie.get(&code).copied().unwrap_or(self.movie_fallback)
    }

    /// Whether a movie tag code has a dedicated (non-fallback) strategy.
    pub fn knows_movie_tag(&self, code: u16) -> bool {
        self.movie.contains_key(&code)
    }

    /// Strategy for an action opcode, or the opaque fallback.
    pub fn action_decoder(&self, code: u8) -> ActionDecoder {
        self.actions
            .get(&code)
            .copied()
            .unwrap_or(self.action_fallback)
    }

    /// Strategy for a fill style type byte. Fill codes are a closed set, so
    /// there is no fallback.
    pub fn fill_decoder(&self, code: u8) -> Option<FillStyleDecoder> {
        self.fills.get(&code).copied()
    }

    pub fn shape_decoder(&self, kind: ShapeRecordKind) -> ShapeRecordDecoder {
        match kind {
            ShapeRecordKind::StyleChange => self.style_change,
            ShapeRecordKind::StraightEdge => self.straight_edge,
            ShapeRecordKind::CurvedEdge => self.curved_edge,
        }
    }

    /// Strategy for a filter id byte. Filter ids are a closed set, so there
    /// is no fallback.
    pub fn filter_decoder(&self, code: u8) -> Option<FilterDecoder> {
        self.filters.get(&code).copied()
    }

    // ── Substitution ─────────────────────────────────────────────────────────

    pub fn set_movie_decoder(&mut self, code: u16, decoder: TagDecoder) {
        self.movie.insert(code, decoder);
    }

    pub fn set_movie_fallback(&mut self, decoder: TagDecoder) {
        self.movie_fallback = decoder;
    }

    pub fn set_action_decoder(&mut self, code: u8, decoder: ActionDecoder) {
        self.actions.insert(code, decoder);
    }

    pub fn set_fill_decoder(&mut self, code: u8, decoder: FillStyleDecoder) {
        self.fills.insert(code, decoder);
    }

    pub fn set_shape_decoder(&mut self, kind: ShapeRecordKind, decoder: ShapeRecordDecoder) {
        match kind {
            ShapeRecordKind::StyleChange => self.style_change = decoder,
            ShapeRecordKind::StraightEdge => self.straight_edge = decoder,
            ShapeRecordKind::CurvedEdge => self.curved_edge = decoder,
        }
    }

    pub fn set_filter_decoder(&mut self, code: u8, decoder: FilterDecoder) {
        self.filters.insert(code, decoder);
    }
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry")
            .field("movie_tags", &self.movie.len())
            .field("actions", &self.actions.len())
            .field("fills", &self.fills.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Decode the next movie tag and verify its declared length.
///
/// Scans the type code without consuming (code and length share one 16-bit
/// word), dispatches to the registered strategy, and asserts that the body
/// consumed exactly the declared byte count. Unknown codes decode opaquely;
/// only a malformed body is an error.
pub fn decode_tag(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Tag> {
    let word = r.scan_u16()?;
    let code = word >> 6;
    let registry = ctx.registry();
    if !registry.knows_movie_tag(code) && code != 0 {
        warn!("unknown tag code {code} at offset {:#x}, keeping raw", r.position());
    }
    let decoder = registry.movie_decoder(code);

    let (code, length) = tag::read_tag_header(r)?;
    ctx.put(ContextKey::CurrentTag, code as i32);
    r.mark();
    let result = decoder(code, length, r, ctx);
    let tag = match result {
        Ok(tag) => {
            r.check(length)?;
            tag
        }
        Err(e) => {
            r.unmark();
            ctx.remove(ContextKey::CurrentTag);
            return Err(e);
        }
    };
    r.unmark();
    ctx.remove(ContextKey::CurrentTag);
    Ok(tag)
}

/// Decode the next action record and verify its declared length.
pub fn decode_action(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Action> {
    let code = r.read_u8()?;
    let length = if code >= 0x80 { r.read_u16()? as u32 } else { 0 };
    let decoder = ctx.registry().action_decoder(code);
    r.mark();
    let action = decoder(code, length, r, ctx)?;
    r.check(length)?;
    r.unmark();
    Ok(action)
}

/// Decode one fill style via the registered strategy for its type byte.
pub fn decode_fill_style(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<FillStyle> {
    let offset = r.position();
    let code = r.read_u8()?;
    let decoder = ctx
        .registry()
        .fill_decoder(code)
        .ok_or(Error::UnknownFillStyle { code, offset })?;
    decoder(code, r, ctx)
}

/// Decode one filter via the registered strategy for its id byte.
pub fn decode_filter(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Filter> {
    let offset = r.position();
    let code = r.read_u8()?;
    let decoder = ctx
        .registry()
        .filter_decoder(code)
        .ok_or(Error::UnknownFilter { code, offset })?;
    decoder(code, r, ctx)
}
