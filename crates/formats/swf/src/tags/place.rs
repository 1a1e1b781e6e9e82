//! Display list placement tags.
//!
//! Both place tags share the flag-gated optional-field layout: a flag byte
//! (two for PlaceObject3) and a depth, then one field per set flag in a
//! fixed order. Clip action blocks are carried as raw bytes; their layout is
//! version-dependent and nothing here needs to look inside them.

use crate::bits::{BitReader, BitWriter};
use crate::context::{Context, ContextKey};
use crate::error::Result;
use crate::filters::{self, Filter};
use crate::tag::Tag;
use crate::types::{CharacterId, ColorTransform, Matrix};

const PLACE_MOVE: u8 = 0x01;
const PLACE_CHARACTER: u8 = 0x02;
const PLACE_MATRIX: u8 = 0x04;
const PLACE_COLOR_TRANSFORM: u8 = 0x08;
const PLACE_RATIO: u8 = 0x10;
const PLACE_NAME: u8 = 0x20;
const PLACE_CLIP_DEPTH: u8 = 0x40;
const PLACE_CLIP_ACTIONS: u8 = 0x80;

const PLACE3_FILTERS: u8 = 0x01;
const PLACE3_BLEND_MODE: u8 = 0x02;
const PLACE3_BITMAP_CACHE: u8 = 0x04;
const PLACE3_CLASS_NAME: u8 = 0x08;
const PLACE3_HAS_IMAGE: u8 = 0x10;

/// Places a character on the display list or modifies the one at `depth`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceObject2 {
    pub depth: u16,
    /// Modify the existing object at this depth instead of placing a new one.
    pub is_move: bool,
    pub character: Option<CharacterId>,
    pub matrix: Option<Matrix>,
    pub color_transform: Option<ColorTransform>,
    /// Morph ratio, 0-65535.
    pub ratio: Option<u16>,
    pub name: Option<String>,
    pub clip_depth: Option<u16>,
    /// Raw clip action block, preserved verbatim.
    pub clip_actions: Option<Vec<u8>>,
}

impl PlaceObject2 {
    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.is_move {
            flags |= PLACE_MOVE;
        }
        if self.character.is_some() {
            flags |= PLACE_CHARACTER;
        }
        if self.matrix.is_some() {
            flags |= PLACE_MATRIX;
        }
        if self.color_transform.is_some() {
            flags |= PLACE_COLOR_TRANSFORM;
        }
        if self.ratio.is_some() {
            flags |= PLACE_RATIO;
        }
        if self.name.is_some() {
            flags |= PLACE_NAME;
        }
        if self.clip_depth.is_some() {
            flags |= PLACE_CLIP_DEPTH;
        }
        if self.clip_actions.is_some() {
            flags |= PLACE_CLIP_ACTIONS;
        }
        flags
    }

    pub fn body_size(&self, ctx: &mut Context<'_>) -> Result<u32> {
        let mut size = 1 + 2;
        if self.character.is_some() {
            size += 2;
        }
        if let Some(matrix) = &self.matrix {
            size += matrix.byte_size()?;
        }
        if let Some(cx) = &self.color_transform {
            // Place-tag color transforms always carry the alpha channel.
            size += ctx.with(&[(ContextKey::AlphaColors, 1)], |ctx| cx.byte_size(ctx))?;
        }
        if self.ratio.is_some() {
            size += 2;
        }
        if let Some(name) = &self.name {
            size += name.len() as u32 + 1;
        }
        if self.clip_depth.is_some() {
            size += 2;
        }
        if let Some(actions) = &self.clip_actions {
            size += actions.len() as u32;
        }
        Ok(size)
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        w.write_u8(self.flags());
        w.write_u16(self.depth);
        self.encode_optional_fields(w, ctx)
    }

    fn encode_optional_fields(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        if let Some(id) = self.character {
            id.encode(w);
        }
        if let Some(matrix) = &self.matrix {
            matrix.encode(w)?;
        }
        if let Some(cx) = &self.color_transform {
            ctx.with(&[(ContextKey::AlphaColors, 1)], |ctx| cx.encode(w, ctx))?;
        }
        if let Some(ratio) = self.ratio {
            w.write_u16(ratio);
        }
        if let Some(name) = &self.name {
            w.write_string(name);
        }
        if let Some(clip_depth) = self.clip_depth {
            w.write_u16(clip_depth);
        }
        if let Some(actions) = &self.clip_actions {
            w.write_bytes(actions);
        }
        Ok(())
    }
}

/// PlaceObject2 plus filters, blend mode, bitmap caching, and class-name
/// instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceObject3 {
    pub depth: u16,
    pub is_move: bool,
    /// The placed character is an image. Carried as a bare flag; it gates no
    /// field of its own.
    pub has_image: bool,
    pub class_name: Option<String>,
    pub character: Option<CharacterId>,
    pub matrix: Option<Matrix>,
    pub color_transform: Option<ColorTransform>,
    pub ratio: Option<u16>,
    pub name: Option<String>,
    pub clip_depth: Option<u16>,
    pub filters: Option<Vec<Filter>>,
    pub blend_mode: Option<u8>,
    /// Nonzero requests bitmap caching for the placed object.
    pub bitmap_cache: Option<u8>,
    pub clip_actions: Option<Vec<u8>>,
}

impl PlaceObject3 {
    fn base(&self) -> PlaceObject2 {
        PlaceObject2 {
            depth: self.depth,
            is_move: self.is_move,
            character: self.character,
            matrix: self.matrix,
            color_transform: self.color_transform,
            ratio: self.ratio,
            name: self.name.clone(),
            clip_depth: self.clip_depth,
            clip_actions: self.clip_actions.clone(),
        }
    }

    fn flags2(&self) -> u8 {
        let mut flags = 0;
        if self.filters.is_some() {
            flags |= PLACE3_FILTERS;
        }
        if self.blend_mode.is_some() {
            flags |= PLACE3_BLEND_MODE;
        }
        if self.bitmap_cache.is_some() {
            flags |= PLACE3_BITMAP_CACHE;
        }
        if self.class_name.is_some() {
            flags |= PLACE3_CLASS_NAME;
        }
        if self.has_image {
            flags |= PLACE3_HAS_IMAGE;
        }
        flags
    }

    pub fn body_size(&self, ctx: &mut Context<'_>) -> Result<u32> {
        // One extra flag byte on top of the PlaceObject2 layout.
        let mut size = 1 + self.base().body_size(ctx)?;
        if let Some(class_name) = &self.class_name {
            size += class_name.len() as u32 + 1;
        }
        if let Some(filters) = &self.filters {
            size += filters::filter_list_size(filters)?;
        }
        if self.blend_mode.is_some() {
            size += 1;
        }
        if self.bitmap_cache.is_some() {
            size += 1;
        }
        Ok(size)
    }

    pub fn encode(&self, w: &mut BitWriter, ctx: &mut Context<'_>) -> Result<()> {
        let base = self.base();
        w.write_u8(base.flags());
        w.write_u8(self.flags2());
        w.write_u16(self.depth);
        // Adobe's documentation says the class name follows whenever
        // `has_class_name || (has_image && has_character)`; files produced by
        // the official tools carry it only under the dedicated flag, so only
        // that flag is honored here, in both directions.
        if let Some(class_name) = &self.class_name {
            w.write_string(class_name);
        }
        if let Some(id) = self.character {
            id.encode(w);
        }
        if let Some(matrix) = &self.matrix {
            matrix.encode(w)?;
        }
        if let Some(cx) = &self.color_transform {
            ctx.with(&[(ContextKey::AlphaColors, 1)], |ctx| cx.encode(w, ctx))?;
        }
        if let Some(ratio) = self.ratio {
            w.write_u16(ratio);
        }
        if let Some(name) = &self.name {
            w.write_string(name);
        }
        if let Some(clip_depth) = self.clip_depth {
            w.write_u16(clip_depth);
        }
        if let Some(filters) = &self.filters {
            filters::encode_filter_list(w, filters)?;
        }
        if let Some(blend_mode) = self.blend_mode {
            w.write_u8(blend_mode);
        }
        if let Some(cache) = self.bitmap_cache {
            w.write_u8(cache);
        }
        if let Some(actions) = &self.clip_actions {
            w.write_bytes(actions);
        }
        Ok(())
    }
}

// ── Registry strategies ──────────────────────────────────────────────────────

pub(crate) fn decode_place_object2(
    _code: u16,
    length: u32,
    r: &mut BitReader<'_>,
    ctx: &mut Context<'_>,
) -> Result<Tag> {
    let flags = r.read_u8()?;
    let depth = r.read_u16()?;
    let character = if flags & PLACE_CHARACTER != 0 {
        Some(CharacterId::decode(r)?)
    } else {
        None
    };
    let matrix = if flags & PLACE_MATRIX != 0 {
        Some(Matrix::decode(r)?)
    } else {
        None
    };
    let color_transform = if flags & PLACE_COLOR_TRANSFORM != 0 {
        Some(ctx.with(&[(ContextKey::AlphaColors, 1)], |ctx| {
            ColorTransform::decode(r, ctx)
        })?)
    } else {
        None
    };
    let ratio = if flags & PLACE_RATIO != 0 {
        Some(r.read_u16()?)
    } else {
        None
    };
    let name = if flags & PLACE_NAME != 0 {
        Some(r.read_string()?)
    } else {
        None
    };
    let clip_depth = if flags & PLACE_CLIP_DEPTH != 0 {
        Some(r.read_u16()?)
    } else {
        None
    };
    let clip_actions = if flags & PLACE_CLIP_ACTIONS != 0 {
        let rest = length as usize - r.bytes_read();
        Some(r.read_bytes(rest)?.to_vec())
    } else {
        None
    };
    Ok(Tag::PlaceObject2(PlaceObject2 {
        depth,
        is_move: flags & PLACE_MOVE != 0,
        character,
        matrix,
        color_transform,
        ratio,
        name,
        clip_depth,
        clip_actions,
    }))
}

pub(crate) fn decode_place_object3(
    _code: u16,
    length: u32,
    r: &mut BitReader<'_>,
    ctx: &mut Context<'_>,
) -> Result<Tag> {
    let flags = r.read_u8()?;
    let flags2 = r.read_u8()?;
    let depth = r.read_u16()?;
    // Dedicated-flag gate only; see the note in `encode`.
    let class_name = if flags2 & PLACE3_CLASS_NAME != 0 {
        Some(r.read_string()?)
    } else {
        None
    };
    let character = if flags & PLACE_CHARACTER != 0 {
        Some(CharacterId::decode(r)?)
    } else {
        None
    };
    let matrix = if flags & PLACE_MATRIX != 0 {
        Some(Matrix::decode(r)?)
    } else {
        None
    };
    let color_transform = if flags & PLACE_COLOR_TRANSFORM != 0 {
        Some(ctx.with(&[(ContextKey::AlphaColors, 1)], |ctx| {
            ColorTransform::decode(r, ctx)
        })?)
    } else {
        None
    };
    let ratio = if flags & PLACE_RATIO != 0 {
        Some(r.read_u16()?)
    } else {
        None
    };
    let name = if flags & PLACE_NAME != 0 {
        Some(r.read_string()?)
    } else {
        None
    };
    let clip_depth = if flags & PLACE_CLIP_DEPTH != 0 {
        Some(r.read_u16()?)
    } else {
        None
    };
    let filters = if flags2 & PLACE3_FILTERS != 0 {
        Some(filters::decode_filter_list(r, ctx)?)
    } else {
        None
    };
    let blend_mode = if flags2 & PLACE3_BLEND_MODE != 0 {
        Some(r.read_u8()?)
    } else {
        None
    };
    let bitmap_cache = if flags2 & PLACE3_BITMAP_CACHE != 0 {
        Some(r.read_u8()?)
    } else {
        None
    };
    let clip_actions = if flags & PLACE_CLIP_ACTIONS != 0 {
        let rest = length as usize - r.bytes_read();
        Some(r.read_bytes(rest)?.to_vec())
    } else {
        None
    };
    Ok(Tag::PlaceObject3(PlaceObject3 {
        depth,
        is_move: flags & PLACE_MOVE != 0,
        has_image: flags2 & PLACE3_HAS_IMAGE != 0,
        class_name,
        character,
        matrix,
        color_transform,
        ratio,
        name,
        clip_depth,
        filters,
        blend_mode,
        bitmap_cache,
        clip_actions,
    }))
}
