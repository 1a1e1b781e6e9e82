//! The movie envelope: signature, version, length, and the tag sequence.
//!
//! The first three bytes select plain (`FWS`) or zlib-compressed (`CWS`)
//! storage; compression starts after the 8-byte prologue and the declared
//! 32-bit length always counts uncompressed bytes. The fixed header fields
//! that follow the prologue are modeled as a pseudo-record, so `tags[0]` of
//! a decoded movie is always [`Tag::Header`].

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::{debug, warn};

use crate::bits::{BitReader, BitWriter};
use crate::context::{Context, ContextKey};
use crate::error::{Error, Result};
use crate::registry::{self, TagRegistry};
use crate::tag::{self, TAG_END, Tag};
use crate::tags::movie_header::MovieHeader;

pub const SIGNATURE_UNCOMPRESSED: [u8; 3] = *b"FWS";
pub const SIGNATURE_COMPRESSED: [u8; 3] = *b"CWS";

/// Number of bytes before the (possibly compressed) body.
const PROLOGUE_SIZE: u32 = 8;

/// A complete movie: format version, storage mode, and tag sequence.
///
/// `tags[0]` is the [`Tag::Header`] pseudo-record; the sequence ends with
/// [`Tag::End`] (appended on encode if absent).
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub version: u8,
    /// Store the body zlib-compressed (`CWS`).
    pub compressed: bool,
    pub tags: Vec<Tag>,
}

impl Movie {
    pub fn new(version: u8, header: MovieHeader) -> Self {
        Self {
            version,
            compressed: false,
            tags: vec![Tag::Header(header)],
        }
    }

    /// Decode a movie with the default registry.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_with(data, &TagRegistry::default())
    }

    /// Decode a movie, dispatching records through `registry`.
    pub fn decode_with(data: &[u8], registry: &TagRegistry) -> Result<Self> {
        let mut r = BitReader::new(data);
        let sig = r.read_bytes(3)?;
        let compressed = match [sig[0], sig[1], sig[2]] {
            SIGNATURE_UNCOMPRESSED => false,
            SIGNATURE_COMPRESSED => true,
            found => return Err(Error::InvalidSignature { found }),
        };
        let version = r.read_u8()?;
        let declared = r.read_u32()?;

        let rest = r.read_bytes(r.remaining())?;
        let decompressed;
        let body: &[u8] = if compressed {
            let mut out = Vec::with_capacity(declared.saturating_sub(PROLOGUE_SIZE) as usize);
            ZlibDecoder::new(rest)
                .read_to_end(&mut out)
                .map_err(|source| Error::Decompress {
                    offset: PROLOGUE_SIZE as usize,
                    source,
                })?;
            decompressed = out;
            &decompressed
        } else {
            rest
        };
        // The declared length is advisory in practice; real files get it
        // wrong and players ignore it.
        if body.len() as u64 + PROLOGUE_SIZE as u64 != declared as u64 {
            warn!(
                "declared movie length {declared} does not match actual {}",
                body.len() as u64 + PROLOGUE_SIZE as u64
            );
        }

        let mut r = BitReader::new(body);
        let mut ctx = Context::new(registry);
        ctx.put(ContextKey::Version, version as i32);

        let mut tags = vec![Tag::Header(MovieHeader::decode(&mut r)?)];
        loop {
            if r.remaining() == 0 {
                warn!("movie body ends without an End tag");
                break;
            }
            let tag = registry::decode_tag(&mut r, &mut ctx)?;
            let done = tag == Tag::End;
            tags.push(tag);
            if done {
                break;
            }
        }
        debug!(
            "decoded movie: version {version}, {} tags, {} body bytes",
            tags.len(),
            body.len()
        );
        Ok(Self {
            version,
            compressed,
            tags,
        })
    }

    /// Encode a movie with the default registry.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(&TagRegistry::default())
    }

    /// Encode a movie: a size pass over every record, then a write pass, with
    /// each record's emitted byte count verified against its sized length.
    pub fn encode_with(&self, registry: &TagRegistry) -> Result<Vec<u8>> {
        if !matches!(self.tags.first(), Some(Tag::Header(_))) {
            return Err(Error::Parse {
                context: "movie",
                message: "first tag must be the movie header".into(),
            });
        }

        let mut ctx = Context::new(registry);
        ctx.put(ContextKey::Version, self.version as i32);

        // Size phase.
        let mut lengths = Vec::with_capacity(self.tags.len());
        let mut total = PROLOGUE_SIZE;
        for tag in &self.tags {
            let length = tag.prepare(&mut ctx)?;
            total += length;
            if tag.code().is_some() {
                total += tag::tag_header_size(length);
            }
            lengths.push(length);
        }
        let has_end = matches!(self.tags.last(), Some(Tag::End));
        if !has_end {
            total += 2;
        }

        // Write phase.
        let mut w = BitWriter::with_capacity(total as usize - PROLOGUE_SIZE as usize);
        for (tag, &length) in self.tags.iter().zip(&lengths) {
            if let Some(code) = tag.code() {
                tag::write_tag_header(&mut w, code, length)?;
            }
            w.mark();
            tag.encode_body(&mut w, &mut ctx)?;
            w.check(length)?;
            w.unmark();
        }
        if !has_end {
            tag::write_tag_header(&mut w, TAG_END, 0)?;
        }
        let body = w.into_bytes();
        debug_assert_eq!(body.len() as u32 + PROLOGUE_SIZE, total);

        let mut out = Vec::with_capacity(total as usize);
        out.extend_from_slice(if self.compressed {
            &SIGNATURE_COMPRESSED
        } else {
            &SIGNATURE_UNCOMPRESSED
        });
        out.push(self.version);
        out.extend_from_slice(&total.to_le_bytes());
        if self.compressed {
            let mut encoder = ZlibEncoder::new(out, Compression::default());
            encoder
                .write_all(&body)
                .map_err(|source| Error::Compress { source })?;
            out = encoder
                .finish()
                .map_err(|source| Error::Compress { source })?;
        } else {
            out.extend_from_slice(&body);
        }
        debug!(
            "encoded movie: version {}, {} tags, {} bytes on disk",
            self.version,
            self.tags.len(),
            out.len()
        );
        Ok(out)
    }
}
