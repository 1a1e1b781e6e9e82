use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::tag::{MAX_TAG_CODE, Tag};

/// A tag kept as raw bytes.
///
/// The fallback for codes with no registered strategy: the body is carried
/// verbatim so the tag survives a decode and re-encode byte-identically,
/// header included. Also usable directly to emit tags this crate does not
/// model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueTag {
    pub code: u16,
    pub body: Vec<u8>,
}

impl OpaqueTag {
    pub fn body_size(&self) -> Result<u32> {
        if self.code > MAX_TAG_CODE {
            return Err(Error::InvalidValue {
                context: "tag code",
                value: self.code as i64,
            });
        }
        Ok(self.body.len() as u32)
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        w.write_bytes(&self.body);
        Ok(())
    }
}

pub(crate) fn decode(
    code: u16,
    length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Tag> {
    Ok(Tag::Opaque(OpaqueTag {
        code,
        body: r.read_bytes(length as usize)?.to_vec(),
    }))
}
