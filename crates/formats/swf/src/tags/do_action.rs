use crate::actions::{self, Action};
use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::Result;
use crate::tag::Tag;

/// Script actions executed when the current frame is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct DoAction {
    pub actions: Vec<Action>,
}

impl DoAction {
    pub fn body_size(&self) -> Result<u32> {
        actions::action_list_size(&self.actions)
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        actions::encode_action_list(w, &self.actions)
    }
}

pub(crate) fn decode(
    _code: u16,
    _length: u32,
    r: &mut BitReader<'_>,
    ctx: &mut Context<'_>,
) -> Result<Tag> {
    Ok(Tag::DoAction(DoAction {
        actions: actions::decode_action_list(r, ctx)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::PushValue;
    use crate::registry::{self, TagRegistry};
    use crate::tag;

    #[test]
    fn do_action_round_trips_through_the_tag_codec() {
        let tag = Tag::DoAction(DoAction {
            actions: vec![
                Action::Push(vec![PushValue::Str("label".into())]),
                Action::GotoFrame(3),
                Action::Play,
            ],
        });

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
        assert_eq!(registry::decode_tag(&mut r, &mut ctx).unwrap(), tag);
    }
}
