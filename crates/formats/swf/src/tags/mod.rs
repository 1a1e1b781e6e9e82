//! Movie tag bodies and their default decoding strategies.

pub mod control;
pub mod define_shape;
pub mod do_action;
pub mod movie_header;
pub mod opaque;
pub mod place;

use std::collections::HashMap;

use crate::registry::TagDecoder;
use crate::tag::{
    TAG_DEFINE_SHAPE, TAG_DEFINE_SHAPE2, TAG_DEFINE_SHAPE3, TAG_DO_ACTION, TAG_END,
    TAG_FRAME_LABEL, TAG_PLACE_OBJECT2, TAG_PLACE_OBJECT3, TAG_REMOVE_OBJECT2,
    TAG_SET_BACKGROUND_COLOR, TAG_SHOW_FRAME,
};

pub(crate) fn default_movie_decoders() -> HashMap<u16, TagDecoder> {
    let mut map: HashMap<u16, TagDecoder> = HashMap::new();
    map.insert(TAG_END, control::decode_end);
    map.insert(TAG_SHOW_FRAME, control::decode_show_frame);
    map.insert(TAG_SET_BACKGROUND_COLOR, control::decode_set_background_color);
    map.insert(TAG_FRAME_LABEL, control::decode_frame_label);
    map.insert(TAG_REMOVE_OBJECT2, control::decode_remove_object2);
    map.insert(TAG_DEFINE_SHAPE, define_shape::decode);
    map.insert(TAG_DEFINE_SHAPE2, define_shape::decode);
    map.insert(TAG_DEFINE_SHAPE3, define_shape::decode);
    map.insert(TAG_PLACE_OBJECT2, place::decode_place_object2);
    map.insert(TAG_PLACE_OBJECT3, place::decode_place_object3);
    map.insert(TAG_DO_ACTION, do_action::decode);
    map
}
