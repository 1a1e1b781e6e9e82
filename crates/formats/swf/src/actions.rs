use std::collections::HashMap;

use crate::bits::{BitReader, BitWriter};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::registry::{self, ActionDecoder};

const ACTION_NEXT_FRAME: u8 = 0x04;
const ACTION_PLAY: u8 = 0x06;
const ACTION_STOP: u8 = 0x07;
const ACTION_GOTO_FRAME: u8 = 0x81;
const ACTION_GET_URL: u8 = 0x83;
const ACTION_PUSH: u8 = 0x96;

/// One value pushed by a `Push` action.
///
/// Fixed-width numeric kinds are kept in their wire representation so a
/// decoded stack re-encodes byte-identically.
#[derive(Debug, Clone, PartialEq)]
pub enum PushValue {
    Str(String),
    Float(f32),
    Null,
    Undefined,
    Register(u8),
    Bool(bool),
    Double(f64),
    Int(i32),
    /// Index into the constant pool, 8-bit form.
    Const8(u8),
    /// Index into the constant pool, 16-bit form.
    Const16(u16),
}

impl PushValue {
    /// Encoded size in bytes, including the leading kind byte.
    fn byte_size(&self) -> u32 {
        1 + match self {
            Self::Str(s) => s.len() as u32 + 1,
            Self::Float(_) => 4,
            Self::Null | Self::Undefined => 0,
            Self::Register(_) | Self::Const8(_) => 1,
            Self::Bool(_) => 1,
            Self::Double(_) => 8,
            Self::Int(_) => 4,
            Self::Const16(_) => 2,
        }
    }

    fn decode(r: &mut BitReader<'_>) -> Result<Self> {
        let kind = r.read_u8()?;
        Ok(match kind {
            0 => Self::Str(r.read_string()?),
            1 => Self::Float(r.read_f32()?),
            2 => Self::Null,
            3 => Self::Undefined,
            4 => Self::Register(r.read_u8()?),
            5 => Self::Bool(r.read_u8()? != 0),
            6 => {
                // Doubles are stored as two little-endian words, high word
                // first.
                let high = r.read_u32()? as u64;
                let low = r.read_u32()? as u64;
                Self::Double(f64::from_bits(high << 32 | low))
            }
            7 => Self::Int(r.read_i32()?),
            8 => Self::Const8(r.read_u8()?),
            9 => Self::Const16(r.read_u16()?),
            other => {
                return Err(Error::Parse {
                    context: "push value",
                    message: format!("unknown push value kind {other}"),
                });
            }
        })
    }

    fn encode(&self, w: &mut BitWriter) {
        match self {
            Self::Str(s) => {
                w.write_u8(0);
                w.write_string(s);
            }
            Self::Float(v) => {
                w.write_u8(1);
                w.write_f32(*v);
            }
            Self::Null => w.write_u8(2),
            Self::Undefined => w.write_u8(3),
            Self::Register(v) => {
                w.write_u8(4);
                w.write_u8(*v);
            }
            Self::Bool(v) => {
                w.write_u8(5);
                w.write_u8(*v as u8);
            }
            Self::Double(v) => {
                w.write_u8(6);
                let bits = v.to_bits();
                w.write_u32((bits >> 32) as u32);
                w.write_u32(bits as u32);
            }
            Self::Int(v) => {
                w.write_u8(7);
                w.write_i32(*v);
            }
            Self::Const8(v) => {
                w.write_u8(8);
                w.write_u8(*v);
            }
            Self::Const16(v) => {
                w.write_u8(9);
                w.write_u16(*v);
            }
        }
    }
}

/// One record of a script action sequence.
///
/// Opcodes at 0x80 and above carry a 16-bit length and a payload; below
/// 0x80 the opcode is the entire record. Unknown opcodes decode to `Opaque`
/// and re-encode verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NextFrame,
    Play,
    Stop,
    GotoFrame(u16),
    GetUrl { url: String, target: String },
    Push(Vec<PushValue>),
    Opaque { code: u8, body: Vec<u8> },
}

impl Action {
    pub fn code(&self) -> u8 {
        match self {
            Self::NextFrame => ACTION_NEXT_FRAME,
            Self::Play => ACTION_PLAY,
            Self::Stop => ACTION_STOP,
            Self::GotoFrame(_) => ACTION_GOTO_FRAME,
            Self::GetUrl { .. } => ACTION_GET_URL,
            Self::Push(_) => ACTION_PUSH,
            Self::Opaque { code, .. } => *code,
        }
    }

    fn body_size(&self) -> u32 {
        match self {
            Self::NextFrame | Self::Play | Self::Stop => 0,
            Self::GotoFrame(_) => 2,
            Self::GetUrl { url, target } => url.len() as u32 + 1 + target.len() as u32 + 1,
            Self::Push(values) => values.iter().map(PushValue::byte_size).sum(),
            Self::Opaque { body, .. } => body.len() as u32,
        }
    }

    /// Total encoded size in bytes, including the opcode and, for long-form
    /// opcodes, the length field.
    pub fn byte_size(&self) -> Result<u32> {
        let body = self.body_size();
        if self.code() < 0x80 {
            if body != 0 {
                return Err(Error::InvalidValue {
                    context: "short-form action body length",
                    value: body as i64,
                });
            }
            Ok(1)
        } else {
            Ok(3 + body)
        }
    }

    pub fn encode(&self, w: &mut BitWriter) -> Result<()> {
        self.byte_size()?; // validates short-form bodies are empty
        w.write_u8(self.code());
        if self.code() >= 0x80 {
            w.write_u16(self.body_size() as u16);
        }
        match self {
            Self::NextFrame | Self::Play | Self::Stop => {}
            Self::GotoFrame(frame) => w.write_u16(*frame),
            Self::GetUrl { url, target } => {
                w.write_string(url);
                w.write_string(target);
            }
            Self::Push(values) => {
                for value in values {
                    value.encode(w);
                }
            }
            Self::Opaque { body, .. } => w.write_bytes(body),
        }
        Ok(())
    }
}

// ── Registry strategies ──────────────────────────────────────────────────────
//
// Entered after the opcode and (for long-form opcodes) the length field,
// with a mark pushed at the body start.

fn decode_simple(code: u8, _length: u32, _r: &mut BitReader<'_>, _ctx: &mut Context<'_>) -> Result<Action> {
    Ok(match code {
        ACTION_NEXT_FRAME => Action::NextFrame,
        ACTION_PLAY => Action::Play,
        _ => Action::Stop,
    })
}

fn decode_goto_frame(
    _code: u8,
    _length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Action> {
    Ok(Action::GotoFrame(r.read_u16()?))
}

fn decode_get_url(
    _code: u8,
    _length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Action> {
    Ok(Action::GetUrl {
        url: r.read_string()?,
        target: r.read_string()?,
    })
}

fn decode_push(
    _code: u8,
    length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Action> {
    let mut values = Vec::new();
    while r.bytes_read() < length as usize {
        values.push(PushValue::decode(r)?);
    }
    Ok(Action::Push(values))
}

pub(crate) fn decode_opaque(
    code: u8,
    length: u32,
    r: &mut BitReader<'_>,
    _ctx: &mut Context<'_>,
) -> Result<Action> {
    Ok(Action::Opaque {
        code,
        body: r.read_bytes(length as usize)?.to_vec(),
    })
}

pub(crate) fn default_action_decoders() -> HashMap<u8, ActionDecoder> {
    let mut map: HashMap<u8, ActionDecoder> = HashMap::new();
    map.insert(ACTION_NEXT_FRAME, decode_simple);
    map.insert(ACTION_PLAY, decode_simple);
    map.insert(ACTION_STOP, decode_simple);
    map.insert(ACTION_GOTO_FRAME, decode_goto_frame);
    map.insert(ACTION_GET_URL, decode_get_url);
    map.insert(ACTION_PUSH, decode_push);
    map
}

/// Size of an action sequence including its zero terminator.
pub fn action_list_size(actions: &[Action]) -> Result<u32> {
    let mut size = 1;
    for action in actions {
        size += action.byte_size()?;
    }
    Ok(size)
}

/// Decode actions until the zero terminator.
pub fn decode_action_list(r: &mut BitReader<'_>, ctx: &mut Context<'_>) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    while r.scan_ubits(8)? != 0 {
        actions.push(registry::decode_action(r, ctx)?);
    }
    r.read_u8()?;
    Ok(actions)
}

/// Encode actions followed by the zero terminator.
pub fn encode_action_list(w: &mut BitWriter, actions: &[Action]) -> Result<()> {
    for action in actions {
        action.encode(w)?;
    }
    w.write_u8(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TagRegistry;

    fn round_trip(actions: &[Action]) -> Vec<Action> {
        let mut w = BitWriter::new();
        encode_action_list(&mut w, actions).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len() as u32, action_list_size(actions).unwrap());

        let registry = TagRegistry::default();
        let mut ctx = Context::new(&registry);
        let mut r = BitReader::new(&bytes);
        let decoded = decode_action_list(&mut r, &mut ctx).unwrap();
        assert_eq!(r.position(), bytes.len());
        decoded
    }

    #[test]
    fn control_actions_round_trip() {
        let actions = vec![
            Action::Stop,
            Action::GotoFrame(12),
            Action::Play,
            Action::NextFrame,
        ];
        assert_eq!(round_trip(&actions), actions);
    }

    #[test]
    fn get_url_round_trips() {
        let actions = vec![Action::GetUrl {
            url: "http://example.com/a".into(),
            target: "_blank".into(),
        }];
        assert_eq!(round_trip(&actions), actions);
    }

    #[test]
    fn push_values_round_trip() {
        let actions = vec![Action::Push(vec![
            PushValue::Str("score".into()),
            PushValue::Int(42),
            PushValue::Double(3.25),
            PushValue::Float(-1.5),
            PushValue::Bool(true),
            PushValue::Null,
            PushValue::Undefined,
            PushValue::Register(2),
            PushValue::Const8(7),
            PushValue::Const16(300),
        ])];
        assert_eq!(round_trip(&actions), actions);
    }

    #[test]
    fn unknown_opcode_round_trips_opaquely() {
        // 0x8E (DefineFunction2) is not implemented; its body must survive
        // decode and re-encode byte-for-byte.
        let actions = vec![
            Action::Opaque {
                code: 0x8E,
                body: vec![1, 2, 3, 4, 5],
            },
            Action::Opaque {
                code: 0x17, // Pop, short form
                body: vec![],
            },
        ];
        assert_eq!(round_trip(&actions), actions);
    }

    #[test]
    fn short_form_action_with_body_is_rejected() {
        let action = Action::Opaque {
            code: 0x17,
            body: vec![1],
        };
        assert!(action.byte_size().is_err());
    }
}
