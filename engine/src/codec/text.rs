//! String, character and UUID codecs.

use super::{CodecContext, WireCodec};
use crate::descriptor::ValueKind;
use crate::error::Result;
use crate::wire::WireValue;
use uuid::Uuid;

impl WireCodec for String {
    fn kind() -> ValueKind {
        ValueKind::String
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(WireValue::String(self.clone()))
    }

    /// Strings are taken verbatim; other scalars decode to their JSON text.
    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        match value {
            WireValue::Null => Ok(String::new()),
            WireValue::String(s) => Ok(s.clone()),
            WireValue::Number(n) => Ok(n.to_string()),
            WireValue::Bool(b) => Ok(b.to_string()),
            other => Err(ctx.conversion_error(other, "String")),
        }
    }
}

impl WireCodec for char {
    fn kind() -> ValueKind {
        ValueKind::Char
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(WireValue::String(self.to_string()))
    }

    /// Accepts a one-character string or a numeric code point.
    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        let decoded = match value {
            WireValue::Null => Some('\0'),
            WireValue::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            WireValue::Number(n) => n
                .as_u64()
                .and_then(|code| u32::try_from(code).ok())
                .and_then(char::from_u32),
            _ => None,
        };
        decoded.ok_or_else(|| ctx.conversion_error(value, "char"))
    }
}

impl WireCodec for Uuid {
    fn kind() -> ValueKind {
        ValueKind::Uuid
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(WireValue::String(self.hyphenated().to_string()))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        match value {
            WireValue::Null => Ok(Uuid::nil()),
            WireValue::String(s) => {
                Uuid::parse_str(s.trim()).map_err(|_| ctx.conversion_error(value, "Uuid"))
            }
            other => Err(ctx.conversion_error(other, "Uuid")),
        }
    }
}
