//! Numeric codecs: integers of every width, floating point, decimal and bool.
//!
//! Wire numbers are assumed to be IEEE doubles. Integer kinds up to 32 bits
//! always fit; 64-bit integers and decimals are rejected at encode time when
//! a double cannot hold them exactly. Decoding never re-checks that range:
//! it accepts booleans, numbers and numeric strings and only enforces the
//! width of the target type.

use super::{CodecContext, WireCodec};
use crate::descriptor::ValueKind;
use crate::error::Result;
use crate::wire::WireValue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest magnitude a double represents exactly as an integer (2^53).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

/// Significant digits a decimal may carry and still survive a double.
const MAX_DECIMAL_DIGITS: usize = 15;

/// Largest magnitude accepted before converting a float to `i128`.
const I128_FLOAT_LIMIT: f64 = 1.0e38;

fn integer_from_float(value: f64) -> Option<i128> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round_ties_even();
    if rounded.abs() >= I128_FLOAT_LIMIT {
        return None;
    }
    Some(rounded as i128)
}

/// Coerce any scalar wire value to an integer, before the width check.
fn coerce_integer(value: &WireValue, ctx: &CodecContext<'_>, target: &str) -> Result<i128> {
    let coerced = match value {
        WireValue::Null => Some(0),
        WireValue::Bool(b) => Some(i128::from(*b)),
        WireValue::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().and_then(integer_from_float)),
        WireValue::String(s) => {
            let s = s.trim();
            s.parse::<i128>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integer_from_float))
        }
        WireValue::Array(_) | WireValue::Object(_) => None,
    };
    coerced.ok_or_else(|| ctx.conversion_error(value, target))
}

/// Coerce any scalar wire value to a double.
fn coerce_float(value: &WireValue, ctx: &CodecContext<'_>, target: &str) -> Result<f64> {
    let coerced = match value {
        WireValue::Null => Some(0.0),
        WireValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        WireValue::Number(n) => n.as_f64(),
        WireValue::String(s) => s.trim().parse::<f64>().ok(),
        WireValue::Array(_) | WireValue::Object(_) => None,
    };
    coerced.ok_or_else(|| ctx.conversion_error(value, target))
}

fn encode_float(value: f64) -> WireValue {
    match serde_json::Number::from_f64(value) {
        Some(n) => WireValue::Number(n),
        None if value.is_nan() => WireValue::String("NaN".into()),
        None if value > 0.0 => WireValue::String("Infinity".into()),
        None => WireValue::String("-Infinity".into()),
    }
}

macro_rules! small_integer_codec {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl WireCodec for $ty {
                fn kind() -> ValueKind {
                    ValueKind::$kind
                }

                fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
                    Ok(WireValue::from(*self))
                }

                fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
                    let wide = coerce_integer(value, ctx, stringify!($ty))?;
                    <$ty>::try_from(wide).map_err(|_| ctx.conversion_error(value, stringify!($ty)))
                }
            }
        )+
    };
}

small_integer_codec! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    u8 => U8,
    u16 => U16,
    u32 => U32,
}

impl WireCodec for i64 {
    fn kind() -> ValueKind {
        ValueKind::I64
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        if self.unsigned_abs() > MAX_SAFE_INTEGER as u64 {
            return Err(ctx.range_error(self));
        }
        Ok(WireValue::from(*self))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        let wide = coerce_integer(value, ctx, "i64")?;
        i64::try_from(wide).map_err(|_| ctx.conversion_error(value, "i64"))
    }
}

impl WireCodec for u64 {
    fn kind() -> ValueKind {
        ValueKind::U64
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        if *self > MAX_SAFE_INTEGER as u64 {
            return Err(ctx.range_error(self));
        }
        Ok(WireValue::from(*self))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        let wide = coerce_integer(value, ctx, "u64")?;
        u64::try_from(wide).map_err(|_| ctx.conversion_error(value, "u64"))
    }
}

impl WireCodec for f64 {
    fn kind() -> ValueKind {
        ValueKind::F64
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(encode_float(*self))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        coerce_float(value, ctx, "f64")
    }
}

impl WireCodec for f32 {
    fn kind() -> ValueKind {
        ValueKind::F32
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        // Go through the shortest f32 text so 0.1f32 is written as 0.1.
        let widened = self.to_string().parse::<f64>().unwrap_or(f64::from(*self));
        Ok(encode_float(widened))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        let wide = coerce_float(value, ctx, "f32")?;
        let narrowed = wide as f32;
        if wide.is_finite() && narrowed.is_infinite() {
            return Err(ctx.conversion_error(value, "f32"));
        }
        Ok(narrowed)
    }
}

/// Number of significant digits of a normalized decimal.
fn significant_digits(value: &Decimal) -> usize {
    let mantissa = value.mantissa().unsigned_abs();
    if mantissa == 0 {
        return 1;
    }
    mantissa.to_string().trim_end_matches('0').len()
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

impl WireCodec for Decimal {
    fn kind() -> ValueKind {
        ValueKind::Decimal
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        let normalized = self.normalize();
        if normalized.abs() > Decimal::from(MAX_SAFE_INTEGER) {
            return Err(ctx.range_error(self));
        }

        if normalized.scale() == 0 {
            // Integral values within 2^53 are exact in a double.
            return normalized
                .to_i64()
                .map(WireValue::from)
                .ok_or_else(|| ctx.range_error(self));
        }

        if significant_digits(&normalized) > MAX_DECIMAL_DIGITS {
            return Err(ctx.range_error(self));
        }
        // Parsing the text rounds correctly; `to_f64` drifts for tiny values.
        normalized
            .to_string()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(WireValue::Number)
            .ok_or_else(|| ctx.range_error(self))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        let decoded = match value {
            WireValue::Null => Some(Decimal::ZERO),
            WireValue::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            WireValue::Number(n) => n
                .as_i64()
                .map(Decimal::from)
                .or_else(|| n.as_u64().map(Decimal::from))
                .or_else(|| parse_decimal(&n.to_string())),
            WireValue::String(s) => parse_decimal(s),
            WireValue::Array(_) | WireValue::Object(_) => None,
        };
        decoded.ok_or_else(|| ctx.conversion_error(value, "Decimal"))
    }
}

impl WireCodec for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(WireValue::Bool(*self))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        match value {
            WireValue::Null => Ok(false),
            WireValue::Bool(b) => Ok(*b),
            WireValue::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            WireValue::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            WireValue::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            other => Err(ctx.conversion_error(other, "bool")),
        }
    }
}
