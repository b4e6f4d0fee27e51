//! Enum codec.
//!
//! Enums travel by symbolic name. Flag enums whose value is a combination
//! of named flags travel as the names joined by `", "`. A value with no
//! symbolic form falls back to the raw number, and decoding accepts raw
//! numbers that name nothing.

use super::CodecContext;
use crate::error::Result;
use crate::wire::WireValue;

/// An enum that can cross the wire.
///
/// `from_raw` must accept any value, including ones with no entry in
/// [`MEMBERS`](Self::MEMBERS); enums usually keep those in a catch-all
/// variant or are newtypes over the raw integer.
pub trait WireEnum: Sized + Send + Sync + 'static {
    /// Symbolic names and their values, in declaration order.
    const MEMBERS: &'static [(&'static str, i64)];

    /// Whether values combine as bit flags.
    const FLAGS: bool = false;

    /// The numeric value.
    fn to_raw(&self) -> i64;

    /// Build a value from its numeric form.
    fn from_raw(raw: i64) -> Self;
}

fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}

fn symbolic_name<E: WireEnum>(raw: i64) -> Option<String> {
    if let Some((name, _)) = E::MEMBERS.iter().find(|(_, v)| *v == raw) {
        return Some((*name).to_string());
    }
    if !E::FLAGS || raw == 0 {
        return None;
    }

    // Claim flags from the largest value down, then list them ascending.
    let mut flags: Vec<&(&str, i64)> = E::MEMBERS.iter().filter(|(_, v)| *v != 0).collect();
    flags.sort_by(|a, b| b.1.cmp(&a.1));

    let mut remaining = raw;
    let mut taken = Vec::new();
    for flag in flags {
        if remaining & flag.1 == flag.1 {
            remaining &= !flag.1;
            taken.push(flag);
        }
    }
    if remaining != 0 {
        return None;
    }

    taken.sort_by_key(|flag| flag.1);
    Some(
        taken
            .iter()
            .map(|flag| flag.0)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn value_of<E: WireEnum>(name: &str) -> Option<i64> {
    E::MEMBERS
        .iter()
        .find(|(member, _)| *member == name)
        .map(|(_, value)| *value)
}

/// Encode an enum value by name, or as its raw number.
pub fn encode_enum<E: WireEnum>(value: &E, _ctx: &CodecContext<'_>) -> Result<WireValue> {
    let raw = value.to_raw();
    Ok(match symbolic_name::<E>(raw) {
        Some(name) => WireValue::String(name),
        None => WireValue::from(raw),
    })
}

/// Decode an enum from a (case-sensitive) name, a flag list, or a number.
pub fn decode_enum<E: WireEnum>(value: &WireValue, ctx: &CodecContext<'_>) -> Result<E> {
    let raw = match value {
        WireValue::Null => Some(0),
        WireValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.2e18)
                .map(|f| f as i64)
        }),
        WireValue::String(s) => {
            let s = s.trim();
            if let Ok(number) = s.parse::<i64>() {
                Some(number)
            } else if E::FLAGS {
                s.split(',')
                    .map(|part| value_of::<E>(part.trim()))
                    .try_fold(0i64, |acc, flag| flag.map(|f| acc | f))
            } else {
                value_of::<E>(s)
            }
        }
        WireValue::Bool(_) | WireValue::Array(_) | WireValue::Object(_) => None,
    };
    raw.map(E::from_raw)
        .ok_or_else(|| ctx.conversion_error(value, short_type_name::<E>()))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{decode, encode};
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum Color {
        #[default]
        Red,
        Green,
        Blue,
        Other(i64),
    }

    impl WireEnum for Color {
        const MEMBERS: &'static [(&'static str, i64)] = &[("Red", 0), ("Green", 1), ("Blue", 2)];

        fn to_raw(&self) -> i64 {
            match self {
                Color::Red => 0,
                Color::Green => 1,
                Color::Blue => 2,
                Color::Other(raw) => *raw,
            }
        }

        fn from_raw(raw: i64) -> Self {
            match raw {
                0 => Color::Red,
                1 => Color::Green,
                2 => Color::Blue,
                other => Color::Other(other),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Access(i64);

    impl Access {
        const NONE: Access = Access(0);
        const READ: Access = Access(1);
        const WRITE: Access = Access(2);
        const DELETE: Access = Access(4);
    }

    impl WireEnum for Access {
        const MEMBERS: &'static [(&'static str, i64)] = &[
            ("None", 0),
            ("Read", 1),
            ("Write", 2),
            ("Delete", 4),
            ("ReadWrite", 3),
        ];
        const FLAGS: bool = true;

        fn to_raw(&self) -> i64 {
            self.0
        }

        fn from_raw(raw: i64) -> Self {
            Access(raw)
        }
    }

    crate::impl_enum_codec!(Color, Access);

    #[test]
    fn encodes_symbolic_name() {
        assert_eq!(encode(&Color::Green).unwrap(), json!("Green"));
        assert_eq!(encode(&Color::Red).unwrap(), json!("Red"));
    }

    #[test]
    fn unnamed_values_fall_back_to_numbers() {
        assert_eq!(encode(&Color::Other(7)).unwrap(), json!(7));
        assert_eq!(encode(&Color::Other(-3)).unwrap(), json!(-3));
        assert_eq!(encode(&Access(8)).unwrap(), json!(8));
        assert_eq!(encode(&Access(9)).unwrap(), json!(9));
    }

    #[test]
    fn flag_combinations() {
        assert_eq!(encode(&Access(Access::READ.0 | Access::DELETE.0)).unwrap(), json!("Read, Delete"));
        // An exact named combination wins over its parts.
        assert_eq!(encode(&Access(3)).unwrap(), json!("ReadWrite"));
        assert_eq!(encode(&Access(7)).unwrap(), json!("ReadWrite, Delete"));
        assert_eq!(encode(&Access::NONE).unwrap(), json!("None"));
        assert_eq!(encode(&Access::WRITE).unwrap(), json!("Write"));
    }

    #[test]
    fn decodes_names_and_numbers() {
        assert_eq!(decode::<Color>(json!("Blue")).unwrap(), Color::Blue);
        assert_eq!(decode::<Color>(json!(1)).unwrap(), Color::Green);
        assert_eq!(decode::<Color>(json!(42)).unwrap(), Color::Other(42));
        assert_eq!(decode::<Color>(json!("-5")).unwrap(), Color::Other(-5));
        assert_eq!(decode::<Color>(json!(null)).unwrap(), Color::Red);
        assert_eq!(decode::<Color>(json!(2.0)).unwrap(), Color::Blue);
    }

    #[test]
    fn names_are_case_sensitive() {
        let err = decode::<Color>(json!("blue")).unwrap_err();
        assert_eq!(
            err,
            Error::TypeConversion {
                value: "\"blue\"".into(),
                target: "Color".into(),
                path: "Value".into(),
            }
        );
        assert!(decode::<Color>(json!(true)).is_err());
    }

    #[test]
    fn decodes_flag_lists() {
        assert_eq!(decode::<Access>(json!("Read, Delete")).unwrap(), Access(5));
        assert_eq!(decode::<Access>(json!("Write,Delete")).unwrap(), Access(6));
        assert_eq!(decode::<Access>(json!(12)).unwrap(), Access(12));
        assert!(decode::<Access>(json!("Read, Execute")).is_err());
    }

    #[test]
    fn flag_round_trip() {
        for raw in 0..16 {
            let wire = encode(&Access(raw)).unwrap();
            assert_eq!(decode::<Access>(wire).unwrap(), Access(raw));
        }
    }
}
