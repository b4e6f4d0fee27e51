//! Value codecs.
//!
//! Every member value crosses the wire through a [`WireCodec`]: a
//! per-kind pair of functions that encode a Rust value into a wire value
//! and decode (coerce) a wire value back. Encoding is strict, decoding is
//! permissive; see the kind modules for the exact rules.
//!
//! Containers compose: `Option<T>` maps `None` to null, `Vec<T>` to an
//! array and string-keyed maps to objects, each delegating to the element
//! codec with an extended [`WirePath`] so errors point at the offending
//! element.

mod enums;
mod numeric;
mod temporal;
mod text;
mod uri;

pub use enums::{decode_enum, encode_enum, WireEnum};
pub use numeric::MAX_SAFE_INTEGER;
pub use temporal::format_timestamp;
pub use uri::UriRef;

use crate::descriptor::ValueKind;
use crate::error::{Error, Result};
use crate::settings::SerializerSettings;
use crate::wire::{describe, WireObject, WirePath, WireValue};
use crate::{Entity, Serializer};
use std::collections::{BTreeMap, HashMap};

/// State threaded through a single encode or decode call.
#[derive(Clone, Copy)]
pub struct CodecContext<'a> {
    serializer: &'a Serializer,
    path: WirePath<'a>,
}

impl<'a> CodecContext<'a> {
    pub(crate) fn new(serializer: &'a Serializer, path: WirePath<'a>) -> Self {
        Self { serializer, path }
    }

    /// The serializer driving this call.
    pub fn serializer(&self) -> &'a Serializer {
        self.serializer
    }

    /// Settings of the serializer driving this call.
    pub fn settings(&self) -> &'a SerializerSettings {
        self.serializer.settings()
    }

    /// Location of the value being converted.
    pub fn path(&self) -> &WirePath<'a> {
        &self.path
    }

    /// Context for a named field below the current value.
    pub fn field<'b>(&'b self, name: &'b str) -> CodecContext<'b> {
        CodecContext {
            serializer: self.serializer,
            path: self.path.field(name),
        }
    }

    /// Context for an array element below the current value.
    pub fn index<'b>(&'b self, index: usize) -> CodecContext<'b> {
        CodecContext {
            serializer: self.serializer,
            path: self.path.index(index),
        }
    }

    /// A conversion failure for `value` at the current path.
    pub fn conversion_error(&self, value: &WireValue, target: &str) -> Error {
        Error::TypeConversion {
            value: describe(value),
            target: target.to_string(),
            path: self.path.to_string(),
        }
    }

    /// A range failure for the literal `value` at the current path.
    pub fn range_error(&self, value: impl ToString) -> Error {
        Error::ValueRange {
            value: value.to_string(),
            member: self.path.to_string(),
        }
    }
}

/// Encoding and decoding of one kind of member value.
pub trait WireCodec: Sized + Send + Sync + 'static {
    /// Kind reported in member descriptors.
    fn kind() -> ValueKind;

    /// Whether the value can be null.
    fn nullable() -> bool {
        false
    }

    /// Encode the value into a wire value.
    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue>;

    /// Decode a wire value, coercing compatible shapes.
    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self>;
}

/// A member-specific codec that replaces kind-based codec selection.
pub trait Converter<V>: Send + Sync {
    /// Encode the raw member value.
    fn encode(&self, value: &V, ctx: &CodecContext<'_>) -> Result<WireValue>;

    /// Decode a wire value into the value to assign.
    fn decode(&self, value: &WireValue, ctx: &CodecContext<'_>) -> Result<V>;
}

impl<V: WireCodec> WireCodec for Option<V> {
    fn kind() -> ValueKind {
        V::kind()
    }

    fn nullable() -> bool {
        true
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        match self {
            Some(value) => value.encode(ctx),
            None => Ok(WireValue::Null),
        }
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        match value {
            WireValue::Null => Ok(None),
            other => V::decode(other, ctx).map(Some),
        }
    }
}

impl<V: WireCodec> WireCodec for Vec<V> {
    fn kind() -> ValueKind {
        ValueKind::Array
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        let items = self
            .iter()
            .enumerate()
            .map(|(i, item)| item.encode(&ctx.index(i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(WireValue::Array(items))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        match value {
            WireValue::Null => Ok(Vec::new()),
            WireValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| V::decode(item, &ctx.index(i)))
                .collect(),
            other => Err(ctx.conversion_error(other, "Array")),
        }
    }
}

fn encode_entries<'v, V: WireCodec>(
    entries: impl Iterator<Item = (&'v String, &'v V)>,
    ctx: &CodecContext<'_>,
) -> Result<WireValue> {
    let mut object = WireObject::new();
    for (key, value) in entries {
        let encoded = value.encode(&ctx.field(key))?;
        object.insert(key.clone(), encoded);
    }
    Ok(WireValue::Object(object))
}

fn decode_entries<V: WireCodec, M: FromIterator<(String, V)> + Default>(
    value: &WireValue,
    ctx: &CodecContext<'_>,
) -> Result<M> {
    match value {
        WireValue::Null => Ok(M::default()),
        WireValue::Object(object) => object
            .iter()
            .map(|(key, item)| -> Result<(String, V)> {
                Ok((key.clone(), V::decode(item, &ctx.field(key))?))
            })
            .collect(),
        other => Err(ctx.conversion_error(other, "Map")),
    }
}

impl<V: WireCodec> WireCodec for BTreeMap<String, V> {
    fn kind() -> ValueKind {
        ValueKind::Map
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        encode_entries(self.iter(), ctx)
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        decode_entries(value, ctx)
    }
}

impl<V: WireCodec> WireCodec for HashMap<String, V> {
    fn kind() -> ValueKind {
        ValueKind::Map
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        // Sorted keys keep the output deterministic.
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        encode_entries(entries.into_iter(), ctx)
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        decode_entries(value, ctx)
    }
}

impl WireCodec for WireValue {
    fn kind() -> ValueKind {
        ValueKind::Any
    }

    fn nullable() -> bool {
        true
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(self.clone())
    }

    fn decode(value: &WireValue, _ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(value.clone())
    }
}

/// Encode a nested entity with its own contract. Used by [`impl_entity_codec!`].
#[doc(hidden)]
pub fn encode_entity<T: Entity>(value: &T, ctx: &CodecContext<'_>) -> Result<WireValue> {
    let serializer = ctx.serializer();
    let descriptor = serializer.descriptor::<T>()?;
    serializer.write_object(&descriptor, value, ctx)
}

/// Decode a nested entity with its own contract. Used by [`impl_entity_codec!`].
#[doc(hidden)]
pub fn decode_entity<T: Entity>(value: &WireValue, ctx: &CodecContext<'_>) -> Result<T> {
    let mut instance = T::default();
    if value.is_null() {
        return Ok(instance);
    }
    let serializer = ctx.serializer();
    let descriptor = serializer.descriptor::<T>()?;
    serializer.read_object(&descriptor, value, &mut instance, ctx)?;
    Ok(instance)
}

/// Use one or more [`Entity`] types as nested member values.
///
/// Nested values are encoded as wire objects with their own contract; they
/// do not need an id member.
#[macro_export]
macro_rules! impl_entity_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::codec::WireCodec for $ty {
                fn kind() -> $crate::ValueKind {
                    $crate::ValueKind::Object
                }

                fn encode(
                    &self,
                    ctx: &$crate::codec::CodecContext<'_>,
                ) -> $crate::Result<$crate::WireValue> {
                    $crate::codec::encode_entity(self, ctx)
                }

                fn decode(
                    value: &$crate::WireValue,
                    ctx: &$crate::codec::CodecContext<'_>,
                ) -> $crate::Result<Self> {
                    $crate::codec::decode_entity(value, ctx)
                }
            }
        )+
    };
}

/// Use one or more [`WireEnum`] types as member values.
#[macro_export]
macro_rules! impl_enum_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::codec::WireCodec for $ty {
                fn kind() -> $crate::ValueKind {
                    $crate::ValueKind::Enum
                }

                fn encode(
                    &self,
                    ctx: &$crate::codec::CodecContext<'_>,
                ) -> $crate::Result<$crate::WireValue> {
                    $crate::codec::encode_enum(self, ctx)
                }

                fn decode(
                    value: &$crate::WireValue,
                    ctx: &$crate::codec::CodecContext<'_>,
                ) -> $crate::Result<Self> {
                    $crate::codec::decode_enum(value, ctx)
                }
            }
        )+
    };
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::SerializerSettings;

    /// Encode a single value at a member named `Value`.
    pub fn encode<V: WireCodec>(value: &V) -> Result<WireValue> {
        encode_with(value, SerializerSettings::default())
    }

    pub fn encode_with<V: WireCodec>(value: &V, settings: SerializerSettings) -> Result<WireValue> {
        let serializer = Serializer::new(settings);
        let root = WirePath::root();
        let ctx = CodecContext::new(&serializer, root.field("Value"));
        value.encode(&ctx)
    }

    /// Decode a single value at a member named `Value`.
    pub fn decode<V: WireCodec>(value: WireValue) -> Result<V> {
        decode_with(value, SerializerSettings::default())
    }

    pub fn decode_with<V: WireCodec>(value: WireValue, settings: SerializerSettings) -> Result<V> {
        let serializer = Serializer::new(settings);
        let root = WirePath::root();
        let ctx = CodecContext::new(&serializer, root.field("Value"));
        V::decode(&value, &ctx)
    }
}
