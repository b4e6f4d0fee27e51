//! The wire value tree and helpers for addressing into it.
//!
//! The wire value is `serde_json::Value` built with `preserve_order`, so
//! objects keep insertion order. Everything the engine produces or consumes
//! is one of its six shapes: null, bool, number, string, array, object.

use crate::error::Result;
use std::fmt;

/// The generic value tree exchanged with the table service.
pub type WireValue = serde_json::Value;

/// Ordered string-keyed map used for wire objects.
pub type WireObject = serde_json::Map<String, WireValue>;

/// Human readable name of a wire value's shape.
pub fn kind_name(value: &WireValue) -> &'static str {
    match value {
        WireValue::Null => "Null",
        WireValue::Bool(_) => "Bool",
        WireValue::Number(n) if n.is_i64() || n.is_u64() => "Integer",
        WireValue::Number(_) => "Float",
        WireValue::String(_) => "String",
        WireValue::Array(_) => "Array",
        WireValue::Object(_) => "Object",
    }
}

/// Renders a wire value the way it appears in error messages.
///
/// Scalars print as JSON literals; containers print as their shape name so
/// a large payload never ends up inside an error string.
pub fn describe(value: &WireValue) -> String {
    match value {
        WireValue::Array(_) | WireValue::Object(_) => kind_name(value).to_string(),
        scalar => scalar.to_string(),
    }
}

/// Serializes a wire value to JSON text.
pub fn to_json_string(value: &WireValue, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Parses JSON text into a wire value.
pub fn parse_json(text: &str) -> Result<WireValue> {
    Ok(serde_json::from_str(text)?)
}

/// One step of a [`WirePath`].
#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Root,
    Field(&'a str),
    Index(usize),
}

/// Location of a value inside a wire tree, e.g. `items[2].name`.
///
/// Paths are built as a borrowed chain while walking the tree and are only
/// rendered to a string when an error is reported.
#[derive(Debug, Clone, Copy)]
pub struct WirePath<'a> {
    parent: Option<&'a WirePath<'a>>,
    segment: Segment<'a>,
}

impl<'a> WirePath<'a> {
    /// The empty path addressing the root value.
    pub const fn root() -> Self {
        Self {
            parent: None,
            segment: Segment::Root,
        }
    }

    /// Path of a named field below this one.
    pub fn field<'b>(&'b self, name: &'b str) -> WirePath<'b> {
        WirePath {
            parent: Some(self),
            segment: Segment::Field(name),
        }
    }

    /// Path of an array element below this one.
    pub fn index<'b>(&'b self, index: usize) -> WirePath<'b> {
        WirePath {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }

    /// The last field name on this path, if any.
    pub fn last_field(&self) -> Option<&'a str> {
        match self.segment {
            Segment::Field(name) => Some(name),
            Segment::Index(_) => self.parent.and_then(|p| p.last_field()),
            Segment::Root => None,
        }
    }

    fn write_into(&self, out: &mut String) {
        if let Some(parent) = self.parent {
            parent.write_into(out);
        }
        match self.segment {
            Segment::Root => {}
            Segment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
}

impl fmt::Display for WirePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_into(&mut out);
        f.write_str(&out)
    }
}
