//! Serializer configuration.
//!
//! Settings are handed over by the client configuration layer, usually as
//! JSON, and are fixed for the lifetime of a [`Serializer`](crate::Serializer).

use chrono::FixedOffset;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Options consumed by the serializer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializerSettings {
    /// Lower-case the leading word of member names that carry no explicit
    /// wire name.
    pub camel_case_member_names: bool,
    /// Leave members whose encoded value is null out of serialized objects.
    /// The id and system members are always written.
    pub omit_null_members: bool,
    /// Indent JSON text produced by [`Serializer::to_json_string`](crate::Serializer::to_json_string).
    pub pretty_print: bool,
    /// Zone used to interpret timestamps that carry no zone. `None` means the
    /// local zone of the process.
    #[serde(
        serialize_with = "offset_seconds::serialize",
        deserialize_with = "offset_seconds::deserialize"
    )]
    pub local_offset: Option<FixedOffset>,
}

impl SerializerSettings {
    /// Create settings with every option off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for [`camel_case_member_names`](Self::camel_case_member_names).
    pub fn with_camel_case_member_names(mut self, enabled: bool) -> Self {
        self.camel_case_member_names = enabled;
        self
    }

    /// Builder-style setter for [`omit_null_members`](Self::omit_null_members).
    pub fn with_omit_null_members(mut self, enabled: bool) -> Self {
        self.omit_null_members = enabled;
        self
    }

    /// Builder-style setter for [`pretty_print`](Self::pretty_print).
    pub fn with_pretty_print(mut self, enabled: bool) -> Self {
        self.pretty_print = enabled;
        self
    }

    /// Pin the zone used for zone-less timestamps.
    pub fn with_local_offset(mut self, offset: FixedOffset) -> Self {
        self.local_offset = Some(offset);
        self
    }

    /// The member naming policy these settings select.
    pub fn naming(&self) -> NamingPolicy {
        if self.camel_case_member_names {
            NamingPolicy::CamelCase
        } else {
            NamingPolicy::Verbatim
        }
    }
}

/// How member names without an explicit wire name are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingPolicy {
    /// Use the declared member name unchanged.
    Verbatim,
    /// Lower-case the leading word of the declared name.
    CamelCase,
}

impl NamingPolicy {
    /// Apply the policy to a declared member name.
    pub fn apply(self, name: &str) -> String {
        match self {
            NamingPolicy::Verbatim => name.to_string(),
            NamingPolicy::CamelCase => to_camel_case(name),
        }
    }
}

/// Lower-cases the leading run of upper-case characters.
///
/// When that run is followed by a lower-case character, its last letter
/// starts the next word and stays upper-case: `URLValue` becomes
/// `urlValue`, `ID` becomes `id`, `Text` becomes `text`.
fn to_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.first().map_or(true, |c| !c.is_uppercase()) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    for (i, c) in chars.iter().enumerate() {
        if !c.is_uppercase() {
            out.extend(&chars[i..]);
            return out;
        }
        let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
        if i > 0 && next_is_lower {
            out.extend(&chars[i..]);
            return out;
        }
        out.extend(c.to_lowercase());
    }
    out
}

mod offset_seconds {
    use super::*;

    pub fn serialize<S: Serializer>(
        offset: &Option<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        offset
            .map(|o| o.local_minus_utc())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<FixedOffset>, D::Error> {
        let seconds = Option::<i32>::deserialize(deserializer)?;
        match seconds {
            None => Ok(None),
            Some(s) => FixedOffset::east_opt(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid utc offset: {s}"))),
        }
    }
}
