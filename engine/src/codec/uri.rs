//! URI codec.

use super::{CodecContext, WireCodec};
use crate::descriptor::ValueKind;
use crate::error::Result;
use crate::wire::WireValue;
use std::fmt;
use url::Url;

/// An absolute URI or a relative reference.
///
/// Absolute URIs are normalized on parse (lower-case scheme and host, a
/// trailing slash for a bare authority). Relative references are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriRef {
    Absolute(Url),
    Relative(String),
}

impl UriRef {
    /// Classify a string as an absolute URI or a relative reference.
    pub fn parse(text: &str) -> Self {
        match Url::parse(text) {
            Ok(url) => UriRef::Absolute(url),
            Err(_) => UriRef::Relative(text.to_string()),
        }
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            UriRef::Absolute(url) => url.as_str(),
            UriRef::Relative(text) => text,
        }
    }

    /// Whether this is an absolute URI.
    pub fn is_absolute(&self) -> bool {
        matches!(self, UriRef::Absolute(_))
    }
}

impl Default for UriRef {
    fn default() -> Self {
        UriRef::Relative(String::new())
    }
}

impl fmt::Display for UriRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Url> for UriRef {
    fn from(url: Url) -> Self {
        UriRef::Absolute(url)
    }
}

impl WireCodec for UriRef {
    fn kind() -> ValueKind {
        ValueKind::Uri
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(WireValue::String(self.as_str().to_string()))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        match value {
            WireValue::Null => Ok(UriRef::default()),
            WireValue::String(s) => Ok(UriRef::parse(s)),
            other => Err(ctx.conversion_error(other, "Uri")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{decode, encode};
    use super::*;
    use serde_json::json;

    #[test]
    fn absolute_uris_are_normalized() {
        let uri = UriRef::parse("HTTP://Example.COM");
        assert!(uri.is_absolute());
        assert_eq!(encode(&uri).unwrap(), json!("http://example.com/"));

        let uri = UriRef::parse("https://example.com/a/b?q=1#frag");
        assert_eq!(encode(&uri).unwrap(), json!("https://example.com/a/b?q=1#frag"));
    }

    #[test]
    fn relative_references_are_verbatim() {
        for text in ["/api/items", "items?id=5", "../up", ""] {
            let uri = UriRef::parse(text);
            assert!(!uri.is_absolute(), "{text}");
            assert_eq!(encode(&uri).unwrap(), json!(text));
        }
    }

    #[test]
    fn decode_is_lenient() {
        let decoded: UriRef = decode(json!("http://Example.com")).unwrap();
        assert_eq!(decoded.as_str(), "http://example.com/");

        let decoded: UriRef = decode(json!("relative/path")).unwrap();
        assert_eq!(decoded, UriRef::Relative("relative/path".into()));

        assert_eq!(decode::<Option<UriRef>>(json!(null)).unwrap(), None);
        assert!(decode::<UriRef>(json!(42)).is_err());
        assert!(decode::<UriRef>(json!(true)).is_err());
        assert!(decode::<UriRef>(json!(["x"])).is_err());
    }
}
