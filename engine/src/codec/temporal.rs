//! Date/time codecs.
//!
//! Every temporal value is normalized to UTC and written as
//! `YYYY-MM-DDTHH:mm:ss.sssZ`. Values with no zone (`NaiveDateTime`) are
//! read in the local zone first: the configured
//! [`local_offset`](crate::SerializerSettings::local_offset) or, when unset,
//! the zone of the process.

use super::{CodecContext, WireCodec};
use crate::descriptor::ValueKind;
use crate::error::{Error, Result};
use crate::wire::{describe, WireValue};
use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Zone-less layouts accepted on decode; they are read as UTC.
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Format an instant the way it is written on the wire.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(WIRE_FORMAT).to_string()
}

/// Parse the wire form and common ISO 8601 variants.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed);
    }
    let utc = FixedOffset::east_opt(0)?;
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| utc.from_utc_datetime(&naive))
}

fn encode_instant(instant: DateTime<Utc>) -> WireValue {
    WireValue::String(format_timestamp(&instant))
}

/// Decode a wire value into an instant. `None` means null.
fn decode_instant(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Option<DateTime<FixedOffset>>> {
    match value {
        WireValue::Null => Ok(None),
        WireValue::String(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| Error::InvalidDateTime {
                value: describe(value),
                path: ctx.path().to_string(),
            }),
        other => Err(ctx.conversion_error(other, "DateTime")),
    }
}

/// Interpret a zone-less timestamp in the local zone.
fn resolve_local(naive: &NaiveDateTime, ctx: &CodecContext<'_>) -> Result<DateTime<Utc>> {
    let resolved = match ctx.settings().local_offset {
        Some(offset) => offset.from_local_datetime(naive).map(|dt| dt.to_utc()),
        None => chrono::Local
            .from_local_datetime(naive)
            .map(|dt| dt.to_utc()),
    };
    match resolved {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(Error::NonexistentLocalTime {
            value: naive.to_string(),
            path: ctx.path().to_string(),
        }),
    }
}

/// Express an instant as a zone-less timestamp in the local zone.
fn to_local_naive(instant: DateTime<FixedOffset>, ctx: &CodecContext<'_>) -> NaiveDateTime {
    match ctx.settings().local_offset {
        Some(offset) => instant.with_timezone(&offset).naive_local(),
        None => instant.with_timezone(&chrono::Local).naive_local(),
    }
}

impl WireCodec for DateTime<Utc> {
    fn kind() -> ValueKind {
        ValueKind::DateTime
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(encode_instant(*self))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(decode_instant(value, ctx)?
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default())
    }
}

impl WireCodec for DateTime<FixedOffset> {
    fn kind() -> ValueKind {
        ValueKind::DateTime
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(encode_instant(self.to_utc()))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(decode_instant(value, ctx)?
            .map(|dt| dt.with_timezone(&Utc).fixed_offset())
            .unwrap_or_default())
    }
}

impl WireCodec for DateTime<chrono::Local> {
    fn kind() -> ValueKind {
        ValueKind::DateTime
    }

    fn encode(&self, _ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(encode_instant(self.to_utc()))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(decode_instant(value, ctx)?
            .map(|dt| dt.with_timezone(&chrono::Local))
            .unwrap_or_default())
    }
}

impl WireCodec for NaiveDateTime {
    fn kind() -> ValueKind {
        ValueKind::DateTime
    }

    fn encode(&self, ctx: &CodecContext<'_>) -> Result<WireValue> {
        Ok(encode_instant(resolve_local(self, ctx)?))
    }

    fn decode(value: &WireValue, ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(decode_instant(value, ctx)?
            .map(|dt| to_local_naive(dt, ctx))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{decode, decode_with, encode, encode_with};
    use super::*;
    use crate::SerializerSettings;
    use proptest::prelude::*;
    use serde_json::json;

    fn pacific() -> SerializerSettings {
        SerializerSettings::default().with_local_offset(FixedOffset::west_opt(8 * 3600).unwrap())
    }

    fn naive(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").unwrap()
    }

    #[test]
    fn utc_wire_format() {
        let instant = Utc.with_ymd_and_hms(2005, 3, 14, 12, 34, 16).unwrap();
        assert_eq!(encode(&instant).unwrap(), json!("2005-03-14T12:34:16.000Z"));

        let with_millis = naive("2005-03-14T12:34:16.789").and_utc();
        assert_eq!(encode(&with_millis).unwrap(), json!("2005-03-14T12:34:16.789Z"));
    }

    #[test]
    fn offset_values_normalize_to_utc() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let instant = offset.with_ymd_and_hms(2005, 3, 14, 12, 34, 16).unwrap();
        assert_eq!(encode(&instant).unwrap(), json!("2005-03-14T04:34:16.000Z"));
    }

    #[test]
    fn offset_values_decode_as_utc() {
        let back: DateTime<FixedOffset> = decode(json!("2005-03-14T12:34:16+08:00")).unwrap();
        assert_eq!(back.offset().local_minus_utc(), 0);
        assert_eq!(back, Utc.with_ymd_and_hms(2005, 3, 14, 4, 34, 16).unwrap());
    }

    #[test]
    fn zoneless_values_are_read_as_local() {
        // Local zone eight hours behind UTC.
        let value = naive("2005-03-14T12:34:16");
        let wire = encode_with(&value, pacific()).unwrap();
        assert_eq!(wire, json!("2005-03-14T20:34:16.000Z"));

        let back: NaiveDateTime = decode_with(wire, pacific()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn local_values_round_trip() {
        let instant = Utc.with_ymd_and_hms(2020, 6, 1, 8, 0, 0).unwrap();
        let local = instant.with_timezone(&chrono::Local);
        let wire = encode(&local).unwrap();
        assert_eq!(wire, json!("2020-06-01T08:00:00.000Z"));
        let back: DateTime<chrono::Local> = decode(wire).unwrap();
        assert_eq!(back, local);
    }

    #[test]
    fn decode_variants() {
        let expected = Utc.with_ymd_and_hms(2005, 3, 14, 20, 34, 16).unwrap();
        for text in [
            "2005-03-14T20:34:16.000Z",
            "2005-03-14T20:34:16Z",
            "2005-03-14T20:34:16+00:00",
            "2005-03-14T12:34:16-08:00",
            "2005-03-14T12:34:16.000-0800",
            "2005-03-14T20:34:16",
            "2005-03-14 20:34:16",
        ] {
            let decoded: DateTime<Utc> = decode(json!(text)).unwrap();
            assert_eq!(decoded, expected, "{text}");
        }

        let date_only: DateTime<Utc> = decode(json!("2005-03-14")).unwrap();
        assert_eq!(date_only, Utc.with_ymd_and_hms(2005, 3, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn decode_keeps_parsed_offset() {
        let decoded: DateTime<FixedOffset> = decode(json!("2005-03-14T12:34:16+08:00")).unwrap();
        assert_eq!(decoded.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(
            encode(&decoded).unwrap(),
            json!("2005-03-14T04:34:16.000Z")
        );
    }

    #[test]
    fn decode_errors() {
        let err = decode::<DateTime<Utc>>(json!(true)).unwrap_err();
        assert!(matches!(err, Error::TypeConversion { target, .. } if target == "DateTime"));

        let err = decode::<DateTime<Utc>>(json!(1234)).unwrap_err();
        assert!(matches!(err, Error::TypeConversion { .. }));

        let err = decode::<DateTime<Utc>>(json!("yesterday")).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidDateTime {
                value: "\"yesterday\"".into(),
                path: "Value".into(),
            }
        );
        assert!(err.to_string().contains("not a recognized date/time"));
    }

    #[test]
    fn null_decodes_to_default() {
        let decoded: DateTime<Utc> = decode(json!(null)).unwrap();
        assert_eq!(decoded, DateTime::<Utc>::default());
        assert_eq!(decode::<Option<DateTime<Utc>>>(json!(null)).unwrap(), None);
    }

    proptest! {
        #[test]
        fn prop_utc_round_trip(millis in -62_135_596_800_000i64..253_402_300_799_000) {
            let instant = DateTime::<Utc>::from_timestamp_millis(millis).unwrap();
            let wire = encode(&instant).unwrap();
            prop_assert_eq!(decode::<DateTime<Utc>>(wire).unwrap(), instant);
        }

        #[test]
        fn prop_zoneless_round_trip(millis in 0i64..4_102_444_800_000, offset_hours in -12i32..=14) {
            let settings = SerializerSettings::default()
                .with_local_offset(FixedOffset::east_opt(offset_hours * 3600).unwrap());
            let value = DateTime::<Utc>::from_timestamp_millis(millis).unwrap().naive_utc();
            let wire = encode_with(&value, settings).unwrap();
            prop_assert_eq!(decode_with::<NaiveDateTime>(wire, settings).unwrap(), value);
        }
    }
}
