//! Id and system-property helpers used by the CRUD layer.

use crate::descriptor::SystemProperty;
use crate::error::{Error, Result};
use crate::wire::{describe, WireValue};
use uuid::Uuid;

/// Longest string id the service accepts.
pub const MAX_STRING_ID_LENGTH: usize = 255;

const RESERVED_ID_CHARACTERS: [char; 6] = ['"', '+', '?', '\\', '/', '`'];

/// Prefix shared by every system property wire name.
pub const SYSTEM_PROPERTY_PREFIX: &str = "__";

/// Check that an id value can be sent to the service.
///
/// String ids must be non-empty, at most [`MAX_STRING_ID_LENGTH`]
/// characters, free of control characters and of `" + ? \ / \``, and may
/// not be `.` or `..`. Integer ids must be positive.
pub fn validate_id(id: &WireValue) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidId {
        value: describe(id),
        reason: reason.to_string(),
    };

    match id {
        WireValue::String(text) => {
            if text.is_empty() {
                Err(invalid("string ids must not be empty"))
            } else if text.chars().count() > MAX_STRING_ID_LENGTH {
                Err(invalid("string ids must be at most 255 characters long"))
            } else if text.chars().any(char::is_control) {
                Err(invalid("string ids must not contain control characters"))
            } else if text.contains(RESERVED_ID_CHARACTERS) {
                Err(invalid("string ids must not contain any of \" + ? \\ / `"))
            } else if text == "." || text == ".." {
                Err(invalid("string ids must not be \".\" or \"..\""))
            } else {
                Ok(())
            }
        }
        WireValue::Number(number) => match number.as_i64() {
            Some(value) if value > 0 => Ok(()),
            Some(_) => Err(invalid("integer ids must be positive")),
            None if number.is_u64() => Err(invalid("integer ids must fit in a signed 64-bit integer")),
            None => Err(invalid("ids must be integers or strings")),
        },
        _ => Err(invalid("ids must be integers or strings")),
    }
}

/// Whether an id value is the default of its kind: null, zero, the empty
/// string or the nil UUID.
pub fn is_default_id(id: &WireValue) -> bool {
    match id {
        WireValue::Null => true,
        WireValue::Number(number) => number.as_f64() == Some(0.0),
        WireValue::String(text) => {
            text.is_empty() || Uuid::parse_str(text).is_ok_and(|uuid| uuid.is_nil())
        }
        _ => false,
    }
}

/// Strip every system property from a wire object.
///
/// Returns the `__version` value when it was present as a string, so the
/// caller can send it as a concurrency precondition.
pub fn remove_system_properties(value: &mut WireValue) -> Option<String> {
    let object = value.as_object_mut()?;

    let version = object
        .iter()
        .find(|(key, _)| SystemProperty::from_wire_name(key) == Some(SystemProperty::Version))
        .and_then(|(_, v)| v.as_str().map(str::to_string));

    object.retain(|key, _| !key.starts_with(SYSTEM_PROPERTY_PREFIX));
    version
}
