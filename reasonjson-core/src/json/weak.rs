//! # Weak-Typed Fallback Decoder
//!
//! The schema decoder is strict: a field declared as an integer must arrive as a JSON number
//! (or a numeric string), an enum must be a known name or number, and so on. Producers do not
//! always respect that, so when the strict path rejects a payload the codec retries here.
//!
//! This decoder parses the bytes into a generic JSON object and copies it field by field into
//! the target, locating keys with [`names::matches`] and coercing compatible scalars
//! (`"2"` into an integer slot, `1` into a boolean slot, ...). Keys with no matching field are
//! ignored and fields with no matching key keep whatever value they already had.
use super::{CodecError, is_well_known, names};
use base64::{Engine, prelude::BASE64_STANDARD};
use prost_reflect::{
    DynamicMessage, EnumDescriptor, FieldDescriptor, Kind, MapKey, MessageDescriptor,
    ReflectMessage, Value as ReflectValue,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Schema-less types that can rebuild themselves from a loosely typed JSON object.
///
/// Implementors look their fields up through [`WeakObject::get`] and coerce them with the
/// helpers in this module, which gives them the same tolerance the schema path gets.
pub trait WeakDecode: Sized {
    fn decode_weak(object: &WeakObject<'_>) -> Result<Self, CodecError>;
}

/// A parsed JSON object whose keys are looked up by field name rather than by exact key.
pub struct WeakObject<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> WeakObject<'a> {
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Finds the value for `field`, preferring an exact key. `null` counts as absent.
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        lookup(self.fields, field).filter(|value| !value.is_null())
    }
}

/// Parses `bytes` as a JSON object.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, CodecError> {
    match serde_json::from_slice(bytes).map_err(CodecError::Parse)? {
        Value::Object(object) => Ok(object),
        other => Err(CodecError::NotAnObject(json_kind(&other))),
    }
}

/// Decodes `bytes` into a schema-less `T` through its [`WeakDecode`] implementation.
pub fn decode<T: WeakDecode>(bytes: &[u8]) -> Result<T, CodecError> {
    let object = parse_object(bytes)?;
    T::decode_weak(&WeakObject::new(&object))
}

/// Merges `bytes` into `target`, coercing every matched field to its declared kind.
pub fn merge_message(bytes: &[u8], target: &mut DynamicMessage) -> Result<(), CodecError> {
    let object = parse_object(bytes)?;
    merge_object(&object, target)
}

fn merge_object(object: &Map<String, Value>, target: &mut DynamicMessage) -> Result<(), CodecError> {
    let descriptor = target.descriptor();

    for field in descriptor.fields() {
        let Some(value) = lookup(object, field.name()).or_else(|| object.get(field.json_name()))
        else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        let current = if !field.is_list() && !field.is_map() && target.has_field(&field) {
            target.get_field(&field).as_message().cloned()
        } else {
            None
        };

        let coerced = coerce_field(value, &field, current)?;
        target.try_set_field(&field, coerced)?;
    }

    Ok(())
}

fn lookup<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).or_else(|| {
        object
            .iter()
            .find(|(key, _)| names::matches(key, field))
            .map(|(_, value)| value)
    })
}

fn coerce_field(
    value: &Value,
    field: &FieldDescriptor,
    current: Option<DynamicMessage>,
) -> Result<ReflectValue, CodecError> {
    if field.is_map() {
        let Kind::Message(entry) = field.kind() else {
            return Err(mismatch(field, value));
        };
        let Value::Object(object) = value else {
            return Err(mismatch(field, value));
        };

        let key_field = entry.map_entry_key_field();
        let value_field = entry.map_entry_value_field();
        let mut map = HashMap::with_capacity(object.len());
        for (key, item) in object {
            map.insert(
                map_key(key, &key_field)?,
                coerce_singular(item, &value_field, None)?,
            );
        }
        return Ok(ReflectValue::Map(map));
    }

    if field.is_list() {
        let items = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_singular(item, field, None))
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![coerce_singular(single, field, None)?],
        };
        return Ok(ReflectValue::List(items));
    }

    coerce_singular(value, field, current)
}

fn coerce_singular(
    value: &Value,
    field: &FieldDescriptor,
    current: Option<DynamicMessage>,
) -> Result<ReflectValue, CodecError> {
    let kind = field.kind();
    if value.is_null() {
        return Ok(ReflectValue::default_value(&kind));
    }

    let coerced = match &kind {
        Kind::Bool => bool_from(value).map(ReflectValue::Bool),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => i64_from(value)
            .and_then(|v| i32::try_from(v).ok())
            .map(ReflectValue::I32),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => i64_from(value).map(ReflectValue::I64),
        Kind::Uint32 | Kind::Fixed32 => u64_from(value)
            .and_then(|v| u32::try_from(v).ok())
            .map(ReflectValue::U32),
        Kind::Uint64 | Kind::Fixed64 => u64_from(value).map(ReflectValue::U64),
        Kind::Float => f64_from(value).map(|v| ReflectValue::F32(v as f32)),
        Kind::Double => f64_from(value).map(ReflectValue::F64),
        Kind::String => string_from(value).map(ReflectValue::String),
        Kind::Bytes => bytes_from(value).map(|bytes| ReflectValue::Bytes(bytes.into())),
        Kind::Enum(descriptor) => enum_from(value, descriptor).map(ReflectValue::EnumNumber),
        Kind::Message(descriptor) => {
            return message_from(value, field, descriptor, current).map(ReflectValue::Message);
        }
    };

    coerced.ok_or_else(|| mismatch(field, value))
}

fn message_from(
    value: &Value,
    field: &FieldDescriptor,
    descriptor: &MessageDescriptor,
    current: Option<DynamicMessage>,
) -> Result<DynamicMessage, CodecError> {
    if is_well_known(descriptor) {
        return DynamicMessage::deserialize(descriptor.clone(), value.clone())
            .map_err(CodecError::TypeMismatch);
    }

    let Value::Object(object) = value else {
        return Err(mismatch(field, value));
    };

    let mut message = current.unwrap_or_else(|| DynamicMessage::new(descriptor.clone()));
    merge_object(object, &mut message)?;
    Ok(message)
}

fn map_key(key: &str, field: &FieldDescriptor) -> Result<MapKey, CodecError> {
    let raw = Value::String(key.to_string());
    let parsed = match field.kind() {
        Kind::Bool => bool_from(&raw).map(MapKey::Bool),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => i64_from(&raw)
            .and_then(|v| i32::try_from(v).ok())
            .map(MapKey::I32),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => i64_from(&raw).map(MapKey::I64),
        Kind::Uint32 | Kind::Fixed32 => u64_from(&raw)
            .and_then(|v| u32::try_from(v).ok())
            .map(MapKey::U32),
        Kind::Uint64 | Kind::Fixed64 => u64_from(&raw).map(MapKey::U64),
        Kind::String => Some(MapKey::String(key.to_string())),
        _ => None,
    };

    parsed.ok_or_else(|| mismatch(field, &raw))
}

fn enum_from(value: &Value, descriptor: &EnumDescriptor) -> Option<i32> {
    if let Value::String(name) = value
        && let Some(known) = descriptor.get_value_by_name(name)
    {
        return Some(known.number());
    }
    i64_from(value).and_then(|v| i32::try_from(v).ok())
}

/// Reads a boolean from a boolean, a number (non-zero is `true`) or a boolean-looking string.
pub fn bool_from(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            "" | "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Reads a signed integer. Floats are truncated; the empty string is zero.
pub fn i64_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0);
            }
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_i64))
        }
        _ => None,
    }
}

/// Reads an unsigned integer. Negative values are rejected.
pub fn u64_from(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(truncate_u64)),
        Value::Bool(b) => Some(u64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0);
            }
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_u64))
        }
        _ => None,
    }
}

pub fn f64_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0.0);
            }
            s.parse().ok()
        }
        _ => None,
    }
}

/// Reads a string; numbers become their decimal text and booleans `"1"` or `"0"`.
pub fn string_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads bytes from a base64 string (raw UTF-8 when it is not base64) or an array of octets.
pub fn bytes_from(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => Some(
            BASE64_STANDARD
                .decode(s)
                .unwrap_or_else(|_| s.as_bytes().to_vec()),
        ),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

fn truncate_i64(f: f64) -> Option<i64> {
    (f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64).then(|| f.trunc() as i64)
}

fn truncate_u64(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f <= u64::MAX as f64).then(|| f.trunc() as u64)
}

fn mismatch(field: &FieldDescriptor, value: &Value) -> CodecError {
    CodecError::SchemaMismatch {
        field: field.full_name().to_string(),
        expected: kind_name(&field.kind()),
        found: json_kind(value),
    }
}

fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Message(descriptor) => descriptor.full_name().to_string(),
        Kind::Enum(descriptor) => descriptor.full_name().to_string(),
        other => format!("{other:?}").to_lowercase(),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booleans_from_strings_and_numbers() {
        assert_eq!(bool_from(&json!("true")), Some(true));
        assert_eq!(bool_from(&json!("F")), Some(false));
        assert_eq!(bool_from(&json!("")), Some(false));
        assert_eq!(bool_from(&json!(2)), Some(true));
        assert_eq!(bool_from(&json!("yes")), None);
    }

    #[test]
    fn integers_from_strings_floats_and_booleans() {
        assert_eq!(i64_from(&json!("2")), Some(2));
        assert_eq!(i64_from(&json!(" -7 ")), Some(-7));
        assert_eq!(i64_from(&json!("")), Some(0));
        assert_eq!(i64_from(&json!(3.9)), Some(3));
        assert_eq!(i64_from(&json!(true)), Some(1));
        assert_eq!(i64_from(&json!("two")), None);
        assert_eq!(u64_from(&json!(-1)), None);
        assert_eq!(u64_from(&json!("18446744073709551615")), Some(u64::MAX));
    }

    #[test]
    fn strings_from_scalars() {
        assert_eq!(string_from(&json!(12)), Some("12".to_string()));
        assert_eq!(string_from(&json!(false)), Some("0".to_string()));
        assert_eq!(string_from(&json!({})), None);
    }

    #[test]
    fn bytes_from_base64_raw_text_and_octets() {
        assert_eq!(bytes_from(&json!("aGk=")), Some(b"hi".to_vec()));
        assert_eq!(bytes_from(&json!("hi!")), Some(b"hi!".to_vec()));
        assert_eq!(bytes_from(&json!([104, 105])), Some(b"hi".to_vec()));
        assert_eq!(bytes_from(&json!([300])), None);
    }

    #[test]
    fn lookup_prefers_exact_keys() {
        let Value::Object(object) = json!({ "UserID": "fuzzy", "user_id": "exact" }) else {
            unreachable!()
        };
        let weak = WeakObject::new(&object);
        assert_eq!(weak.get("user_id"), Some(&json!("exact")));

        let Value::Object(object) = json!({ "UserID": "fuzzy", "gone": null }) else {
            unreachable!()
        };
        let weak = WeakObject::new(&object);
        assert_eq!(weak.get("user_id"), Some(&json!("fuzzy")));
        assert_eq!(weak.get("gone"), None);
    }

    #[test]
    fn top_level_must_be_an_object() {
        assert!(matches!(parse_object(b"[1]"), Err(CodecError::NotAnObject("an array"))));
        assert!(matches!(parse_object(b"{"), Err(CodecError::Parse(_))));
    }
}
