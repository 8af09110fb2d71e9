//! # Schema Walker
//!
//! Serializes a [`DynamicMessage`] field by field in declaration order:
//!
//! - A oneof group is written once, at the position of its first declared member, using
//!   whichever member is populated. Unpopulated groups are skipped entirely.
//! - An unset singular message, or an unset proto2 scalar, is written as [`UnsetMessage`]
//!   dictates (`null` in canonical mode).
//! - Lists keep their order; map entries are sorted so output is byte-reproducible.
//! - Enums are written as their number and bytes as standard base64.
//!
//! The walker streams straight into any `serde::Serializer`, so 32-bit floats keep their
//! shortest representation unless [`MarshalOptions::widen_floats`] asks for the `f64` form.
use super::is_well_known;
use base64::{Engine, prelude::BASE64_STANDARD};
use prost_reflect::{
    DynamicMessage, FieldDescriptor, Kind, MapKey, ReflectMessage, SerializeOptions, Value,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{borrow::Cow, cmp::Ordering, collections::HashSet};

/// How an absent singular message (or proto2 scalar) is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsetMessage {
    Null,
    EmptyObject,
}

/// Options controlling the schema walk.
#[derive(Debug, Clone)]
pub struct MarshalOptions {
    stringify_64_bit_integers: bool,
    sort_fields: bool,
    unset_message: UnsetMessage,
    widen_floats: bool,
    well_known_types: bool,
}

impl MarshalOptions {
    /// Proto field names, enum numbers, unpopulated fields emitted, 64-bit integers quoted.
    pub const fn canonical() -> Self {
        Self {
            stringify_64_bit_integers: true,
            sort_fields: false,
            unset_message: UnsetMessage::Null,
            widen_floats: false,
            well_known_types: true,
        }
    }

    /// The encoding older consumers expect: 64-bit integers as bare JSON numbers,
    /// keys sorted lexically, unset messages as `{}`, `float` fields widened to double
    /// precision and `google.protobuf` types walked like any other message.
    ///
    /// **Unsafe for integers above 2^53**: consumers that store JSON numbers as doubles
    /// silently lose precision. Only use this for compatibility with existing readers.
    pub const fn legacy() -> Self {
        Self {
            stringify_64_bit_integers: false,
            sort_fields: true,
            unset_message: UnsetMessage::EmptyObject,
            widen_floats: true,
            well_known_types: false,
        }
    }

    pub const fn stringify_64_bit_integers(mut self, yes: bool) -> Self {
        self.stringify_64_bit_integers = yes;
        self
    }

    /// Sorts object keys (field names and map keys) by their text instead of declaration order.
    pub const fn sort_fields(mut self, yes: bool) -> Self {
        self.sort_fields = yes;
        self
    }

    pub const fn unset_message(mut self, unset: UnsetMessage) -> Self {
        self.unset_message = unset;
        self
    }

    /// Writes `float` fields as the `f64` they widen to (`1.100000023841858`) instead of their
    /// shortest 32-bit form (`1.1`).
    pub const fn widen_floats(mut self, yes: bool) -> Self {
        self.widen_floats = yes;
        self
    }

    /// Whether `google.protobuf.*` messages use their own JSON mapping (`Timestamp` as an
    /// RFC 3339 string, ...) rather than the field-by-field walk.
    pub const fn well_known_types(mut self, yes: bool) -> Self {
        self.well_known_types = yes;
        self
    }

    fn well_known(&self) -> SerializeOptions {
        SerializeOptions::new()
            .stringify_64_bit_integers(self.stringify_64_bit_integers)
            .use_enum_numbers(true)
            .use_proto_field_name(true)
            .skip_default_fields(false)
    }
}

impl Default for MarshalOptions {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Serializes a message according to [`MarshalOptions`].
pub struct MessageJson<'a> {
    message: &'a DynamicMessage,
    options: &'a MarshalOptions,
}

impl<'a> MessageJson<'a> {
    pub fn new(message: &'a DynamicMessage, options: &'a MarshalOptions) -> Self {
        Self { message, options }
    }

    fn entries(&self) -> Vec<(String, Slot<'a>)> {
        let message = self.message;
        let mut seen_oneofs = HashSet::new();
        let mut entries = Vec::new();

        for field in message.descriptor().fields() {
            let field = match field.containing_oneof() {
                Some(oneof) => {
                    if !seen_oneofs.insert(oneof.full_name().to_string()) {
                        continue;
                    }
                    match oneof.fields().find(|member| message.has_field(member)) {
                        Some(populated) => populated,
                        None => continue,
                    }
                }
                None => field,
            };

            let slot = if !message.has_field(&field) && writes_unset(&field) {
                Slot::Unset
            } else {
                Slot::Value(message.get_field(&field))
            };

            entries.push((json_key(&field), slot));
        }

        if self.options.sort_fields {
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        entries
    }
}

impl Serialize for MessageJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.options.well_known_types && is_well_known(&self.message.descriptor()) {
            return self
                .message
                .serialize_with_options(serializer, &self.options.well_known());
        }

        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, slot) in &entries {
            map.serialize_entry(
                key,
                &SlotJson {
                    slot,
                    options: self.options,
                },
            )?;
        }
        map.end()
    }
}

enum Slot<'a> {
    Unset,
    Value(Cow<'a, Value>),
}

struct SlotJson<'s, 'a> {
    slot: &'s Slot<'a>,
    options: &'s MarshalOptions,
}

impl Serialize for SlotJson<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.slot, self.options.unset_message) {
            (Slot::Unset, UnsetMessage::Null) => serializer.serialize_none(),
            (Slot::Unset, UnsetMessage::EmptyObject) => serializer.serialize_map(Some(0))?.end(),
            (Slot::Value(value), _) => ValueJson {
                value: &**value,
                options: self.options,
            }
            .serialize(serializer),
        }
    }
}

struct ValueJson<'a> {
    value: &'a Value,
    options: &'a MarshalOptions,
}

impl Serialize for ValueJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let options = self.options;
        match self.value {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::I64(v) if options.stringify_64_bit_integers => serializer.collect_str(v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) if options.stringify_64_bit_integers => serializer.collect_str(v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) if v.is_finite() && options.widen_floats => {
                serializer.serialize_f64(f64::from(*v))
            }
            Value::F32(v) if v.is_finite() => serializer.serialize_f32(*v),
            Value::F32(v) => serializer.serialize_str(non_finite(f64::from(*v))),
            Value::F64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::F64(v) => serializer.serialize_str(non_finite(*v)),
            Value::String(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&BASE64_STANDARD.encode(v)),
            Value::EnumNumber(v) => serializer.serialize_i32(*v),
            Value::Message(message) => MessageJson::new(message, options).serialize(serializer),
            Value::List(items) => {
                serializer.collect_seq(items.iter().map(|value| ValueJson { value, options }))
            }
            Value::Map(entries) => {
                let mut sorted: Vec<_> = entries.iter().collect();
                if options.sort_fields {
                    sorted.sort_by_cached_key(|(key, _)| map_key_text(key));
                } else {
                    sorted.sort_by(|(a, _), (b, _)| cmp_map_keys(a, b));
                }

                let mut map = serializer.serialize_map(Some(sorted.len()))?;
                for (key, value) in sorted {
                    map.serialize_entry(&map_key_text(key), &ValueJson { value, options })?;
                }
                map.end()
            }
        }
    }
}

// Unset fields that are written explicitly rather than as their zero value.
fn writes_unset(field: &FieldDescriptor) -> bool {
    if field.is_list() || field.is_map() {
        return false;
    }
    if matches!(field.kind(), Kind::Message(_)) {
        return true;
    }
    matches!(
        field
            .parent_message()
            .parent_file()
            .file_descriptor_proto()
            .syntax(),
        "" | "proto2"
    )
}

fn json_key(field: &FieldDescriptor) -> String {
    match field.kind() {
        Kind::Message(group) if field.is_group() => group.name().to_string(),
        _ => field.name().to_string(),
    }
}

fn non_finite(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn map_key_text(key: &MapKey) -> String {
    match key {
        MapKey::Bool(v) => v.to_string(),
        MapKey::I32(v) => v.to_string(),
        MapKey::I64(v) => v.to_string(),
        MapKey::U32(v) => v.to_string(),
        MapKey::U64(v) => v.to_string(),
        MapKey::String(v) => v.clone(),
    }
}

fn cmp_map_keys(a: &MapKey, b: &MapKey) -> Ordering {
    match (a, b) {
        (MapKey::Bool(a), MapKey::Bool(b)) => a.cmp(b),
        (MapKey::I32(a), MapKey::I32(b)) => a.cmp(b),
        (MapKey::I64(a), MapKey::I64(b)) => a.cmp(b),
        (MapKey::U32(a), MapKey::U32(b)) => a.cmp(b),
        (MapKey::U64(a), MapKey::U64(b)) => a.cmp(b),
        (MapKey::String(a), MapKey::String(b)) => a.cmp(b),
        _ => map_key_text(a).cmp(&map_key_text(b)),
    }
}
