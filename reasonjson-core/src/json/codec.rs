//! # Schema-Aware Codec
//!
//! The single entry point for producing and consuming wire JSON.
//!
//! Values that carry a protobuf schema ([`ReflectMessage`] implementors, including
//! [`DynamicMessage`]) go through the schema walker on the way out and through
//! `prost-reflect`'s strict decoder on the way in, after keys that name no field have been
//! dropped. When the strict decoder rejects a payload the codec retries once with the
//! [weak decoder](super::weak) over the same bytes, and only reports a failure if that retry
//! fails too. Either way a successful decode replaces the target.
//!
//! Values without a schema are plain `serde` types and use `serde_json` directly.
use super::{
    encode::{MarshalOptions, MessageJson},
    is_well_known,
    weak::{self, WeakDecode},
};
use prost::Message;
use prost_reflect::{
    DeserializeOptions, DynamicMessage, FieldDescriptor, Kind, MessageDescriptor, ReflectMessage,
    SetFieldError,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed JSON: '{0}'")]
    Parse(#[source] serde_json::Error),

    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Field '{field}' expects {expected}, found {found}")]
    SchemaMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("JSON does not fit the target type: '{0}'")]
    TypeMismatch(#[source] serde_json::Error),

    #[error("Failed to set field: '{0}'")]
    SetField(#[from] SetFieldError),

    #[error("Failed to encode JSON: '{0}'")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to transcode message: '{0}'")]
    Transcode(#[from] prost::DecodeError),
}

impl CodecError {
    /// Classifies a `serde_json` decode failure as malformed input or a type mismatch.
    pub fn from_decode(err: serde_json::Error) -> Self {
        if err.is_data() {
            CodecError::TypeMismatch(err)
        } else {
            CodecError::Parse(err)
        }
    }

    /// Returns `true` if the input was not valid JSON at all.
    pub fn is_parse(&self) -> bool {
        matches!(self, CodecError::Parse(_))
    }
}

/// Options controlling decoding.
#[derive(Debug, Clone)]
pub struct UnmarshalOptions {
    weak_fallback: bool,
}

impl UnmarshalOptions {
    pub const fn new() -> Self {
        Self {
            weak_fallback: true,
        }
    }

    /// Whether a payload rejected by the strict decoder is retried by the weak decoder.
    pub const fn weak_fallback(mut self, yes: bool) -> Self {
        self.weak_fallback = yes;
        self
    }
}

impl Default for UnmarshalOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured codec. The free functions in [`crate::json`] use [`JsonCodec::default`].
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    marshal: MarshalOptions,
    unmarshal: UnmarshalOptions,
}

impl JsonCodec {
    pub fn new(marshal: MarshalOptions, unmarshal: UnmarshalOptions) -> Self {
        Self { marshal, unmarshal }
    }

    /// A codec writing the legacy encoding. See [`MarshalOptions::legacy`].
    pub fn legacy() -> Self {
        Self::new(MarshalOptions::legacy(), UnmarshalOptions::default())
    }

    pub fn marshal_options(&self) -> &MarshalOptions {
        &self.marshal
    }

    /// Encodes a schema-less value with plain `serde_json`.
    pub fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::Encode)
    }

    /// Encodes a message by walking its schema.
    pub fn marshal_message<M: ReflectMessage>(&self, message: &M) -> Result<Vec<u8>, CodecError> {
        let dynamic = message.transcode_to_dynamic();
        self.marshal_dynamic(&dynamic)
    }

    /// Encodes a [`DynamicMessage`] without copying it first.
    pub fn marshal_dynamic(&self, message: &DynamicMessage) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(&MessageJson::new(message, &self.marshal)).map_err(CodecError::Encode)
    }

    /// Decodes a schema-less value with plain `serde_json`.
    pub fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::from_decode)
    }

    /// Decodes a schema-less value, retrying through [`WeakDecode`] when the strict
    /// decode fails on anything but malformed JSON.
    pub fn unmarshal_weak<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned + WeakDecode,
    {
        match self.unmarshal(bytes) {
            Err(err) if !err.is_parse() && self.unmarshal.weak_fallback => weak::decode(bytes),
            result => result,
        }
    }

    /// Decodes `bytes` into `target`, replacing its previous contents.
    ///
    /// Keys that name no field are discarded, at every nesting level. The rest are decoded
    /// strictly; if that fails the weak decoder rebuilds `target` from the same bytes.
    pub fn unmarshal_message(
        &self,
        bytes: &[u8],
        target: &mut DynamicMessage,
    ) -> Result<(), CodecError> {
        let mut value: Value = serde_json::from_slice(bytes).map_err(CodecError::Parse)?;
        let descriptor = target.descriptor();
        discard_unknown(&mut value, &descriptor);

        // Every remaining key names a field, so a rejection here is a value the schema does
        // not accept (an unknown enum name, a string in a message slot, ...).
        let strict =
            DynamicMessage::deserialize_with_options(descriptor, value, &DeserializeOptions::new());

        match strict {
            Ok(message) => {
                *target = message;
                Ok(())
            }
            Err(_) if self.unmarshal.weak_fallback => {
                target.clear();
                weak::merge_message(bytes, target)
            }
            Err(err) => Err(CodecError::from_decode(err)),
        }
    }

    /// Decodes `bytes` into a generated message type by way of a [`DynamicMessage`].
    pub fn unmarshal_reflect<M>(&self, bytes: &[u8], target: &mut M) -> Result<(), CodecError>
    where
        M: ReflectMessage + Message + Default,
    {
        let mut dynamic = target.transcode_to_dynamic();
        self.unmarshal_message(bytes, &mut dynamic)?;
        *target = dynamic.transcode_to::<M>()?;
        Ok(())
    }

    /// Like [`JsonCodec::unmarshal_reflect`], allocating the message first when the slot is
    /// empty.
    pub fn unmarshal_slot<M>(&self, bytes: &[u8], slot: &mut Option<M>) -> Result<(), CodecError>
    where
        M: ReflectMessage + Message + Default,
    {
        let target = slot.get_or_insert_with(M::default);
        self.unmarshal_reflect(bytes, target)
    }
}

// Drops object keys that match neither a field's proto name nor its JSON name. Values of the
// wrong shape are left alone for the decoder to reject.
fn discard_unknown(value: &mut Value, descriptor: &MessageDescriptor) {
    let Value::Object(object) = value else {
        return;
    };

    object.retain(|key, _| field_for(descriptor, key).is_some());

    for (key, item) in object.iter_mut() {
        let Some(field) = field_for(descriptor, key) else {
            continue;
        };
        let Kind::Message(nested) = field.kind() else {
            continue;
        };

        if field.is_map() {
            if let Kind::Message(entry_value) = nested.map_entry_value_field().kind()
                && !is_well_known(&entry_value)
                && let Value::Object(entries) = item
            {
                entries
                    .values_mut()
                    .for_each(|entry| discard_unknown(entry, &entry_value));
            }
        } else if is_well_known(&nested) {
            continue;
        } else if let Value::Array(items) = item {
            items
                .iter_mut()
                .for_each(|item| discard_unknown(item, &nested));
        } else {
            discard_unknown(item, &nested);
        }
    }
}

fn field_for(descriptor: &MessageDescriptor, key: &str) -> Option<FieldDescriptor> {
    descriptor
        .get_field_by_name(key)
        .or_else(|| descriptor.get_field_by_json_name(key))
}
