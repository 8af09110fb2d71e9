//! # JSON Codec
//!
//! Encodes and decodes values that may carry a protobuf schema.
//!
//! * **Schema values** ([`ReflectMessage`]): encoded deterministically by walking the
//!   schema (proto field names, enums as numbers, unset messages as `null`, sorted map keys)
//!   and decoded strictly, with a weak-typed retry when the payload does not fit the schema.
//! * **Schema-less values** (`serde` types): plain `serde_json`.
//!
//! The free functions below use the default [`JsonCodec`]. Build a codec with custom
//! [`MarshalOptions`] / [`UnmarshalOptions`] for anything else.
pub mod codec;
pub mod encode;
pub mod names;
pub mod weak;

pub use codec::{CodecError, JsonCodec, UnmarshalOptions};
pub use encode::{MarshalOptions, MessageJson, UnsetMessage};
pub use weak::{WeakDecode, WeakObject};

use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};
use serde::{Serialize, de::DeserializeOwned};

/// Encodes a schema-less value.
pub fn marshal<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    JsonCodec::default().marshal(value)
}

/// Encodes a message in canonical mode.
pub fn marshal_message<M: ReflectMessage>(message: &M) -> Result<Vec<u8>, CodecError> {
    JsonCodec::default().marshal_message(message)
}

/// Encodes a message with 64-bit integers as bare JSON numbers.
///
/// Kept for consumers that predate the canonical encoding. Integers above 2^53 are not safe
/// for readers that parse JSON numbers as doubles; prefer [`marshal_message`].
pub fn marshal_message_legacy<M: ReflectMessage>(message: &M) -> Result<Vec<u8>, CodecError> {
    JsonCodec::legacy().marshal_message(message)
}

/// Decodes a schema-less value.
pub fn unmarshal<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    JsonCodec::default().unmarshal(bytes)
}

/// Decodes a schema-less value that knows how to rebuild itself from loosely typed JSON.
pub fn unmarshal_weak<T: DeserializeOwned + WeakDecode>(bytes: &[u8]) -> Result<T, CodecError> {
    JsonCodec::default().unmarshal_weak(bytes)
}

/// Decodes into a [`DynamicMessage`], falling back to the weak decoder on type mismatches.
pub fn unmarshal_message(bytes: &[u8], target: &mut DynamicMessage) -> Result<(), CodecError> {
    JsonCodec::default().unmarshal_message(bytes, target)
}

/// Decodes into a generated message type.
pub fn unmarshal_reflect<M>(bytes: &[u8], target: &mut M) -> Result<(), CodecError>
where
    M: ReflectMessage + Message + Default,
{
    JsonCodec::default().unmarshal_reflect(bytes, target)
}

/// Decodes into an optional message slot, allocating it first when empty.
pub fn unmarshal_slot<M>(bytes: &[u8], slot: &mut Option<M>) -> Result<(), CodecError>
where
    M: ReflectMessage + Message + Default,
{
    JsonCodec::default().unmarshal_slot(bytes, slot)
}

// `google.protobuf.*` types have their own JSON mapping, which prost-reflect implements.
pub(crate) fn is_well_known(descriptor: &MessageDescriptor) -> bool {
    descriptor.package_name() == "google.protobuf"
}
