use crate::json::{self, CodecError, WeakDecode, WeakObject, weak};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{error::Error, fmt};

/// Reason given to errors that could not be classified.
pub const UNKNOWN_REASON: &str = "UNKNOWN_ERROR";

/// An error identified by a stable `reason` code.
///
/// The reason is what callers route and compare on; the message is for humans and may change
/// freely. The text form of a `ReasonError` is its JSON encoding, so it survives transports
/// that only carry a string and can be recovered with [`parse`](super::parse).
///
/// ```rust
/// use reasonjson_core::errors::ReasonError;
///
/// let err = ReasonError::new("USER_NOT_FOUND", "no user with id 42")
///     .with_metadata([("user_id", 42)])
///     .with_continue();
///
/// assert_eq!(
///     err.to_string(),
///     r#"{"msg":"no user with id 42","reason":"USER_NOT_FOUND","continue":true,"metadata":{"user_id":42}}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonError {
    #[serde(default)]
    pub(crate) msg: String,
    #[serde(default)]
    pub(crate) reason: String,
    #[serde(default, rename = "continue")]
    pub(crate) continuable: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub(crate) metadata: Map<String, Value>,
}

/// Builds a [`ReasonError`] with a formatted message.
#[macro_export]
macro_rules! reason_error {
    ($reason:expr, $($arg:tt)+) => {
        $crate::errors::ReasonError::new($reason, format!($($arg)+))
    };
}

impl ReasonError {
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            msg: message.into(),
            reason: reason.into(),
            continuable: false,
            metadata: Map::new(),
        }
    }

    /// An error carrying [`UNKNOWN_REASON`].
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(UNKNOWN_REASON, message)
    }

    /// Merges `metadata` into the existing metadata. Later keys overwrite earlier ones.
    pub fn with_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata
            .extend(metadata.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Marks the error as an expected business outcome rather than a defect.
    ///
    /// Callers use the flag to decide whether the error is worth alerting or logging on.
    pub fn with_continue(mut self) -> Self {
        self.continuable = true;
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn message(&self) -> &str {
        &self.msg
    }

    pub fn is_continue(&self) -> bool {
        self.continuable
    }

    pub fn is_unknown(&self) -> bool {
        self.reason == UNKNOWN_REASON
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.metadata
    }

    /// The JSON text of this error. Never fails: if encoding does, the text of an
    /// unknown-reason error describing the failure is returned instead.
    pub fn as_text(&self) -> String {
        match json::marshal(self) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                let fallback = ReasonError::unknown(err.to_string());
                serde_json::json!({
                    "msg": fallback.msg,
                    "reason": fallback.reason,
                    "continue": fallback.continuable,
                    "metadata": {},
                })
                .to_string()
            }
        }
    }

    /// Returns `true` if `other` is, wraps, or textually encodes an error with the same reason.
    ///
    /// Messages and metadata play no part in the comparison.
    pub fn matches(&self, other: &(dyn Error + 'static)) -> bool {
        if let Some(native) = super::find::<ReasonError>(other) {
            return native.reason == self.reason;
        }
        Self::decode(&other.to_string()).is_some_and(|decoded| decoded.reason == self.reason)
    }

    /// Decodes a `ReasonError` from its JSON text. Payloads without a reason do not count.
    pub(crate) fn decode(text: &str) -> Option<Self> {
        let has_reason = |decoded: &Self| !decoded.reason.is_empty();
        // A strict decode that merely missed differently-cased keys gets a second, weak look.
        json::unmarshal_weak::<Self>(text.as_bytes())
            .ok()
            .filter(has_reason)
            .or_else(|| weak::decode::<Self>(text.as_bytes()).ok().filter(has_reason))
    }
}

impl fmt::Display for ReasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Error for ReasonError {}

impl WeakDecode for ReasonError {
    fn decode_weak(object: &WeakObject<'_>) -> Result<Self, CodecError> {
        let metadata = match object.get("metadata") {
            None => Map::new(),
            Some(Value::Object(metadata)) => metadata.clone(),
            Some(other) => return Err(mismatch("metadata", "an object", other)),
        };

        Ok(Self {
            msg: coerce(object, "msg", "a string", weak::string_from)?.unwrap_or_default(),
            reason: coerce(object, "reason", "a string", weak::string_from)?.unwrap_or_default(),
            continuable: coerce(object, "continue", "a boolean", weak::bool_from)?
                .unwrap_or_default(),
            metadata,
        })
    }
}

fn coerce<T>(
    object: &WeakObject<'_>,
    field: &str,
    expected: &str,
    read: fn(&Value) -> Option<T>,
) -> Result<Option<T>, CodecError> {
    object
        .get(field)
        .map(|value| read(value).ok_or_else(|| mismatch(field, expected, value)))
        .transpose()
}

fn mismatch(field: &str, expected: &str, found: &Value) -> CodecError {
    CodecError::SchemaMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: weak::json_kind(found),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
