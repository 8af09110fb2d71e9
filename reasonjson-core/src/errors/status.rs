//! # Transport Status Details
//!
//! gRPC carries structured error details as a serialized `google.rpc.Status` in the
//! `grpc-status-details-bin` trailer. The detail this crate cares about is
//! `google.rpc.ErrorInfo`, which holds a reason and a string-to-string metadata map.
use super::reason::{ReasonError, UNKNOWN_REASON};
use bytes::Bytes;
use prost::Message;
use prost_types::Any;
use serde_json::Value;
use std::collections::HashMap;
use tonic::{Code, Status};

pub const ERROR_INFO_TYPE_URL: &str = "type.googleapis.com/google.rpc.ErrorInfo";

/// `google.rpc.Status`
#[derive(Clone, PartialEq, Message)]
pub struct RpcStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<Any>,
}

/// `google.rpc.ErrorInfo`
#[derive(Clone, PartialEq, Message)]
pub struct ErrorInfo {
    #[prost(string, tag = "1")]
    pub reason: String,
    #[prost(string, tag = "2")]
    pub domain: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

/// A status detail entry that carries a reason.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReasonDetail {
    pub reason: String,
    pub metadata: HashMap<String, String>,
}

/// A transport-level error status with typed detail entries.
///
/// [`parse`](super::parse) recognizes a status by downcasting the `source()` chain, which
/// needs a concrete type, so it only finds [`tonic::Status`]. Other implementors convert
/// explicitly with [`ReasonError::from_status`].
pub trait TransportStatus {
    fn status_message(&self) -> &str;

    /// Every detail entry that carries a reason, in the order the status lists them.
    fn reason_details(&self) -> Vec<ReasonDetail>;
}

impl TransportStatus for Status {
    fn status_message(&self) -> &str {
        self.message()
    }

    fn reason_details(&self) -> Vec<ReasonDetail> {
        // Details that are not a google.rpc.Status are not ours to interpret.
        let Ok(status) = RpcStatus::decode(self.details()) else {
            return Vec::new();
        };

        status
            .details
            .iter()
            .filter(|any| any.type_url == ERROR_INFO_TYPE_URL)
            .filter_map(|any| ErrorInfo::decode(any.value.as_slice()).ok())
            .map(|info| ReasonDetail {
                reason: info.reason,
                metadata: info.metadata,
            })
            .collect()
    }
}

impl ReasonError {
    /// Builds an error from the first reason-carrying detail of `status`, or an
    /// [`UNKNOWN_REASON`] error with the status message if there is none.
    pub fn from_status<S: TransportStatus + ?Sized>(status: &S) -> Self {
        match status.reason_details().into_iter().next() {
            Some(detail) => ReasonError::new(detail.reason, status.status_message())
                .with_metadata(detail.metadata),
            None => ReasonError::new(UNKNOWN_REASON, status.status_message()),
        }
    }

    /// Encodes this error as a gRPC status whose details hold a single `ErrorInfo`.
    ///
    /// `ErrorInfo` metadata is string-valued, so non-string metadata travels as JSON text.
    pub fn to_status(&self, code: Code) -> Status {
        let metadata = self
            .metadata
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();

        let info = ErrorInfo {
            reason: self.reason.clone(),
            domain: String::new(),
            metadata,
        };

        let details = RpcStatus {
            code: code as i32,
            message: self.msg.clone(),
            details: vec![Any {
                type_url: ERROR_INFO_TYPE_URL.to_string(),
                value: info.encode_to_vec(),
            }],
        };

        Status::with_details(code, self.msg.clone(), Bytes::from(details.encode_to_vec()))
    }
}

impl From<ReasonError> for Status {
    fn from(err: ReasonError) -> Self {
        err.to_status(Code::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trip_keeps_reason_and_metadata() {
        let original = ReasonError::new("QUOTA_EXCEEDED", "too many requests")
            .with_metadata([("limit", json!(10)), ("scope", json!("user"))]);

        let status = original.to_status(Code::ResourceExhausted);
        assert_eq!(status.code(), Code::ResourceExhausted);

        let details = status.reason_details();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].reason, "QUOTA_EXCEEDED");
        assert_eq!(details[0].metadata["limit"], "10");

        let parsed = ReasonError::from_status(&status);
        assert_eq!(parsed.reason(), "QUOTA_EXCEEDED");
        assert_eq!(parsed.message(), "too many requests");
        assert_eq!(parsed.metadata()["scope"], json!("user"));
    }

    #[test]
    fn status_without_details_is_unknown() {
        let status = Status::not_found("no such user");
        assert!(status.reason_details().is_empty());

        let parsed = ReasonError::from_status(&status);
        assert!(parsed.is_unknown());
        assert_eq!(parsed.message(), "no such user");
    }

    #[test]
    fn any_transport_status_converts_explicitly() {
        struct Gateway;

        impl TransportStatus for Gateway {
            fn status_message(&self) -> &str {
                "upstream rejected the order"
            }

            fn reason_details(&self) -> Vec<ReasonDetail> {
                vec![ReasonDetail {
                    reason: "ORDER_CLOSED".to_string(),
                    metadata: HashMap::from([("order".to_string(), "7".to_string())]),
                }]
            }
        }

        let parsed = ReasonError::from_status(&Gateway);
        assert_eq!(parsed.reason(), "ORDER_CLOSED");
        assert_eq!(parsed.message(), "upstream rejected the order");
        assert_eq!(parsed.metadata()["order"], json!("7"));
    }

    #[test]
    fn foreign_details_are_skipped() {
        let details = RpcStatus {
            code: Code::Internal as i32,
            message: "boom".to_string(),
            details: vec![Any {
                type_url: "type.googleapis.com/google.rpc.DebugInfo".to_string(),
                value: vec![],
            }],
        };
        let status = Status::with_details(
            Code::Internal,
            "boom",
            Bytes::from(details.encode_to_vec()),
        );

        assert!(status.reason_details().is_empty());
    }
}
