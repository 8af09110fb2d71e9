//! # Reason-Coded Errors
//!
//! [`ReasonError`] is the canonical error shape exchanged between services: a stable reason
//! code, a human-readable message, a `continue` flag marking expected business outcomes and
//! free-form metadata.
//!
//! Errors arriving from downstream calls can take many forms (a gRPC status, a legacy
//! envelope, a bare string). [`parse`] recovers a `ReasonError` from any of them.
pub mod envelope;
pub mod parse;
pub mod reason;
pub mod status;

pub use envelope::{LegacyEnvelope, MicroError};
pub use parse::{is_continue, parse, parse_opt};
pub use reason::{ReasonError, UNKNOWN_REASON};
pub use status::{ReasonDetail, TransportStatus};

use std::error::Error;

/// Finds the first error of type `T` in the `source()` chain of `err`, `err` included.
pub(crate) fn find<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    std::iter::successors(Some(err), |&err| err.source()).find_map(|err| err.downcast_ref::<T>())
}
