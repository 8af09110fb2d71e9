//! # Error Normalizer
//!
//! Turns any error into a [`ReasonError`]. Strategies are tried in a fixed order and the
//! first one that recognizes the error wins:
//!
//! 1. The error is, or wraps, a [`ReasonError`]: it is returned unchanged.
//! 2. The error is, or wraps, a [`tonic::Status`]: the reason comes from its `ErrorInfo`
//!    detail, or is [`UNKNOWN_REASON`](super::UNKNOWN_REASON) if it has none.
//! 3. The error is, or wraps, a [`MicroError`] whose detail is a reason error's JSON.
//! 4. The error's own text is a reason error's JSON.
//! 5. Otherwise: an unknown-reason error whose message is the error's text.
//!
//! Normalization cannot fail, so callers never need a second error path while classifying.
use super::{LegacyEnvelope, MicroError, ReasonError, find};
use std::error::Error;
use tonic::Status;

pub fn parse(err: &(dyn Error + 'static)) -> ReasonError {
    if let Some(native) = find::<ReasonError>(err) {
        return native.clone();
    }

    if let Some(status) = find::<Status>(err) {
        return ReasonError::from_status(status);
    }

    if let Some(envelope) = find::<MicroError>(err)
        && let Some(decoded) = ReasonError::decode(envelope.detail())
    {
        return decoded;
    }

    let text = err.to_string();
    ReasonError::decode(&text).unwrap_or_else(|| ReasonError::unknown(text))
}

/// [`parse`] for an optional error: `None` stays `None`.
pub fn parse_opt(err: Option<&(dyn Error + 'static)>) -> Option<ReasonError> {
    err.map(parse)
}

/// Whether `err` marks an expected outcome. No error at all counts as continuable.
pub fn is_continue(err: Option<&(dyn Error + 'static)>) -> bool {
    err.is_none_or(|err| parse(err).is_continue())
}
