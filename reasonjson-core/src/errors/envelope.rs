//! # Legacy Error Envelope
//!
//! Older services wrap failures in a `{id, code, detail, status}` envelope whose text form is
//! its own JSON. When such a service passes a [`ReasonError`](super::ReasonError) along, the
//! reason error's JSON ends up in `detail`.
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// An error shape that wraps a single detail string.
///
/// [`parse`](super::parse) finds envelopes by downcasting the `source()` chain, so it only
/// looks inside [`MicroError`]. Other implementors are treated like any other error.
pub trait LegacyEnvelope {
    fn detail(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MicroError {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub status: String,
}

impl MicroError {
    pub fn new(id: impl Into<String>, detail: impl Into<String>, code: i32) -> Self {
        Self {
            id: id.into(),
            code,
            detail: detail.into(),
            status: String::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

impl LegacyEnvelope for MicroError {
    fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for MicroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Error for MicroError {}
