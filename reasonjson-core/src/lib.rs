//! # Reasonjson Core
//!
//! `reasonjson-core` is the interop layer for services that describe their data with protobuf
//! schemas but also have to speak plain JSON, and that need to report failures in a form every
//! transport can carry.
//!
//! ## Key Components
//!
//! * **[`json`]:** A schema-aware JSON codec. Messages are encoded deterministically from their
//!   schema; everything else goes through `serde_json`. Decoding tolerates producers that send
//!   the wrong JSON type for a field by retrying with a weak-typed decoder.
//! * **[`errors`]:** The [`ReasonError`](errors::ReasonError) error model and
//!   [`parse`](errors::parse), which recovers one from a gRPC status, a legacy envelope or
//!   a JSON string.
//!
//! ## Example
//!
//! ```rust
//! use reasonjson_core::errors::{self, ReasonError};
//!
//! let err = ReasonError::new("ORDER_CLOSED", "order 7 is closed").with_continue();
//! let over_the_wire = std::io::Error::other(err.to_string());
//!
//! let parsed = errors::parse(&over_the_wire);
//! assert_eq!(parsed.reason(), "ORDER_CLOSED");
//! assert!(parsed.is_continue());
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod errors;
pub mod json;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;
