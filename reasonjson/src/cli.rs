//! # CLI
//!
//! This module defines the command-line interface of `reasonjson` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring the body is JSON).
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reasonjson",
    version,
    about = "Schema-aware JSON codec and error normalizer"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a JSON body into a message and print its deterministic encoding
    ///
    /// The body is decoded with the weak-typed fallback enabled, so loosely typed input
    /// (numbers as strings, differently cased keys) is accepted.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// reasonjson encode --file-descriptor-set descriptor.bin --message my.pkg.Message --body '{"key": "value"}'
    /// ```
    Encode {
        /// Path to the descriptor set (.bin)
        #[arg(long)]
        file_descriptor_set: PathBuf,

        /// Fully qualified message name (e.g. my.package.Message)
        #[arg(long)]
        message: String,

        /// JSON object to decode
        #[arg(long, value_parser = parse_body)]
        body: serde_json::Value,

        /// Write 64-bit integers as numbers and sort keys, for legacy consumers
        #[arg(long)]
        legacy: bool,
    },

    /// Check whether a JSON key would be matched to a field name
    MatchName {
        /// Key as it appears in the JSON payload (e.g. UserID)
        key: String,
        /// Field name declared by the schema (e.g. user_id)
        field: String,
    },

    /// Normalize an error text into a reason-coded error
    Normalize {
        /// The error text, as received from a downstream call
        #[arg(value_parser = parse_text)]
        text: String,
    },
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    let body: serde_json::Value =
        serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))?;

    if !body.is_object() {
        return Err("Body must be a JSON object".to_string());
    }

    Ok(body)
}

fn parse_text(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("Error text cannot be empty".to_string());
    }
    Ok(value.to_string())
}
