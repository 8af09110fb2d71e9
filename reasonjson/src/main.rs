//! # Reasonjson CLI Entry Point
//!
//! The main executable for the reasonjson tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`].
//! 2. **Execution**: Delegates to the codec, the field-name matcher or the error normalizer in `reasonjson_core`.
//! 3. **Presentation**: Formats and prints the result to standard output, or the failure to standard error.

mod cli;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands};
use formatter::{FormattedString, GenericError, NameMatch};
use reasonjson_core::{
    errors,
    json::{JsonCodec, names},
    prost_reflect::{DescriptorPool, DynamicMessage},
};
use std::{io, path::Path, process};

fn main() {
    let args = Cli::parse();

    match args.command {
        Commands::Encode {
            file_descriptor_set,
            message,
            body,
            legacy,
        } => run_encode(&file_descriptor_set, &message, &body, legacy),
        Commands::MatchName { key, field } => {
            let matched = names::matches(&key, &field);
            println!(
                "{}",
                FormattedString::from(NameMatch {
                    key: &key,
                    field: &field,
                    matched,
                })
            );
        }
        Commands::Normalize { text } => {
            let err = io::Error::other(text);
            println!("{}", FormattedString::from(errors::parse(&err)));
        }
    }
}

fn run_encode(path: &Path, message: &str, body: &serde_json::Value, legacy: bool) {
    let file_descriptor_set = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    match encode(&file_descriptor_set, message, body, legacy) {
        Ok(text) => println!("{}", FormattedString(text)),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

/// Decodes `body` into `message` from the given descriptor set and re-encodes it.
fn encode(
    file_descriptor_set: &[u8],
    message: &str,
    body: &serde_json::Value,
    legacy: bool,
) -> Result<String, FormattedString> {
    let pool = DescriptorPool::decode(file_descriptor_set)?;
    let descriptor = pool
        .get_message_by_name(message)
        .ok_or_else(|| GenericError("Message not found in descriptor set", message.to_string()))?;

    let codec = if legacy {
        JsonCodec::legacy()
    } else {
        JsonCodec::default()
    };

    let mut target = DynamicMessage::new(descriptor);
    codec.unmarshal_message(body.to_string().as_bytes(), &mut target)?;
    let bytes = codec.marshal_dynamic(&target)?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
