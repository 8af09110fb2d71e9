use colored::*;
use reasonjson_core::{errors::ReasonError, json::CodecError, prost_reflect};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct GenericError<T: Display>(pub &'static str, pub T);

/// The verdict of the field-name matcher for a key and a field.
pub struct NameMatch<'a> {
    pub key: &'a str,
    pub field: &'a str,
    pub matched: bool,
}

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<ReasonError> for FormattedString {
    fn from(err: ReasonError) -> Self {
        let reason = if err.is_unknown() {
            err.reason().yellow().bold()
        } else {
            err.reason().green().bold()
        };

        let mut out = format!("{} {}\n", "Reason:".bold(), reason);
        out.push_str(&format!("{} {}\n", "Message:".bold(), err.message()));
        out.push_str(&format!("{} {}", "Continue:".bold(), err.is_continue()));

        if !err.metadata().is_empty() {
            out.push_str(&format!("\n{}", "Metadata:".bold()));
            for (key, value) in err.metadata() {
                out.push_str(&format!("\n  - {}: {}", key.cyan(), value));
            }
        }

        FormattedString(out)
    }
}

impl From<NameMatch<'_>> for FormattedString {
    fn from(NameMatch { key, field, matched }: NameMatch<'_>) -> Self {
        let verdict = if matched {
            "matches".green().bold()
        } else {
            "does not match".red().bold()
        };
        FormattedString(format!("'{}' {} '{}'", key.cyan(), verdict, field.cyan()))
    }
}

impl From<CodecError> for FormattedString {
    fn from(err: CodecError) -> Self {
        let title = if err.is_parse() {
            "Malformed JSON:"
        } else {
            "Decode Failed:"
        };
        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<prost_reflect::DescriptorError> for FormattedString {
    fn from(err: prost_reflect::DescriptorError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to parse file descriptor:".red().bold(),
            err
        ))
    }
}

impl From<std::io::Error> for FormattedString {
    fn from(err: std::io::Error) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to read file:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}
