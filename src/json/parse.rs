//! Purpose: Decode JSON text and classify parse failures.
//! Exports: `from_str`, `from_str_typed`, `ParseFailureCategory`, `categorize_error`,
//!   `categorize_message`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Parse failures surface as `ErrorKind::Parse`; decoder failures carry the serde_json source.
//! Invariants: Integers outside `i64` are rejected, never rounded to floats.
//! Invariants: Hints name the category and caller context, never the payload.

use serde::de::DeserializeOwned;

use crate::core::error::{Error, ErrorKind};
use crate::core::value::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseFailureCategory {
    Syntax,
    /// Well-formed JSON that does not fit the requested Rust type.
    Data,
    Eof,
    Io,
    /// A number outside the range a `Value` can hold exactly.
    NumericRange,
    DepthLimit,
    Unknown,
}

impl ParseFailureCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Data => "data",
            Self::Eof => "eof",
            Self::Io => "io",
            Self::NumericRange => "numeric-range",
            Self::DepthLimit => "depth-limit",
            Self::Unknown => "unknown",
        }
    }
}

/// Parses JSON text into a dynamic value.
/// Integers beyond the signed 64-bit range are rejected rather than rounded to floats.
pub fn from_str(input: &str) -> Result<Value, Error> {
    let context = "json value";
    let parsed: serde_json::Value = decode(input, context)?;
    if has_wide_integer(&parsed) {
        let category = ParseFailureCategory::NumericRange;
        tracing::debug!(category = category.label(), context, "json parse failed");
        return Err(Error::new(ErrorKind::Parse)
            .with_message(format!("invalid {context}: integer does not fit in 64 signed bits"))
            .with_hint(hint_for_category(category, context)));
    }
    Ok(Value::from_json(&parsed))
}

fn has_wide_integer(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => n.is_u64() && n.as_i64().is_none(),
        serde_json::Value::Array(items) => items.iter().any(has_wide_integer),
        serde_json::Value::Object(map) => map.values().any(has_wide_integer),
        _ => false,
    }
}

/// Parses JSON text straight into a serde type; `context` names the document in hints.
pub fn from_str_typed<T: DeserializeOwned>(input: &str, context: &str) -> Result<T, Error> {
    decode(input, context)
}

fn decode<T: DeserializeOwned>(input: &str, context: &str) -> Result<T, Error> {
    serde_json::from_str(input).map_err(|err| {
        tracing::debug!(category = categorize_error(&err).label(), context, "json parse failed");
        Error::new(ErrorKind::Parse)
            .with_message(format!(
                "invalid {context} at line {} column {}",
                err.line(),
                err.column()
            ))
            .with_hint(hint_for_error(&err, context))
            .with_source(err)
    })
}

pub fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    let sniffed = categorize_message(&err.to_string());
    if matches!(
        sniffed,
        ParseFailureCategory::DepthLimit | ParseFailureCategory::NumericRange
    ) {
        return sniffed;
    }
    match err.classify() {
        serde_json::error::Category::Syntax => ParseFailureCategory::Syntax,
        serde_json::error::Category::Data => ParseFailureCategory::Data,
        serde_json::error::Category::Eof => ParseFailureCategory::Eof,
        serde_json::error::Category::Io => ParseFailureCategory::Io,
    }
}

/// Best-effort classification of a free-form parser message.
pub fn categorize_message(message: &str) -> ParseFailureCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("recursion limit") {
        ParseFailureCategory::DepthLimit
    } else if lower.contains("number out of range") {
        ParseFailureCategory::NumericRange
    } else if lower.contains("eof") || lower.contains("end of input") {
        ParseFailureCategory::Eof
    } else if lower.contains("invalid type") || lower.contains("missing field") {
        ParseFailureCategory::Data
    } else if lower.contains("expected") || lower.contains("trailing") {
        ParseFailureCategory::Syntax
    } else {
        ParseFailureCategory::Unknown
    }
}

pub fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    hint_for_category(categorize_error(err), context)
}

fn hint_for_category(category: ParseFailureCategory, context: &str) -> String {
    let advice = match category {
        ParseFailureCategory::Syntax => "check for stray commas, quotes or brackets",
        ParseFailureCategory::Data => "the document is valid JSON but a value has the wrong type",
        ParseFailureCategory::Eof => "the document ends early; check for truncation",
        ParseFailureCategory::Io => "the input could not be read",
        ParseFailureCategory::NumericRange => "keep integers within the signed 64-bit range",
        ParseFailureCategory::DepthLimit => "reduce nesting depth",
        ParseFailureCategory::Unknown => "inspect the input",
    };
    format!(
        "parse category: {}; context: {context}; {advice}",
        category.label()
    )
}
