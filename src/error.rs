//! Error taxonomy for the instantiation pipeline.
//!
//! Two failure classes propagate: class-resolution failures (a misspelled or
//! unregistered type reference is a caller authoring error and aborts the
//! batch) and inline-script compilation failures on the script-child path.
//! Everything else — malformed numbers, dates, object literals — degrades to
//! sentinel values and keeps the pipeline moving.

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_CLASS_RESOLUTION: &str = "ERR_CLASS_RESOLUTION";
pub const ERR_SCRIPT_COMPILATION: &str = "ERR_SCRIPT_COMPILATION";
pub const ERR_DOCUMENT_PARSE: &str = "ERR_DOCUMENT_PARSE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserError {
    pub code: String,
    pub message: String,
    pub hints: Vec<String>,
}

impl ParserError {
    pub fn new(code: &str, message: &str) -> Self {
        Self::with_hints(code, message, vec![])
    }

    pub fn with_hints(code: &str, message: &str, hints: Vec<String>) -> Self {
        ParserError {
            code: code.to_string(),
            message: message.to_string(),
            hints,
        }
    }

    /// A type annotation resolved to nothing, or to something that is not a
    /// registered constructible class. The message names the offending
    /// reference so the author can find it in the markup.
    pub fn class_resolution(reference: &str) -> Self {
        Self::with_hints(
            ERR_CLASS_RESOLUTION,
            &format!(
                "Could not resolve '{}' to a constructible class.",
                reference
            ),
            vec![
                "Check the spelling of the type annotation.".to_string(),
                "Use the full dotted path the class was registered under.".to_string(),
            ],
        )
    }

    pub fn script_compilation(detail: &str) -> Self {
        Self::new(
            ERR_SCRIPT_COMPILATION,
            &format!("Failed to compile inline script: {}", detail),
        )
    }

    pub fn document_parse(detail: &str) -> Self {
        Self::new(
            ERR_DOCUMENT_PARSE,
            &format!("Failed to parse HTML: {}", detail),
        )
    }

    pub fn is_class_resolution(&self) -> bool {
        self.code == ERR_CLASS_RESOLUTION
    }

    pub fn is_script_compilation(&self) -> bool {
        self.code == ERR_SCRIPT_COMPILATION
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ParserError {}
