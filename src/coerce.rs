//! Value Coercer.
//!
//! Converts a textual attribute value into a typed value according to the
//! inferred semantic type. A pre-supplied programmatic value passes through
//! unchanged; the inferred type only governs text.
//!
//! Coercion never fails. Function bodies that refuse to compile become
//! harmless no-ops; unparseable numbers and dates become sentinel values
//! (`NaN`, invalid date) that propagate instead of aborting the element.

use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::registry::Registry;
use crate::script::{ScriptCompiler, ScriptSource};
use crate::value::{Callback, SemanticType, Value};

lazy_static! {
    /// A bare reference is only word characters and dots: resolved as a
    /// named function instead of compiled as a body.
    static ref BARE_REFERENCE_RE: Regex = Regex::new(r"^[\w.]+$").unwrap();
}

/// Collaborators the coercion rules reach for: the namespace for bare
/// function references, the compiler for function bodies, the base URL for
/// the url rule.
pub struct CoerceEnv<'a> {
    pub registry: &'a Registry,
    pub compiler: &'a dyn ScriptCompiler,
    pub base_url: &'a str,
}

/// Coerce a raw value against an inferred type. Non-textual values pass
/// through untouched.
pub fn coerce(raw: Value, semantic: SemanticType, env: &CoerceEnv) -> Value {
    match raw {
        Value::String(text) => coerce_text(&text, semantic, env),
        other => other,
    }
}

pub fn coerce_text(raw: &str, semantic: SemanticType, env: &CoerceEnv) -> Value {
    match semantic {
        SemanticType::String => Value::String(raw.to_string()),
        SemanticType::Number => Value::Number(parse_number(raw)),
        // Anything that is not a case-insensitive "false" is true — the
        // empty string included.
        SemanticType::Boolean => Value::Boolean(!raw.eq_ignore_ascii_case("false")),
        SemanticType::Function => Value::Function(resolve_function(raw, env)),
        SemanticType::Array => Value::Array(split_list(raw)),
        SemanticType::Date => Value::Date(parse_date(raw)),
        SemanticType::Url => Value::Url(format!("{}{}", env.base_url, raw)),
        SemanticType::Object => parse_object(raw),
    }
}

fn parse_number(raw: &str) -> f64 {
    if raw.is_empty() {
        return f64::NAN;
    }
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![];
    }
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if raw == "now" {
        return Some(Utc::now());
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    // Date-only ISO form.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_object(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(literal) => Value::Object(literal),
        Err(_) => Value::Null,
    }
}

/// Function coercion never errors: a bare reference that resolves to nothing
/// and a body that refuses to compile both fall back to a no-op.
fn resolve_function(raw: &str, env: &CoerceEnv) -> Callback {
    if BARE_REFERENCE_RE.is_match(raw) {
        return env.registry.get_function(raw).unwrap_or_else(Callback::noop);
    }
    env.compiler
        .compile(&ScriptSource::body_only(raw))
        .unwrap_or_else(|_| Callback::noop())
}
