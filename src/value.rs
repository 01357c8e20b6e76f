//! Runtime value model.
//!
//! `Value` covers every shape a prototype member or coerced attribute can
//! take. Type inference reads the shape of a prototype member's current
//! value, never a declared type, so the enum doubles as the semantic-type
//! vocabulary of the whole pipeline.
//!
//! Sentinels instead of errors: an unparseable number is `f64::NAN`, an
//! unparseable date is `Value::Date(None)`. Coercion keeps the batch moving.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::instance::Instance;

/// Semantic type of a constructor parameter, inferred from the prototype
/// member's runtime shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticType {
    String,
    Number,
    Boolean,
    Function,
    Array,
    Date,
    Url,
    Object,
}

/// Arguments handed to a callback: an optional instance receiver plus
/// positional values. Positional `args` names from a script node bind to
/// these by index.
pub struct Invocation {
    pub receiver: Option<Instance>,
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn bare() -> Self {
        Invocation {
            receiver: None,
            args: vec![],
        }
    }

    pub fn on(receiver: Instance, args: Vec<Value>) -> Self {
        Invocation {
            receiver: Some(receiver),
            args,
        }
    }
}

/// A cloneable handle to an invocable function. Execution is synchronous and
/// single-threaded, so `Rc` is the right ownership model.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Invocation)>);

impl Callback {
    pub fn new<F: Fn(&Invocation) + 'static>(f: F) -> Self {
        Callback(Rc::new(f))
    }

    /// Harmless do-nothing callback, the fallback for every swallowed
    /// function-coercion failure.
    pub fn noop() -> Self {
        Callback(Rc::new(|_| {}))
    }

    pub fn call(&self, invocation: &Invocation) {
        (self.0)(invocation)
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(<fn>)")
    }
}

/// A typed runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    String(String),
    Number(f64),
    Boolean(bool),
    Function(Callback),
    Array(Vec<String>),
    /// `None` is the invalid-date sentinel.
    Date(Option<DateTime<Utc>>),
    Url(String),
    Object(serde_json::Value),
}

impl Value {
    /// Shape-based type inference, precedence: string → number → boolean →
    /// function → array → date → url → else object.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Value::String(_) => SemanticType::String,
            Value::Number(_) => SemanticType::Number,
            Value::Boolean(_) => SemanticType::Boolean,
            Value::Function(_) => SemanticType::Function,
            Value::Array(_) => SemanticType::Array,
            Value::Date(_) => SemanticType::Date,
            Value::Url(_) => SemanticType::Url,
            Value::Object(_) | Value::Null => SemanticType::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callback> {
        match self {
            Value::Function(cb) => Some(cb),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Url(a), Value::Url(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Coerced constructor arguments for one element. Built fresh per
/// instantiation, never persisted past the call.
pub type ArgBundle = HashMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_semantic_type_inference() {
        assert_eq!(
            Value::String("".into()).semantic_type(),
            SemanticType::String
        );
        assert_eq!(Value::Number(0.0).semantic_type(), SemanticType::Number);
        assert_eq!(
            Value::Boolean(false).semantic_type(),
            SemanticType::Boolean
        );
        assert_eq!(
            Value::Function(Callback::noop()).semantic_type(),
            SemanticType::Function
        );
        assert_eq!(Value::Array(vec![]).semantic_type(), SemanticType::Array);
        assert_eq!(Value::Date(None).semantic_type(), SemanticType::Date);
        assert_eq!(Value::Url("".into()).semantic_type(), SemanticType::Url);
        assert_eq!(
            Value::Object(serde_json::json!({})).semantic_type(),
            SemanticType::Object
        );
        assert_eq!(Value::Null.semantic_type(), SemanticType::Object);
    }

    #[test]
    fn test_callback_invocation() {
        let hits = Rc::new(Cell::new(0u32));
        let h = hits.clone();
        let cb = Callback::new(move |inv| {
            h.set(h.get() + inv.args.len() as u32 + 1);
        });
        cb.call(&Invocation::bare());
        cb.call(&Invocation {
            receiver: None,
            args: vec![Value::Number(1.0)],
        });
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_noop_is_callable() {
        Callback::noop().call(&Invocation::bare());
    }
}
