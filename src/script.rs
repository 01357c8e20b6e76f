//! Declarative script children and the script-compiler seam.
//!
//! A script child is a direct `<script>` child of an annotated element whose
//! `type` attribute carries the reserved prefix plus a sub-kind, e.g.
//! `dojo/connect` or `dojo/method`. The node contributes:
//! - `event`  — event name the handler attaches to (or method name to merge)
//! - `args`   — comma-separated parameter names bound positionally from the
//!   invocation arguments, by index
//! - `with`   — comma-separated scope-injection targets, applied
//!   outer-to-inner in listed order
//! - text content — the function body
//!
//! Turning body text into an invocable function needs a host evaluator,
//! which this crate cannot assume. `ScriptCompiler` is the pluggable seam: a
//! host with an expression evaluator or safe-subset interpreter implements
//! it; the shipped `UnsupportedCompiler` rejects with a clear error instead
//! of silently handing back a no-op.

use markup5ever_rcdom::Handle;

use crate::document;
use crate::error::ParserError;
use crate::value::Callback;

const CONNECT_KIND: &str = "connect";

/// Sub-kind after the reserved `type` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Connect,
    Other,
}

/// How a script child participates in instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptRole {
    /// `connect` kind with an event: deferred event connection.
    Connect,
    /// Non-connect kind with an event: merged into the argument bundle as a
    /// named callback property.
    NamedProperty,
    /// No event: invoked once after construction with the instance as
    /// receiver.
    PlainCallback,
}

#[derive(Debug, Clone)]
pub struct ScriptSource {
    pub kind: ScriptKind,
    pub event: Option<String>,
    pub args: Vec<String>,
    pub with_targets: Vec<String>,
    pub body: String,
}

impl ScriptSource {
    /// Read a script node. `None` when the `type` attribute does not carry
    /// the reserved prefix.
    pub fn from_node(node: &Handle, type_prefix: &str) -> Option<Self> {
        let script_type = document::attr(node, "type")?;
        let sub_kind = script_type.strip_prefix(type_prefix)?;
        let kind = if sub_kind == CONNECT_KIND {
            ScriptKind::Connect
        } else {
            ScriptKind::Other
        };
        let event = document::attr(node, "event").filter(|e| !e.is_empty());
        Some(ScriptSource {
            kind,
            event,
            args: split_names(document::attr(node, "args").as_deref()),
            with_targets: split_names(document::attr(node, "with").as_deref()),
            body: document::text_content(node),
        })
    }

    /// A bare function body with no bindings, the shape the function-coercion
    /// path hands to the compiler.
    pub fn body_only(body: &str) -> Self {
        ScriptSource {
            kind: ScriptKind::Other,
            event: None,
            args: vec![],
            with_targets: vec![],
            body: body.to_string(),
        }
    }

    pub fn classify(&self) -> ScriptRole {
        match (self.kind, &self.event) {
            (ScriptKind::Connect, Some(_)) => ScriptRole::Connect,
            (_, Some(_)) => ScriptRole::NamedProperty,
            (_, None) => ScriptRole::PlainCallback,
        }
    }
}

fn split_names(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => vec![],
        Some(s) if s.trim().is_empty() => vec![],
        Some(s) => s.split(',').map(|n| n.trim().to_string()).collect(),
    }
}

/// Text-and-bindings in, callable out.
pub trait ScriptCompiler {
    fn compile(&self, source: &ScriptSource) -> Result<Callback, ParserError>;
}

/// Default compiler for hosts without dynamic evaluation. Always rejects, so
/// the divergence is visible instead of silently swallowed.
pub struct UnsupportedCompiler;

impl ScriptCompiler for UnsupportedCompiler {
    fn compile(&self, _source: &ScriptSource) -> Result<Callback, ParserError> {
        Err(ParserError::script_compilation(
            "dynamic script compilation is unavailable in this host",
        ))
    }
}
