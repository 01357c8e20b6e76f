//! # Declarative Markup Instantiation Engine
//!
//! Scans an HTML document (or subtree) for elements annotated with a dotted
//! type reference, resolves each reference to a registered class, coerces
//! the element's textual attributes into typed constructor arguments
//! inferred from the class prototype, constructs the object, wires
//! declarative event/script bindings, and runs a deferred startup pass over
//! root instances.
//!
//! ## Pipeline Invariants
//!
//! 1. **Amortized inspection**: class resolution and type-descriptor
//!    construction happen at most once per distinct reference per registry
//!    epoch; the descriptor cache is cleared wholesale when the registry is
//!    bulk-extended.
//! 2. **Independent coercion**: argument coercion for an element never
//!    depends on sibling elements. The only ordering guarantee is
//!    parent-before-child construction, which document order provides.
//! 3. **Coercion never throws**: malformed function bodies become no-ops;
//!    malformed numbers, dates, and object literals become sentinel values.
//! 4. **Two-phase lifecycle**: construct every element in the batch first,
//!    then start only the instances with no discoverable parent. Children
//!    are started transitively by their parents.
//! 5. **Fatal resolution**: an annotation that resolves to nothing aborts
//!    the whole batch; a missing or empty annotation is a silent no-op.

mod coerce;
mod config;
mod document;
mod error;
mod inspect;
mod instance;
mod instantiate;
mod parse;
mod registry;
mod script;
mod value;

pub use coerce::{coerce, coerce_text, CoerceEnv};
pub use config::{ParserConfig, HANDLE_ATTRIBUTE, SCRIPT_TYPE_PREFIX};
pub use document::MarkupDocument;
pub use error::{
    ParserError, ERR_CLASS_RESOLUTION, ERR_DOCUMENT_PARSE, ERR_SCRIPT_COMPILATION,
};
pub use inspect::{DescriptorCache, TypeDescriptor};
pub use instance::Instance;
pub use parse::{LoadKind, LoadQueue, ParseOptions, Parser};
pub use registry::{ClassSpec, ConstructFn, MarkupFactoryFn, Namespace, Registry};
pub use script::{ScriptCompiler, ScriptKind, ScriptRole, ScriptSource, UnsupportedCompiler};
pub use value::{ArgBundle, Callback, Invocation, SemanticType, Value};
