//! Parse entry point.
//!
//! `Parser` owns the injected collaborators (registry, config, script
//! compiler, descriptor cache) and exposes the two public operations:
//! `parse` scans a document or subtree for annotated elements and hands them
//! to the instantiator; `instantiate` runs the same pipeline over a
//! pre-selected node list with an optional property override map.
//!
//! The parse-on-load trigger is an explicit registration into the host's
//! load sequence. When an accessibility-initialization callback is already
//! queued, the auto-parse lands right after it; otherwise it goes to the
//! front. Once the queue starts draining, callbacks are not cancellable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::config::ParserConfig;
use crate::document::MarkupDocument;
use crate::error::ParserError;
use crate::inspect::DescriptorCache;
use crate::instance::Instance;
use crate::instantiate::Instantiator;
use crate::registry::Registry;
use crate::script::{ScriptCompiler, UnsupportedCompiler};
use crate::value::ArgBundle;

#[derive(Default, Clone)]
pub struct ParseOptions {
    /// Scan root; the whole document when absent.
    pub root: Option<Handle>,
    /// Construct but never start.
    pub no_start: bool,
    /// The batch is managed by an outer lifecycle that already ran startup.
    pub already_started: bool,
    /// Per-call override of the type-annotation attribute name.
    pub type_attribute: Option<String>,
}

impl ParseOptions {
    pub fn rooted(root: Handle) -> Self {
        ParseOptions {
            root: Some(root),
            ..Default::default()
        }
    }
}

pub struct Parser {
    registry: Rc<RefCell<Registry>>,
    config: ParserConfig,
    compiler: Rc<dyn ScriptCompiler>,
    cache: DescriptorCache,
    on_load_registered: Cell<bool>,
}

impl Parser {
    pub fn new(registry: Rc<RefCell<Registry>>, config: ParserConfig) -> Self {
        Parser {
            registry,
            config,
            compiler: Rc::new(UnsupportedCompiler),
            cache: DescriptorCache::new(),
            on_load_registered: Cell::new(false),
        }
    }

    /// Swap in a host-provided script compiler.
    pub fn with_compiler(mut self, compiler: Rc<dyn ScriptCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn registry(&self) -> &Rc<RefCell<Registry>> {
        &self.registry
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Descriptor builds so far — one per distinct class reference per
    /// registry epoch.
    pub fn descriptor_builds(&self) -> u64 {
        self.cache.build_count()
    }

    /// Scan for annotated elements and instantiate them in document order.
    pub fn parse(
        &self,
        doc: &MarkupDocument,
        options: Option<ParseOptions>,
    ) -> Result<Vec<Instance>, ParserError> {
        let options = options.unwrap_or_default();
        let attribute = options
            .type_attribute
            .clone()
            .unwrap_or_else(|| self.config.type_attribute());
        let nodes = doc.scan(options.root.as_ref(), &attribute);
        self.instantiate(&nodes, None, &options)
    }

    /// Run the pipeline over a pre-selected node list. `overrides` supplies
    /// programmatic property values consulted before DOM attributes; typed
    /// values pass through coercion untouched.
    pub fn instantiate(
        &self,
        nodes: &[Handle],
        overrides: Option<&ArgBundle>,
        options: &ParseOptions,
    ) -> Result<Vec<Instance>, ParserError> {
        Instantiator {
            registry: &self.registry,
            cache: &self.cache,
            compiler: self.compiler.as_ref(),
            config: &self.config,
        }
        .run(nodes, overrides, options)
    }

    /// Register the one-time auto-parse callback into the host load
    /// sequence, honoring the parse-on-load configuration flag. Repeat
    /// registrations are no-ops.
    pub fn register_on_load(parser: &Rc<Parser>, queue: &mut LoadQueue, doc: Rc<MarkupDocument>) {
        if !parser.config.parse_on_load || parser.on_load_registered.get() {
            return;
        }
        parser.on_load_registered.set(true);
        let p = Rc::clone(parser);
        queue.insert_parse_callback(Box::new(move || p.parse(&doc, None).map(|_| ())));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST LOAD SEQUENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// What a queued load callback is for. Accessibility initialization must
/// always precede automatic parsing, so insertion looks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Accessibility,
    ParseOnLoad,
    Other,
}

type LoadCallback = Box<dyn FnOnce() -> Result<(), ParserError>>;

/// One-shot callbacks the host runs once its load sequence begins draining.
#[derive(Default)]
pub struct LoadQueue {
    entries: Vec<(LoadKind, LoadCallback)>,
}

impl LoadQueue {
    pub fn new() -> Self {
        LoadQueue::default()
    }

    pub fn push(&mut self, kind: LoadKind, callback: LoadCallback) {
        self.entries.push((kind, callback));
    }

    /// Registered kinds in execution order.
    pub fn kinds(&self) -> Vec<LoadKind> {
        self.entries.iter().map(|(kind, _)| *kind).collect()
    }

    /// Auto-parse goes right after the accessibility callback when one is
    /// queued, else to the front.
    fn insert_parse_callback(&mut self, callback: LoadCallback) {
        let position = self
            .entries
            .iter()
            .position(|(kind, _)| *kind == LoadKind::Accessibility)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.entries
            .insert(position, (LoadKind::ParseOnLoad, callback));
    }

    /// Fire every callback once, in order. Stops at the first error; fired
    /// callbacks stay fired.
    pub fn drain(&mut self) -> Result<(), ParserError> {
        for (_, callback) in self.entries.drain(..) {
            callback()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClassSpec;
    use crate::value::Value;

    fn parser_with_widget(parse_on_load: bool) -> Rc<Parser> {
        let mut registry = Registry::new();
        registry.register_class(ClassSpec::new("pkg.Widget").member("label", Value::String(String::new())));
        let config = ParserConfig {
            parse_on_load,
            ..Default::default()
        };
        Rc::new(Parser::new(Rc::new(RefCell::new(registry)), config))
    }

    #[test]
    fn test_on_load_after_accessibility() {
        let parser = parser_with_widget(true);
        let doc = Rc::new(MarkupDocument::from_html("<div></div>").unwrap());
        let mut queue = LoadQueue::new();
        queue.push(LoadKind::Accessibility, Box::new(|| Ok(())));
        queue.push(LoadKind::Other, Box::new(|| Ok(())));
        Parser::register_on_load(&parser, &mut queue, doc);
        assert_eq!(
            queue.kinds(),
            vec![LoadKind::Accessibility, LoadKind::ParseOnLoad, LoadKind::Other]
        );
    }

    #[test]
    fn test_on_load_front_without_accessibility() {
        let parser = parser_with_widget(true);
        let doc = Rc::new(MarkupDocument::from_html("<div></div>").unwrap());
        let mut queue = LoadQueue::new();
        queue.push(LoadKind::Other, Box::new(|| Ok(())));
        Parser::register_on_load(&parser, &mut queue, doc);
        assert_eq!(queue.kinds(), vec![LoadKind::ParseOnLoad, LoadKind::Other]);
    }

    #[test]
    fn test_on_load_respects_flag_and_registers_once() {
        let parser = parser_with_widget(false);
        let doc = Rc::new(MarkupDocument::from_html("<div></div>").unwrap());
        let mut queue = LoadQueue::new();
        Parser::register_on_load(&parser, &mut queue, doc.clone());
        assert!(queue.kinds().is_empty());

        let parser = parser_with_widget(true);
        Parser::register_on_load(&parser, &mut queue, doc.clone());
        Parser::register_on_load(&parser, &mut queue, doc);
        assert_eq!(queue.kinds(), vec![LoadKind::ParseOnLoad]);
    }

    #[test]
    fn test_drain_triggers_full_document_parse() {
        let parser = parser_with_widget(true);
        let doc = Rc::new(
            MarkupDocument::from_html(r#"<div dojoType="pkg.Widget" jsId="auto"></div>"#).unwrap(),
        );
        let mut queue = LoadQueue::new();
        Parser::register_on_load(&parser, &mut queue, doc);
        queue.drain().unwrap();
        assert!(parser.registry().borrow().get_object("auto").is_some());
    }
}
