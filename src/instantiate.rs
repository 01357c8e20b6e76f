//! Markup Instantiator — the per-element pipeline.
//!
//! For each candidate element: Discover → ResolveClass → BuildArgs →
//! ExtractScripts → Construct → Register → BindEvents, then one deferred
//! batch-level Startup pass over root instances.
//!
//! The two-phase construct-all / start-roots split is load-bearing: startup
//! logic may query the object graph, so every instance in the batch must
//! exist before any startup hook runs. Children are started transitively by
//! their parent's own startup logic, never by this pass.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::coerce::{coerce, CoerceEnv};
use crate::config::{ParserConfig, HANDLE_ATTRIBUTE, SCRIPT_TYPE_PREFIX};
use crate::document;
use crate::error::ParserError;
use crate::inspect::DescriptorCache;
use crate::instance::Instance;
use crate::parse::ParseOptions;
use crate::registry::{ClassSpec, Namespace, Registry};
use crate::script::{ScriptCompiler, ScriptRole, ScriptSource};
use crate::value::{ArgBundle, Callback, Invocation, Value};

pub(crate) struct Instantiator<'a> {
    pub registry: &'a Rc<RefCell<Registry>>,
    pub cache: &'a DescriptorCache,
    pub compiler: &'a dyn ScriptCompiler,
    pub config: &'a ParserConfig,
}

impl<'a> Instantiator<'a> {
    /// Instantiate every annotated node in `nodes` (document order), then
    /// start the roots unless the batch opted out.
    pub fn run(
        &self,
        nodes: &[Handle],
        overrides: Option<&ArgBundle>,
        options: &ParseOptions,
    ) -> Result<Vec<Instance>, ParserError> {
        let type_attribute = options
            .type_attribute
            .clone()
            .unwrap_or_else(|| self.config.type_attribute());

        let mut constructed: HashMap<usize, Instance> = HashMap::new();
        let mut batch = Vec::new();

        for node in nodes {
            // Discover: no or empty annotation is a valid no-op.
            let annotation = match document::attr(node, &type_attribute) {
                Some(a) if !a.is_empty() => a,
                _ => continue,
            };

            let instance = self.instantiate_element(node, &annotation, overrides)?;

            // Nearest annotated ancestor already constructed in this batch
            // becomes the discoverable parent. Document order guarantees it
            // exists by now.
            for ancestor in document::ancestors(node) {
                if let Some(parent) = constructed.get(&document::node_key(&ancestor)) {
                    instance.set_parent(parent);
                    break;
                }
            }

            constructed.insert(document::node_key(node), instance.clone());
            batch.push(instance);
        }

        // Deferred startup: roots only, and only when the caller neither
        // marked the batch already-started nor asked for no-start.
        if !options.no_start && !options.already_started {
            for instance in &batch {
                if instance.has_startup() && !instance.is_started() && !instance.has_parent() {
                    instance.startup();
                }
            }
        }

        Ok(batch)
    }

    fn instantiate_element(
        &self,
        node: &Handle,
        annotation: &str,
        overrides: Option<&ArgBundle>,
    ) -> Result<Instance, ParserError> {
        // ResolveClass: a failure here is a caller authoring error and
        // aborts the batch.
        let descriptor = {
            let registry = self.registry.borrow();
            self.cache.describe_class(&registry, annotation)?
        };

        // BuildArgs: coerce each sourced parameter against its inferred type.
        let mut bundle = ArgBundle::new();
        {
            let registry = self.registry.borrow();
            let env = CoerceEnv {
                registry: &registry,
                compiler: self.compiler,
                base_url: &self.config.base_url,
            };
            for (name, semantic) in &descriptor.params {
                if let Some(raw) = self.raw_value(node, name, overrides) {
                    bundle.insert(name.clone(), coerce(raw, *semantic, &env));
                }
            }
        }

        // ExtractScripts: script children are detached from the document
        // whether or not their compilation succeeds.
        let mut connections: Vec<(String, Callback)> = Vec::new();
        let mut immediate: Vec<Callback> = Vec::new();
        if !descriptor.spec.is_no_script() {
            for script_node in document::script_children(node, SCRIPT_TYPE_PREFIX) {
                document::detach(&script_node);
                let source = match ScriptSource::from_node(&script_node, SCRIPT_TYPE_PREFIX) {
                    Some(s) => s,
                    None => continue,
                };
                match source.classify() {
                    ScriptRole::Connect => {
                        let event = source.event.clone().unwrap_or_default();
                        connections.push((event, self.compiler.compile(&source)?));
                    }
                    ScriptRole::NamedProperty => {
                        let name = source.event.clone().unwrap_or_default();
                        bundle.insert(name, Value::Function(self.compiler.compile(&source)?));
                    }
                    ScriptRole::PlainCallback => {
                        immediate.push(self.compiler.compile(&source)?);
                    }
                }
            }
        }

        // Construct.
        let instance = ClassSpec::construct(&descriptor.spec, &bundle, node);

        // Register: bind the global handle, last writer wins.
        if let Some(handle) = document::attr(node, HANDLE_ATTRIBUTE).filter(|h| !h.is_empty()) {
            self.registry
                .borrow_mut()
                .set(&handle, Namespace::Object(instance.clone()));
        }

        // BindEvents: deferred connections first, then one-shot callbacks
        // with the instance as receiver.
        for (event, callback) in connections {
            instance.connect(&event, callback);
        }
        for callback in immediate {
            callback.call(&Invocation::on(instance.clone(), vec![]));
        }

        Ok(instance)
    }

    /// Source a raw parameter value: override map first, then the matching
    /// attribute. `class` reads the element's class-name field and `style`
    /// the inline style text rather than generic attributes.
    fn raw_value(
        &self,
        node: &Handle,
        name: &str,
        overrides: Option<&ArgBundle>,
    ) -> Option<Value> {
        if let Some(map) = overrides {
            if let Some(value) = map.get(name) {
                return Some(value.clone());
            }
        }
        match name {
            "class" => document::attr(node, "class").map(Value::String),
            "style" => document::attr(node, "style").map(Value::String),
            // Compatibility shim: some hosts report `value` as unspecified
            // even when it is present, so it bypasses the presence check and
            // is read directly.
            "value" => document::attr(node, "value").map(Value::String),
            _ => {
                if document::has_attr(node, name) {
                    document::attr(node, name).map(Value::String)
                } else {
                    None
                }
            }
        }
    }
}
