//! Class registry collaborator.
//!
//! A process-wide namespace mapping dotted paths to registered entries:
//! constructible classes, named functions, and instance handles bound under
//! `jsId`. Injected as a dependency rather than a true global so tests can
//! build isolated namespaces.
//!
//! Collision policy is last-write-wins, with no transactional semantics.
//! `extend` is the bulk-merge operation and the sole cache-invalidation
//! signal for type descriptors: every call bumps the epoch. Plain `set` does
//! not.
//!
//! `ClassSpec` is the explicit registration schema that stands in for runtime
//! prototype introspection: an ordered member list whose runtime values give
//! type inference its shapes, plus the optional construction and lifecycle
//! capabilities an element pipeline probes for.

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::instance::Instance;
use crate::value::{ArgBundle, Callback, Value};

/// Custom constructor: `(argument bundle, source element)`.
pub type ConstructFn = Rc<dyn Fn(&ArgBundle, &Handle) -> Instance>;

/// Markup-factory constructor: `(argument bundle, source element, class)`.
/// When a class declares one, construction is delegated to it instead of the
/// plain constructor.
pub type MarkupFactoryFn = Rc<dyn Fn(&ArgBundle, &Handle, &Rc<ClassSpec>) -> Instance>;

pub struct ClassSpec {
    name: String,
    /// Ordered prototype members. May contain duplicate names when built
    /// from an override chain; the first occurrence wins downstream.
    prototype: Vec<(String, Value)>,
    constructor: Option<ConstructFn>,
    markup_factory: Option<MarkupFactoryFn>,
    no_script: bool,
    startup: Option<Callback>,
}

impl std::fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassSpec")
            .field("name", &self.name)
            .field("members", &self.prototype.len())
            .field("no_script", &self.no_script)
            .finish()
    }
}

impl ClassSpec {
    pub fn new(name: &str) -> Self {
        ClassSpec {
            name: name.to_string(),
            prototype: Vec::new(),
            constructor: None,
            markup_factory: None,
            no_script: false,
            startup: None,
        }
    }

    pub fn member(mut self, name: &str, default: Value) -> Self {
        self.prototype.push((name.to_string(), default));
        self
    }

    pub fn constructor(mut self, f: ConstructFn) -> Self {
        self.constructor = Some(f);
        self
    }

    pub fn markup_factory(mut self, f: MarkupFactoryFn) -> Self {
        self.markup_factory = Some(f);
        self
    }

    /// Declare that elements of this class never carry inline script
    /// children; extraction and event binding are skipped entirely.
    pub fn no_script(mut self) -> Self {
        self.no_script = true;
        self
    }

    pub fn startup(mut self, hook: Callback) -> Self {
        self.startup = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prototype(&self) -> &[(String, Value)] {
        &self.prototype
    }

    pub fn is_no_script(&self) -> bool {
        self.no_script
    }

    /// Construct an instance from a coerced bundle: markup factory when
    /// declared, else the custom constructor, else the generic field-map
    /// construction.
    pub fn construct(spec: &Rc<ClassSpec>, bundle: &ArgBundle, node: &Handle) -> Instance {
        if let Some(factory) = &spec.markup_factory {
            return factory(bundle, node, spec);
        }
        if let Some(ctor) = &spec.constructor {
            return ctor(bundle, node);
        }
        spec.default_construct(bundle)
    }

    /// Generic construction: prototype defaults (first occurrence wins)
    /// overlaid with the argument bundle.
    pub fn default_construct(&self, bundle: &ArgBundle) -> Instance {
        let mut fields = ArgBundle::new();
        for (name, default) in &self.prototype {
            fields.entry(name.clone()).or_insert_with(|| default.clone());
        }
        for (name, value) in bundle {
            fields.insert(name.clone(), value.clone());
        }
        Instance::new(&self.name, fields, self.startup.clone())
    }
}

/// A value bound at a dotted path in the namespace.
#[derive(Debug, Clone)]
pub enum Namespace {
    Class(Rc<ClassSpec>),
    Function(Callback),
    Object(Instance),
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, Namespace>,
    epoch: u64,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Monotonic counter bumped by every `extend`. Descriptor caches built
    /// under an older epoch are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn get(&self, path: &str) -> Option<&Namespace> {
        self.entries.get(path)
    }

    pub fn get_class(&self, path: &str) -> Option<Rc<ClassSpec>> {
        match self.entries.get(path) {
            Some(Namespace::Class(spec)) => Some(spec.clone()),
            _ => None,
        }
    }

    pub fn get_function(&self, path: &str) -> Option<Callback> {
        match self.entries.get(path) {
            Some(Namespace::Function(cb)) => Some(cb.clone()),
            _ => None,
        }
    }

    pub fn get_object(&self, path: &str) -> Option<Instance> {
        match self.entries.get(path) {
            Some(Namespace::Object(inst)) => Some(inst.clone()),
            _ => None,
        }
    }

    /// Bind a single path. Overwrites silently and does not move the epoch.
    pub fn set(&mut self, path: &str, value: Namespace) {
        self.entries.insert(path.to_string(), value);
    }

    /// Bulk-merge entries and bump the epoch.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, Namespace)>,
    {
        for (path, value) in entries {
            self.entries.insert(path, value);
        }
        self.epoch += 1;
    }

    /// Register a class under its own name via `extend`, so dependent
    /// descriptor caches see the change.
    pub fn register_class(&mut self, spec: ClassSpec) {
        let path = spec.name.clone();
        self.extend([(path, Namespace::Class(Rc::new(spec)))]);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve_class() {
        let mut registry = Registry::new();
        registry.register_class(ClassSpec::new("pkg.Widget").member("label", Value::String(String::new())));
        assert!(registry.contains("pkg.Widget"));
        assert!(registry.get_class("pkg.Widget").is_some());
        assert!(registry.get_class("pkg.Missing").is_none());
        assert!(registry.get_function("pkg.Widget").is_none());
    }

    #[test]
    fn test_extend_bumps_epoch_set_does_not() {
        let mut registry = Registry::new();
        assert_eq!(registry.epoch(), 0);
        registry.set("pkg.fn", Namespace::Function(Callback::noop()));
        assert_eq!(registry.epoch(), 0);
        registry.extend([("pkg.other".to_string(), Namespace::Function(Callback::noop()))]);
        assert_eq!(registry.epoch(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = Registry::new();
        registry.set("pkg.handle", Namespace::Function(Callback::noop()));
        let inst = Instance::new("pkg.Widget", ArgBundle::new(), None);
        registry.set("pkg.handle", Namespace::Object(inst.clone()));
        assert!(registry.get_object("pkg.handle").unwrap().ptr_eq(&inst));
    }

    #[test]
    fn test_default_construct_overlays_bundle() {
        let spec = ClassSpec::new("pkg.Widget")
            .member("label", Value::String("default".into()))
            .member("open", Value::Boolean(false));
        let mut bundle = ArgBundle::new();
        bundle.insert("open".to_string(), Value::Boolean(true));
        let inst = spec.default_construct(&bundle);
        assert_eq!(inst.get("label"), Some(Value::String("default".into())));
        assert_eq!(inst.get("open"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_duplicate_prototype_member_first_wins() {
        let spec = ClassSpec::new("pkg.Widget")
            .member("label", Value::String("base".into()))
            .member("label", Value::String("override".into()));
        let inst = spec.default_construct(&ArgBundle::new());
        assert_eq!(inst.get("label"), Some(Value::String("base".into())));
    }
}
