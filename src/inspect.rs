//! Type Inspector.
//!
//! Resolves a dotted class reference and derives a `TypeDescriptor`: the
//! ordered list of markup-settable parameters with their inferred semantic
//! types. Inference reads the shape of each prototype member's current value;
//! names with a leading underscore are private by convention and skipped;
//! the first occurrence of a name wins, so override chains don't double-count.
//!
//! Descriptors are cached per reference. The cache is cleared wholesale
//! whenever the registry epoch moves (a bulk `extend` happened) — coarse
//! invalidation, correctness over precision.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::ParserError;
use crate::registry::{ClassSpec, Registry};
use crate::value::SemanticType;

#[derive(Debug)]
pub struct TypeDescriptor {
    pub spec: Rc<ClassSpec>,
    /// Parameter name → inferred semantic type, in prototype order.
    pub params: Vec<(String, SemanticType)>,
}

impl TypeDescriptor {
    pub fn param_type(&self, name: &str) -> Option<SemanticType> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }
}

#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RefCell<HashMap<String, Rc<TypeDescriptor>>>,
    epoch: Cell<u64>,
    builds: Cell<u64>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        DescriptorCache::default()
    }

    /// How many descriptors have been built since creation. One build per
    /// distinct reference per registry epoch, however many elements share
    /// the class.
    pub fn build_count(&self) -> u64 {
        self.builds.get()
    }

    pub fn describe_class(
        &self,
        registry: &Registry,
        reference: &str,
    ) -> Result<Rc<TypeDescriptor>, ParserError> {
        if self.epoch.get() != registry.epoch() {
            self.entries.borrow_mut().clear();
            self.epoch.set(registry.epoch());
        }

        if let Some(descriptor) = self.entries.borrow().get(reference) {
            return Ok(descriptor.clone());
        }

        let spec = registry
            .get_class(reference)
            .ok_or_else(|| ParserError::class_resolution(reference))?;

        self.builds.set(self.builds.get() + 1);
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        for (name, default) in spec.prototype() {
            if name.starts_with('_') {
                continue;
            }
            if !seen.insert(name.as_str()) {
                continue;
            }
            params.push((name.clone(), default.semantic_type()));
        }

        let descriptor = Rc::new(TypeDescriptor { spec, params });
        self.entries
            .borrow_mut()
            .insert(reference.to_string(), descriptor.clone());
        Ok(descriptor)
    }
}
