//! Constructed object model.
//!
//! An `Instance` is a cheaply cloneable handle to the object built from one
//! annotated element: a field map seeded from the class prototype and
//! overlaid with the coerced argument bundle, plus event-handler lists, a
//! weak link to the nearest annotated ancestor's instance, and a one-shot
//! startup lifecycle flag.
//!
//! Invocation discipline: `emit` and `startup` clone the callbacks out of the
//! cell before calling them, so a handler may freely read or mutate the
//! instance it fires on.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::value::{ArgBundle, Callback, Invocation, Value};

#[derive(Debug)]
struct InstanceData {
    class: String,
    fields: HashMap<String, Value>,
    handlers: HashMap<String, Vec<Callback>>,
    startup: Option<Callback>,
    started: bool,
    parent: Option<Weak<RefCell<InstanceData>>>,
}

/// Handle to a constructed instance. Clones share the same underlying object.
#[derive(Debug, Clone)]
pub struct Instance(Rc<RefCell<InstanceData>>);

impl Instance {
    pub fn new(class: &str, fields: ArgBundle, startup: Option<Callback>) -> Self {
        Instance(Rc::new(RefCell::new(InstanceData {
            class: class.to_string(),
            fields,
            handlers: HashMap::new(),
            startup,
            started: false,
            parent: None,
        })))
    }

    pub fn class_name(&self) -> String {
        self.0.borrow().class.clone()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().fields.get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.0.borrow_mut().fields.insert(name.to_string(), value);
    }

    /// Wire a handler to fire whenever `event` is emitted on this instance.
    /// Handlers fire in connection order, after the named function field.
    pub fn connect(&self, event: &str, callback: Callback) {
        self.0
            .borrow_mut()
            .handlers
            .entry(event.to_string())
            .or_default()
            .push(callback);
    }

    /// Fire `event`: the function-typed field of the same name first (when
    /// present), then every connected handler, each with this instance as
    /// receiver.
    pub fn emit(&self, event: &str, args: Vec<Value>) {
        let callbacks: Vec<Callback> = {
            let data = self.0.borrow();
            let mut out = Vec::new();
            if let Some(Value::Function(cb)) = data.fields.get(event) {
                out.push(cb.clone());
            }
            if let Some(connected) = data.handlers.get(event) {
                out.extend(connected.iter().cloned());
            }
            out
        };
        for cb in callbacks {
            cb.call(&Invocation::on(self.clone(), args.clone()));
        }
    }

    /// Whether the class registered a startup lifecycle hook for this
    /// instance.
    pub fn has_startup(&self) -> bool {
        self.0.borrow().startup.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.0.borrow().started
    }

    /// Run the startup hook once. Re-entry and repeat calls are no-ops.
    pub fn startup(&self) {
        let hook = {
            let mut data = self.0.borrow_mut();
            if data.started || data.startup.is_none() {
                return;
            }
            data.started = true;
            data.startup.clone()
        };
        if let Some(cb) = hook {
            cb.call(&Invocation::on(self.clone(), vec![]));
        }
    }

    pub fn set_parent(&self, parent: &Instance) {
        self.0.borrow_mut().parent = Some(Rc::downgrade(&parent.0));
    }

    pub fn parent(&self) -> Option<Instance> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(|w| w.upgrade())
            .map(Instance)
    }

    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter_callback(hits: &Rc<Cell<u32>>) -> Callback {
        let h = hits.clone();
        Callback::new(move |_| h.set(h.get() + 1))
    }

    #[test]
    fn test_emit_fires_field_then_handlers() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let inst = Instance::new("pkg.Widget", ArgBundle::new(), None);

        let o = order.clone();
        inst.set(
            "onClick",
            Value::Function(Callback::new(move |_| o.borrow_mut().push("field"))),
        );
        let o = order.clone();
        inst.connect("onClick", Callback::new(move |_| o.borrow_mut().push("handler")));

        inst.emit("onClick", vec![]);
        assert_eq!(*order.borrow(), vec!["field", "handler"]);
    }

    #[test]
    fn test_emit_passes_receiver() {
        let inst = Instance::new("pkg.Widget", ArgBundle::new(), None);
        let seen = Rc::new(Cell::new(false));
        let s = seen.clone();
        let probe = inst.clone();
        inst.connect(
            "onChange",
            Callback::new(move |inv| {
                s.set(inv.receiver.as_ref().map(|r| r.ptr_eq(&probe)) == Some(true));
            }),
        );
        inst.emit("onChange", vec![]);
        assert!(seen.get());
    }

    #[test]
    fn test_startup_runs_once() {
        let hits = Rc::new(Cell::new(0u32));
        let inst = Instance::new("pkg.Widget", ArgBundle::new(), Some(counter_callback(&hits)));
        assert!(inst.has_startup());
        assert!(!inst.is_started());
        inst.startup();
        inst.startup();
        assert!(inst.is_started());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_startup_without_hook_is_noop() {
        let inst = Instance::new("pkg.Widget", ArgBundle::new(), None);
        inst.startup();
        assert!(!inst.is_started());
    }

    #[test]
    fn test_parent_link() {
        let parent = Instance::new("pkg.Outer", ArgBundle::new(), None);
        let child = Instance::new("pkg.Inner", ArgBundle::new(), None);
        assert!(!child.has_parent());
        child.set_parent(&parent);
        assert!(child.has_parent());
        assert!(child.parent().unwrap().ptr_eq(&parent));
    }
}
