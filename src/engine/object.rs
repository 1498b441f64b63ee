//! Observable attribute objects.
//!
//! An [`Object`] is a shared bag of named [`Value`]s with explicit
//! per-attribute subscriber lists. Bindings subscribe when they are injected
//! and unsubscribe themselves when they re-evaluate:
//!
//! ```ignore
//! let user = Object::new("User").with("name", "Ada");
//! let id = user.observe("name", |change| println!("{} -> {}", change.old, change.new));
//! user.set("name", "Grace".into())?;   // prints
//! user.set("name", "Grace".into())?;   // equal value, nothing happens
//! user.unobserve("name", id);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::EvalError;
use crate::types::Value;

/// Handle returned by [`Object::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// One attribute mutation, handed to observers after it took effect.
#[derive(Debug, Clone)]
pub struct AttributeChange {
    pub object: Object,
    pub name: String,
    pub old: Value,
    pub new: Value,
}

type Observer = Rc<dyn Fn(&AttributeChange)>;

/// Which attributes an object accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Any attribute may be added.
    Open,
    /// Only attributes declared up front.
    Declared,
    /// Nothing may be assigned.
    Frozen,
}

struct ObjectInner {
    class_name: Rc<str>,
    shape: Shape,
    attrs: RefCell<BTreeMap<String, Value>>,
    observers: RefCell<BTreeMap<String, Vec<(ObserverId, Observer)>>>,
    next_observer: Cell<u64>,
}

/// Shared, observable attribute bag. Clones refer to the same object.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    fn with_shape(class_name: &str, shape: Shape, attrs: BTreeMap<String, Value>) -> Self {
        Self(Rc::new(ObjectInner {
            class_name: Rc::from(class_name),
            shape,
            attrs: RefCell::new(attrs),
            observers: RefCell::new(BTreeMap::new()),
            next_observer: Cell::new(0),
        }))
    }

    /// Object that accepts any attribute.
    pub fn new(class_name: &str) -> Self {
        Self::with_shape(class_name, Shape::Open, BTreeMap::new())
    }

    /// Object restricted to the given attributes and their defaults.
    pub fn declared<I, K>(class_name: &str, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let attrs = attrs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::with_shape(class_name, Shape::Declared, attrs)
    }

    /// Read-only object, used for module namespaces.
    pub fn frozen<I, K>(class_name: &str, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let attrs = attrs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::with_shape(class_name, Shape::Frozen, attrs)
    }

    /// Builder form of an initial assignment. Never notifies.
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.0
            .attrs
            .borrow_mut()
            .insert(name.to_string(), value.into());
        self
    }

    pub fn class_name(&self) -> &str {
        &self.0.class_name
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.attrs.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attrs.borrow().contains_key(name)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.0.attrs.borrow().keys().cloned().collect()
    }

    /// Assign an attribute and notify its observers.
    ///
    /// Returns `Ok(false)` when the new value equals the current one; no
    /// observer runs in that case.
    pub fn set(&self, name: &str, value: Value) -> Result<bool, EvalError> {
        if self.0.shape == Shape::Frozen {
            return Err(EvalError::ReadOnly(name.to_string()));
        }
        let old = {
            let mut attrs = self.0.attrs.borrow_mut();
            match attrs.get_mut(name) {
                Some(slot) => {
                    if *slot == value {
                        return Ok(false);
                    }
                    std::mem::replace(slot, value.clone())
                }
                None if self.0.shape == Shape::Declared => {
                    return Err(EvalError::NoAttribute {
                        type_name: self.class_name().to_string(),
                        attribute: name.to_string(),
                    });
                }
                None => {
                    attrs.insert(name.to_string(), value.clone());
                    Value::None
                }
            }
        };

        self.notify(name, old, value);
        Ok(true)
    }

    /// Run `name`'s observers with a synthetic change, without assigning.
    /// Used for event-like attributes.
    pub fn emit(&self, name: &str, value: Value) {
        let old = self.get(name).unwrap_or_default();
        self.notify(name, old, value);
    }

    fn notify(&self, name: &str, old: Value, new: Value) {
        // Snapshot so observers may subscribe or unsubscribe while running.
        let observers: Vec<Observer> = match self.0.observers.borrow().get(name) {
            Some(list) => list.iter().map(|(_, f)| f.clone()).collect(),
            None => return,
        };
        let change = AttributeChange {
            object: self.clone(),
            name: name.to_string(),
            old,
            new,
        };
        for observer in observers {
            observer(&change);
        }
    }

    /// Subscribe to changes of one attribute.
    pub fn observe(&self, name: &str, observer: impl Fn(&AttributeChange) + 'static) -> ObserverId {
        let id = ObserverId(self.0.next_observer.get());
        self.0.next_observer.set(id.0 + 1);
        self.0
            .observers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push((id, Rc::new(observer)));
        id
    }

    /// Drop a subscription. Returns whether it existed.
    pub fn unobserve(&self, name: &str, id: ObserverId) -> bool {
        let mut observers = self.0.observers.borrow_mut();
        let Some(list) = observers.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(observer, _)| *observer != id);
        before != list.len()
    }

    pub fn observer_count(&self, name: &str) -> usize {
        self.0.observers.borrow().get(name).map_or(0, Vec::len)
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.class_name())?;
        let mut map = f.debug_map();
        if let Ok(attrs) = self.0.attrs.try_borrow() {
            map.entries(attrs.iter());
        }
        map.finish()
    }
}

/// Non-owning handle captured by binding closures.
#[derive(Clone)]
pub struct WeakObject(Weak<ObjectInner>);

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakObject")
    }
}
