//! Expression Binding Factories
//!
//! Four ways an attribute can be tied to a piece of code:
//!
//! | Kind | Markup | Behavior |
//! |---|---|---|
//! | Default | `attr = expr` | evaluate once at instantiation |
//! | Bind | `attr := expr` | re-evaluate whenever a read attribute changes |
//! | Delegate | `attr << obj.name` | two-way link with `obj.name` |
//! | Notify | `attr >> stmts` | run statements whenever `attr` changes |
//!
//! Each factory compiles code once into a [`Binding`]; the same binding is
//! injected into every widget instantiated from the compiled tree.
//!
//! # Ownership
//!
//! Observers are stored inside the observed [`Object`], so their closures
//! hold only weak references. The state of a live binding is owned by the
//! returned [`BindingHandle`]; dropping the handle disconnects the binding.

mod bind;
mod default;
mod delegate;
mod notify;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::engine::{AttributeChange, Object, ObserverId, Scope, WeakObject};
use crate::error::{EvalError, SyntaxError};

pub use bind::BindFactory;
pub use default::DefaultFactory;
pub use delegate::DelegateFactory;
pub use notify::NotifyFactory;

/// The four binding semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Default,
    Bind,
    Delegate,
    Notify,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingKind::Default => "default",
            BindingKind::Bind => "bind",
            BindingKind::Delegate => "delegate",
            BindingKind::Notify => "notify",
        })
    }
}

/// A compiled fragment, ready to attach to any number of widgets.
pub trait Binding {
    fn kind(&self) -> BindingKind;

    /// Source the binding was compiled from.
    fn code(&self) -> &str;

    /// Attach to `target.attribute`, resolving names in `scope`.
    fn inject(
        &self,
        target: &Object,
        attribute: &str,
        scope: &Scope,
    ) -> Result<BindingHandle, EvalError>;
}

impl fmt::Debug for dyn Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.code())
    }
}

/// Produces bindings of one kind from code.
pub trait BindingFactory {
    fn kind(&self) -> BindingKind;

    fn compile(&self, code: &str) -> Result<Rc<dyn Binding>, SyntaxError>;
}

/// One factory per binding kind, handed to the compiler.
#[derive(Clone)]
pub struct BindingFactories {
    pub default: Rc<dyn BindingFactory>,
    pub bind: Rc<dyn BindingFactory>,
    pub delegate: Rc<dyn BindingFactory>,
    pub notify: Rc<dyn BindingFactory>,
}

impl BindingFactories {
    pub fn get(&self, kind: BindingKind) -> &dyn BindingFactory {
        match kind {
            BindingKind::Default => self.default.as_ref(),
            BindingKind::Bind => self.bind.as_ref(),
            BindingKind::Delegate => self.delegate.as_ref(),
            BindingKind::Notify => self.notify.as_ref(),
        }
    }
}

impl Default for BindingFactories {
    fn default() -> Self {
        Self {
            default: Rc::new(DefaultFactory),
            bind: Rc::new(BindFactory),
            delegate: Rc::new(DelegateFactory),
            notify: Rc::new(NotifyFactory),
        }
    }
}

impl fmt::Debug for BindingFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BindingFactories")
    }
}

// =============================================================================
// Live binding plumbing
// =============================================================================

/// Keeps a live binding connected. Empty for one-shot bindings.
#[derive(Default)]
pub struct BindingHandle(Option<Rc<dyn Any>>);

impl BindingHandle {
    /// Handle for a binding with nothing left to keep alive.
    pub fn detached() -> Self {
        Self(None)
    }

    pub(crate) fn retain(state: Rc<dyn Any>) -> Self {
        Self(Some(state))
    }

    pub fn is_live(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for BindingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BindingHandle").field(&self.is_live()).finish()
    }
}

/// One observer registration, removed again on drop.
pub(crate) struct Subscription {
    object: WeakObject,
    attribute: String,
    id: ObserverId,
}

impl Subscription {
    pub fn new(
        object: &Object,
        attribute: &str,
        observer: impl Fn(&AttributeChange) + 'static,
    ) -> Self {
        let id = object.observe(attribute, observer);
        Self {
            object: object.downgrade(),
            attribute: attribute.to_string(),
            id,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(object) = self.object.upgrade() {
            object.unobserve(&self.attribute, self.id);
        }
    }
}

/// Name of an object for log messages.
pub(crate) fn describe(object: &Object) -> String {
    object
        .get("name")
        .and_then(|v| v.as_str().map(str::to_string))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| object.class_name().to_string())
}
