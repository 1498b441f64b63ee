//! Runtime objects.
//!
//! - [`Object`]: observable attribute bag every widget and model is made of
//! - [`Namespace`] / [`Scope`]: name resolution for expressions
//! - [`builtins`]: functions visible to every expression
//! - [`Component`]: live widget tree with invalidation and scheduling
//!
//! Everything here is single-threaded (`Rc`/`RefCell`/`Cell`); deferral
//! goes through the host [`Scheduler`](crate::pipeline::Scheduler).

mod builtins;
mod component;
mod object;
mod scope;

pub use builtins::builtins;
pub use component::{Component, Host, PassStats};
pub use object::{AttributeChange, Object, ObserverId, WeakObject};
pub use scope::{Namespace, Scope};
