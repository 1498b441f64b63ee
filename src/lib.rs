//! # spark-view
//!
//! Declarative view compiler and constraint layout engine for Rust.
//!
//! ## Architecture
//!
//! A markup parser (outside this crate) hands over an [`ast::Document`].
//! The compiler turns it into a reusable tree of constructor nodes; each
//! instantiation builds a live [`Component`] tree whose attributes are
//! wired to code through four binding kinds, and whose containers keep
//! their children's geometry consistent with an incremental Cassowary
//! solver.
//!
//! ```text
//! Document → compile → ConstructorNode tree → instantiate → Component tree
//!                                                           │
//!                              BoxModel + ConstraintsLayout ┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Value, Size, Geometry)
//! - [`ast`] - Document handed over by the parser
//! - [`expr`] - Expression fragments: parse once, evaluate per instance
//! - [`engine`] - Observable objects, scopes, live components
//! - [`binding`] - Default, bind, delegate and notify factories
//! - [`compiler`] - Toolkit registry and the tree compiler
//! - [`solver`] - Incremental simplex constraint solver
//! - [`layout`] - Box model and per-container constraints layout
//! - [`pipeline`] - Scheduling, dirty flags, view factory

pub mod ast;
pub mod binding;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod expr;
pub mod layout;
pub mod pipeline;
pub mod solver;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{
    BindingError, CompileError, EvalError, ImportError, LayoutError, SolverError, SyntaxError,
    ViewError,
};

pub use ast::{Document, Node};

pub use binding::{Binding, BindingFactories, BindingFactory, BindingHandle, BindingKind};

pub use compiler::{
    compile, CompiledView, ConstructorNode, ModuleLoader, ModuleRegistry, Toolkit, WidgetAdapter,
    WidgetClass, WidgetRole,
};

pub use engine::{builtins, Component, Namespace, Object, Scope};

pub use layout::{BoxModel, ConstraintsLayout, LayoutConfig, Suggestion, UNBOUNDED};

pub use pipeline::{Dirty, FactoryConfig, Scheduler, TaskQueue, View, ViewFactory};

pub use solver::{Constraint, Expression, Solver, Strength, Variable};
