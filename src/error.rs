//! Error taxonomy.
//!
//! One enum per layer, converted upward with `#[from]`:
//!
//! ```text
//! SyntaxError ─┐
//! ImportError ─┴─> CompileError ─┐
//! EvalError ─────> BindingError ─┼─> ViewError
//! SolverError ───> LayoutError ──┘
//! ```

use thiserror::Error;

use crate::binding::BindingKind;

/// A fragment of expression code failed to parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (at offset {offset})")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Failure while evaluating an expression against a scope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    NameNotFound(String),

    #[error("'{type_name}' object has no attribute '{attribute}'")]
    NoAttribute { type_name: String, attribute: String },

    #[error("{0}")]
    Type(String),

    #[error("division by zero")]
    ZeroDivision,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("format error: {0}")]
    Format(String),

    #[error("attribute '{0}' is read-only")]
    ReadOnly(String),

    #[error("{function}(): {message}")]
    Call { function: String, message: String },
}

impl EvalError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type(message.into())
    }
}

/// A module requested by an import statement could not be provided.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("no module named '{0}'")]
    UnknownModule(String),

    #[error("cannot import name '{name}' from '{module}'")]
    UnknownSymbol { module: String, name: String },
}

/// Compile-time failures. All of them abort compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    #[error("'{name}' cannot be used as {expected}")]
    RoleMismatch { name: String, expected: &'static str },

    #[error("document defines no root element")]
    EmptyDocument,

    #[error("document defines more than one root element (second is '{0}')")]
    MultipleRoots(String),

    #[error("meta '{0}' has no parent element")]
    MetaWithoutParent(String),

    #[error("binding for '{0}' appears outside of any element")]
    BindingOutsideElement(String),

    #[error("identifier '{0}' is used more than once")]
    DuplicateIdentifier(String),

    #[error("'{widget}' has no attribute '{attribute}'")]
    UnknownAttribute { widget: String, attribute: String },

    #[error("invalid {kind} binding for '{widget}.{attribute}': {source}")]
    Binding {
        widget: String,
        attribute: String,
        kind: BindingKind,
        #[source]
        source: SyntaxError,
    },

    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Instantiation-time failure of one attribute binding.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} binding '{widget}.{attribute}' failed: {source}")]
pub struct BindingError {
    /// Identifier of the widget, or its class name when it has none.
    pub widget: String,
    pub attribute: String,
    pub kind: BindingKind,
    #[source]
    pub source: EvalError,
}

/// Errors raised by the constraint solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("constraint is already in the solver")]
    DuplicateConstraint,

    #[error("constraint is not in the solver")]
    UnknownConstraint,

    #[error("required constraint cannot be satisfied")]
    UnsatisfiableConstraint,

    #[error("variable is already an edit variable")]
    DuplicateEditVariable,

    #[error("variable is not an edit variable")]
    UnknownEditVariable,

    #[error("edit variables cannot have required strength")]
    BadRequiredStrength,

    #[error("internal solver error: {0}")]
    Internal(&'static str),
}

/// Errors raised by a constraints layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{0} on uninitialized solver")]
    NotInitialized(&'static str),

    #[error("layout is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Top-level error for building and instantiating views.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),
}
