//! Expression fragments.
//!
//! Bindings carry small pieces of code: `'%s' % user.name`, `model.count`,
//! `self.width * 2 if wide else 80`. This module lexes and parses them once
//! at compile time and evaluates the parsed tree against a [`Scope`] at
//! instantiation time.
//!
//! ```ignore
//! use spark_view::expr::{parse_expression, Evaluator};
//!
//! let expr = parse_expression("'%s' % user.name")?;
//! let evaluator = Evaluator::tracking(&scope);
//! let value = evaluator.eval(&expr)?;
//! let deps = evaluator.into_dependencies();   // [(user, "name")]
//! ```
//!
//! [`Scope`]: crate::engine::Scope

mod eval;
mod format;
mod parser;
mod token;

pub use eval::{Dependency, Evaluator, MAX_REPEAT_LEN};
pub use format::{format_percent, MAX_FIELD_WIDTH};
pub use parser::{
    parse_expression, parse_statements, BinaryOp, CompareOp, Expr, Statement, UnaryOp,
};
