//! Linear constraint solver.
//!
//! A Cassowary-style incremental simplex over [`Variable`]s. Constraints are
//! built with arithmetic on variables and expressions, then handed to a
//! [`Solver`]:
//!
//! ```ignore
//! use spark_view::solver::{Solver, Strength, Variable};
//!
//! let left = Variable::new();
//! let width = Variable::new();
//! let mut solver = Solver::new();
//! solver.add_constraint(left.greater_or_equal(0.0))?;
//! solver.add_constraint((left + width).less_or_equal(200.0))?;
//! solver.add_constraint(width.equal_to(120.0).with_strength(Strength::STRONG))?;
//! ```

mod constraint;
mod expression;
mod row;
mod simplex;
mod strength;
mod variable;

pub use constraint::{Constraint, RelationalOperator};
pub use expression::{Expression, Term};
pub use simplex::{Solution, Solver};
pub use strength::Strength;
pub use variable::Variable;
