//! Linear constraints.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::expression::Expression;
use super::strength::Strength;
use super::variable::Variable;

/// Relation between a constraint's expression and zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationalOperator::LessOrEqual => "<=",
            RelationalOperator::Equal => "==",
            RelationalOperator::GreaterOrEqual => ">=",
        })
    }
}

#[derive(Debug)]
struct ConstraintData {
    expression: Expression,
    op: RelationalOperator,
    strength: Strength,
}

/// Immutable linear (in)equality `expression op 0` with a strength.
///
/// Constraints are compared by identity: two constraints built from the same
/// terms are still distinct, and removing one from a solver requires the
/// handle that was added.
#[derive(Clone)]
pub struct Constraint(Rc<ConstraintData>);

impl Constraint {
    pub fn new(expression: Expression, op: RelationalOperator, strength: Strength) -> Self {
        Self(Rc::new(ConstraintData {
            expression,
            op,
            strength: strength.clipped(),
        }))
    }

    pub fn expression(&self) -> &Expression {
        &self.0.expression
    }

    pub fn op(&self) -> RelationalOperator {
        self.0.op
    }

    pub fn strength(&self) -> Strength {
        self.0.strength
    }

    /// Same relation at a different strength, as a new constraint.
    pub fn with_strength(&self, strength: Strength) -> Self {
        Self::new(self.0.expression.clone(), self.0.op, strength)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.0.expression.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}*v{}", term.coefficient, term.variable.id())?;
        }
        write!(
            f,
            " + {} {} 0 | {:?}",
            self.0.expression.constant, self.0.op, self.0.strength
        )
    }
}

// =============================================================================
// Builders
// =============================================================================

impl Expression {
    /// `self == rhs`, required.
    pub fn equal_to(self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(self - rhs.into(), RelationalOperator::Equal, Strength::REQUIRED)
    }

    /// `self >= rhs`, required.
    pub fn greater_or_equal(self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(
            self - rhs.into(),
            RelationalOperator::GreaterOrEqual,
            Strength::REQUIRED,
        )
    }

    /// `self <= rhs`, required.
    pub fn less_or_equal(self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::new(
            self - rhs.into(),
            RelationalOperator::LessOrEqual,
            Strength::REQUIRED,
        )
    }
}

impl Variable {
    pub fn equal_to(self, rhs: impl Into<Expression>) -> Constraint {
        Expression::from(self).equal_to(rhs)
    }

    pub fn greater_or_equal(self, rhs: impl Into<Expression>) -> Constraint {
        Expression::from(self).greater_or_equal(rhs)
    }

    pub fn less_or_equal(self, rhs: impl Into<Expression>) -> Constraint {
        Expression::from(self).less_or_equal(rhs)
    }
}
