//! Linear expressions over solver variables.
//!
//! Expressions are built with ordinary arithmetic:
//!
//! ```ignore
//! let right = left + width;
//! let h_center = left + width / 2.0;
//! let gap = other.left - (left + width) - 8.0;
//! ```

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::variable::Variable;

/// Variable scaled by a coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub variable: Variable,
    pub coefficient: f64,
}

impl Term {
    pub const fn new(variable: Variable, coefficient: f64) -> Self {
        Self {
            variable,
            coefficient,
        }
    }
}

impl From<Variable> for Term {
    fn from(variable: Variable) -> Self {
        Self::new(variable, 1.0)
    }
}

/// Sum of terms plus a constant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub terms: Vec<Term>,
    pub constant: f64,
}

impl Expression {
    pub fn new(terms: Vec<Term>, constant: f64) -> Self {
        Self { terms, constant }
    }

    pub fn from_constant(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// Evaluate with the given variable values.
    pub fn evaluate(&self, value_of: impl Fn(Variable) -> f64) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, term| acc + term.coefficient * value_of(term.variable))
    }

    /// Variables referenced by the expression, in term order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms.iter().map(|term| term.variable)
    }

    fn plus(mut self, other: Expression) -> Self {
        self.terms.extend(other.terms);
        self.constant += other.constant;
        self
    }

    fn scaled(mut self, factor: f64) -> Self {
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::new(vec![Term::from(variable)], 0.0)
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Self::new(vec![term], 0.0)
    }
}

impl From<f64> for Expression {
    fn from(constant: f64) -> Self {
        Self::from_constant(constant)
    }
}

// =============================================================================
// Operators
// =============================================================================

macro_rules! impl_additive {
    ($($lhs:ty, $rhs:ty);* $(;)?) => {$(
        impl Add<$rhs> for $lhs {
            type Output = Expression;

            fn add(self, rhs: $rhs) -> Expression {
                Expression::from(self).plus(Expression::from(rhs))
            }
        }

        impl Sub<$rhs> for $lhs {
            type Output = Expression;

            fn sub(self, rhs: $rhs) -> Expression {
                Expression::from(self).plus(Expression::from(rhs).scaled(-1.0))
            }
        }
    )*};
}

impl_additive! {
    Expression, Expression;
    Expression, Variable;
    Expression, f64;
    Variable, Expression;
    Variable, Variable;
    Variable, f64;
    f64, Expression;
    f64, Variable;
}

macro_rules! impl_scaling {
    ($($ty:ty),*) => {$(
        impl Mul<f64> for $ty {
            type Output = Expression;

            fn mul(self, rhs: f64) -> Expression {
                Expression::from(self).scaled(rhs)
            }
        }

        impl Mul<$ty> for f64 {
            type Output = Expression;

            fn mul(self, rhs: $ty) -> Expression {
                Expression::from(rhs).scaled(self)
            }
        }

        impl Div<f64> for $ty {
            type Output = Expression;

            fn div(self, rhs: f64) -> Expression {
                Expression::from(self).scaled(1.0 / rhs)
            }
        }

        impl Neg for $ty {
            type Output = Expression;

            fn neg(self) -> Expression {
                Expression::from(self).scaled(-1.0)
            }
        }
    )*};
}

impl_scaling!(Expression, Variable);
