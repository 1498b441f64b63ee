//! Symbolic box model.

use crate::solver::{Expression, Solution, Variable};
use crate::types::Geometry;

/// Four free variables per widget. The derived edges and centers are
/// expressions over them, so every constraint reaches the solver in terms
/// of the primaries only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxModel {
    pub left: Variable,
    pub top: Variable,
    pub width: Variable,
    pub height: Variable,
}

impl BoxModel {
    pub fn new() -> Self {
        Self {
            left: Variable::new(),
            top: Variable::new(),
            width: Variable::new(),
            height: Variable::new(),
        }
    }

    /// `left + width`
    pub fn right(&self) -> Expression {
        self.left + self.width
    }

    /// `top + height`
    pub fn bottom(&self) -> Expression {
        self.top + self.height
    }

    /// `top + height / 2`
    pub fn v_center(&self) -> Expression {
        self.top + self.height / 2.0
    }

    /// `left + width / 2`
    pub fn h_center(&self) -> Expression {
        self.left + self.width / 2.0
    }

    /// Read the box out of a solved system.
    pub fn resolve(&self, solution: &Solution) -> Geometry {
        Geometry {
            x: solution.value(self.left),
            y: solution.value(self.top),
            width: solution.value(self.width),
            height: solution.value(self.height),
        }
    }
}

impl Default for BoxModel {
    fn default() -> Self {
        Self::new()
    }
}
