//! Solver variables.

use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_VARIABLE: AtomicUsize = AtomicUsize::new(0);

/// Symbolic unknown in a linear system.
///
/// Variables are plain handles; their values live in whichever [`Solver`]
/// they were added to, so one variable can take part in several systems
/// (a container's width is solved both by its parent and by itself).
///
/// [`Solver`]: super::Solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(usize);

impl Variable {
    /// Allocate a fresh variable.
    pub fn new() -> Self {
        Self(NEXT_VARIABLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Unique handle, stable for the life of the process.
    pub fn id(&self) -> usize {
        self.0
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_are_unique() {
        let a = Variable::new();
        let b = Variable::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }
}
