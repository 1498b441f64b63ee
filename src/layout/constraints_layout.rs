//! Incremental constraints layout for one container.
//!
//! ```text
//! uninitialized ──initialize──> initialized ──update_constraints──┐
//!                                    ^                             │
//!                                    └─────────────────────────────┘
//! ```
//!
//! Every batch of additions and removals runs with the solver's auto-solve
//! off, so a momentarily partial system is never optimized. A batch that
//! fails is undone before the error is returned.

use std::cell::RefCell;

use tracing::{debug, error, trace};

use super::config::Suggestion;
use super::guard::ReentrancyGuard;
use crate::error::{LayoutError, SolverError};
use crate::solver::{Constraint, Solution, Solver, Variable};
use crate::types::Size;

/// Value edited into both dimensions by [`ConstraintsLayout::max_size`].
pub const MAX_SIZE_SENTINEL: f64 = 16_777_215.0;

/// Reported for a dimension with no upper bound.
pub const UNBOUNDED: f64 = -1.0;

/// Owns one solver and drives it through resizes and size probes.
#[derive(Debug, Default)]
pub struct ConstraintsLayout {
    solver: RefCell<Option<Solver>>,
    guard: ReentrancyGuard,
}

impl ConstraintsLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.solver.borrow().is_some()
    }

    /// Build the solver from the full constraint set.
    ///
    /// On failure the layout stays uninitialized.
    pub fn initialize(&self, constraints: &[Constraint]) -> Result<(), LayoutError> {
        if self.is_initialized() {
            return Err(LayoutError::AlreadyInitialized);
        }

        let mut solver = Solver::new();
        solver.set_auto_solve(false)?;
        for constraint in constraints {
            solver.add_constraint(constraint.clone())?;
        }
        solver.set_auto_solve(true)?;

        debug!(constraints = constraints.len(), "initialized constraints layout");
        *self.solver.borrow_mut() = Some(solver);
        Ok(())
    }

    /// Swap `old` for `new` in one batch.
    ///
    /// If any step fails, the steps already applied are reverted in reverse
    /// order. Should the revert itself fail, the layout is reset to
    /// uninitialized rather than left half applied.
    pub fn update_constraints(
        &self,
        old: &[Constraint],
        new: &[Constraint],
    ) -> Result<(), LayoutError> {
        let mut slot = self.solver.borrow_mut();
        let solver = slot
            .as_mut()
            .ok_or(LayoutError::NotInitialized("update constraints"))?;

        solver.set_auto_solve(false)?;
        let mut batch = Batch::default();
        let outcome = batch.apply(solver, old, new);

        let Err(cause) = outcome else {
            trace!(removed = old.len(), added = new.len(), "updated constraints");
            return Ok(());
        };

        if let Err(rollback) = batch.revert(solver, old, new) {
            error!(%cause, %rollback, "constraint rollback failed, resetting layout");
            *slot = None;
        }
        Err(cause.into())
    }

    /// Solve for `size` and hand the result to `callback`.
    ///
    /// Returns `Ok(false)` without doing anything if a layout of this
    /// instance is already running further up the stack.
    pub fn layout<F>(
        &self,
        width: Variable,
        height: Variable,
        size: Size,
        suggestion: Suggestion,
        callback: F,
    ) -> Result<bool, LayoutError>
    where
        F: FnOnce(&Solution),
    {
        let Some(_token) = self.guard.enter() else {
            trace!("nested layout dropped");
            return Ok(false);
        };

        let solution = self.suggest(
            "layout",
            [(width, size.width), (height, size.height)],
            suggestion,
        )?;
        callback(&solution);
        Ok(true)
    }

    /// Smallest size the system reaches without breaking stronger
    /// constraints.
    pub fn min_size(
        &self,
        width: Variable,
        height: Variable,
        suggestion: Suggestion,
    ) -> Result<Size, LayoutError> {
        let solution = self.suggest("get min size", [(width, 0.0), (height, 0.0)], suggestion)?;
        Ok(Size::new(solution.value(width), solution.value(height)))
    }

    /// Largest size the system allows. A dimension that follows the
    /// sentinel suggestion all the way is reported as [`UNBOUNDED`].
    pub fn max_size(
        &self,
        width: Variable,
        height: Variable,
        suggestion: Suggestion,
    ) -> Result<Size, LayoutError> {
        let solution = self.suggest(
            "get max size",
            [(width, MAX_SIZE_SENTINEL), (height, MAX_SIZE_SENTINEL)],
            suggestion,
        )?;
        let bound = |value: f64| {
            if (MAX_SIZE_SENTINEL - value.round()).abs() <= 1.0 {
                UNBOUNDED
            } else {
                value
            }
        };
        Ok(Size::new(
            bound(solution.value(width)),
            bound(solution.value(height)),
        ))
    }

    /// Whether `constraint` is live in the solver.
    pub fn contains(&self, constraint: &Constraint) -> bool {
        self.solver
            .borrow()
            .as_ref()
            .is_some_and(|solver| solver.has_constraint(constraint))
    }

    /// Solve with temporary edit values and snapshot the result. The edits
    /// are always withdrawn again, so probes never leak into later solves.
    fn suggest(
        &self,
        operation: &'static str,
        edits: [(Variable, f64); 2],
        suggestion: Suggestion,
    ) -> Result<Solution, LayoutError> {
        let mut slot = self.solver.borrow_mut();
        let solver = slot.as_mut().ok_or(LayoutError::NotInitialized(operation))?;
        let strength = suggestion.strength();

        let mut added = Vec::with_capacity(edits.len());
        let outcome = edits.iter().try_for_each(|&(variable, value)| {
            solver.add_edit_variable(variable, strength)?;
            added.push(variable);
            solver.suggest_value(variable, value)
        });
        let snapshot = outcome.map(|()| solver.solution());

        let cleanup = added
            .iter()
            .rev()
            .try_for_each(|&variable| solver.remove_edit_variable(variable));

        let solution = snapshot?;
        cleanup?;
        Ok(solution)
    }
}

/// Progress through one update batch.
#[derive(Default)]
struct Batch {
    removed: usize,
    added: usize,
}

impl Batch {
    fn apply(
        &mut self,
        solver: &mut Solver,
        old: &[Constraint],
        new: &[Constraint],
    ) -> Result<(), SolverError> {
        for constraint in old {
            solver.remove_constraint(constraint)?;
            self.removed += 1;
        }
        for constraint in new {
            solver.add_constraint(constraint.clone())?;
            self.added += 1;
        }
        solver.set_auto_solve(true)
    }

    fn revert(
        &self,
        solver: &mut Solver,
        old: &[Constraint],
        new: &[Constraint],
    ) -> Result<(), SolverError> {
        for constraint in new[..self.added].iter().rev() {
            solver.remove_constraint(constraint)?;
        }
        for constraint in old[..self.removed].iter().rev() {
            solver.add_constraint(constraint.clone())?;
        }
        solver.set_auto_solve(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoxModel;
    use crate::solver::Strength;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_operations_require_initialize() {
        let layout = ConstraintsLayout::new();
        let b = BoxModel::new();
        assert_eq!(
            layout.update_constraints(&[], &[]),
            Err(LayoutError::NotInitialized("update constraints"))
        );
        assert!(matches!(
            layout.min_size(b.width, b.height, Suggestion::default()),
            Err(LayoutError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_initialize_twice_fails() {
        let layout = ConstraintsLayout::new();
        layout.initialize(&[]).unwrap();
        assert_eq!(layout.initialize(&[]), Err(LayoutError::AlreadyInitialized));
    }

    #[test]
    fn test_failed_initialize_stays_uninitialized() {
        let b = BoxModel::new();
        let layout = ConstraintsLayout::new();
        let result = layout.initialize(&[b.width.equal_to(10.0), b.width.equal_to(20.0)]);
        assert_eq!(
            result,
            Err(LayoutError::Solver(SolverError::UnsatisfiableConstraint))
        );
        assert!(!layout.is_initialized());
    }

    #[test]
    fn test_update_rolls_back_failed_batch() {
        let b = BoxModel::new();
        let c1 = b.width.greater_or_equal(50.0);
        let layout = ConstraintsLayout::new();
        layout.initialize(&[c1.clone()]).unwrap();

        let c2 = b.width.less_or_equal(200.0);
        let bad = b.width.less_or_equal(-5.0);
        let result = layout.update_constraints(&[], &[c2.clone(), bad.clone()]);
        assert!(result.is_err());

        assert!(layout.contains(&c1));
        assert!(!layout.contains(&c2));
        assert!(!layout.contains(&bad));
    }

    #[test]
    fn test_layout_callback_sees_suggestion() {
        let b = BoxModel::new();
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[b.width.greater_or_equal(0.0), b.height.greater_or_equal(0.0)])
            .unwrap();

        let mut seen = None;
        let ran = layout
            .layout(
                b.width,
                b.height,
                Size::new(300.0, 120.0),
                Suggestion::default(),
                |solution| seen = Some(b.resolve(solution)),
            )
            .unwrap();

        assert!(ran);
        let g = seen.unwrap();
        assert!(close(g.width, 300.0));
        assert!(close(g.height, 120.0));
    }

    #[test]
    fn test_nested_layout_is_dropped() {
        let b = BoxModel::new();
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[b.width.greater_or_equal(0.0), b.height.greater_or_equal(0.0)])
            .unwrap();

        let size = Size::new(100.0, 50.0);
        let mut inner = None;
        let mut inner_ran_callback = false;
        let outer = layout.layout(b.width, b.height, size, Suggestion::default(), |_| {
            inner = Some(layout.layout(b.width, b.height, size, Suggestion::default(), |_| {
                inner_ran_callback = true;
            }));
        });

        assert_eq!(outer, Ok(true));
        assert_eq!(inner, Some(Ok(false)));
        assert!(!inner_ran_callback);

        // The guard is released once the outer call returns.
        let again = layout.layout(b.width, b.height, size, Suggestion::default(), |_| {});
        assert_eq!(again, Ok(true));
    }

    #[test]
    fn test_heavy_suggestion_loses_to_strong() {
        let b = BoxModel::new();
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[
                b.width.equal_to(100.0).with_strength(Strength::STRONG),
                b.height.greater_or_equal(0.0),
            ])
            .unwrap();

        let mut width = None;
        layout
            .layout(
                b.width,
                b.height,
                Size::new(300.0, 40.0),
                Suggestion::new(Strength::MEDIUM, 5000.0),
                |solution| width = Some(solution.value(b.width)),
            )
            .unwrap();
        assert!(width.is_some_and(|w| close(w, 100.0)));
    }

    #[test]
    fn test_min_and_max_size() {
        let b = BoxModel::new();
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[
                b.width.greater_or_equal(80.0),
                b.width.less_or_equal(400.0),
                b.height.greater_or_equal(0.0),
                b.height
                    .equal_to(30.0)
                    .with_strength(Strength::MEDIUM),
            ])
            .unwrap();

        let probe = Suggestion::new(Strength::MEDIUM, 0.1);
        let min = layout.min_size(b.width, b.height, probe).unwrap();
        assert!(close(min.width, 80.0));
        assert!(close(min.height, 30.0));

        let max = layout.max_size(b.width, b.height, probe).unwrap();
        assert!(close(max.width, 400.0));
        assert!(close(max.height, 30.0));
    }

    #[test]
    fn test_unbounded_max_size() {
        let b = BoxModel::new();
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[b.width.greater_or_equal(0.0), b.height.greater_or_equal(0.0)])
            .unwrap();

        let max = layout
            .max_size(b.width, b.height, Suggestion::new(Strength::MEDIUM, 0.1))
            .unwrap();
        assert_eq!(max, Size::new(UNBOUNDED, UNBOUNDED));
    }
}
