//! Solver and constraints-layout behavior, including property tests:
//!
//! 1. Box relations hold after every layout.
//! 2. Laying out twice at the same size yields the same geometry.
//! 3. Raising a medium minimum width never lowers the minimum size.
//! 4. A dimension without an upper bound reports `UNBOUNDED`.
//! 5. A run of resizes never leaves the solver unable to re-solve.

use proptest::prelude::*;
use spark_view::layout::{BoxModel, ConstraintsLayout, Suggestion, UNBOUNDED};
use spark_view::solver::{Constraint, Solver, Strength};
use spark_view::{Geometry, LayoutError, Size, SolverError};

const TOLERANCE: f64 = 1e-6;

/// Outer box with a single child inset by `margin` on every side.
fn inset(outer: &BoxModel, inner: &BoxModel, margin: f64) -> Vec<Constraint> {
    vec![
        outer.width.greater_or_equal(0.0),
        outer.height.greater_or_equal(0.0),
        inner.left.equal_to(margin),
        inner.top.equal_to(margin),
        inner.right().equal_to(outer.width - margin),
        inner.bottom().equal_to(outer.height - margin),
    ]
}

fn layout_once(
    layout: &ConstraintsLayout,
    outer: &BoxModel,
    inner: &BoxModel,
    size: Size,
) -> (Geometry, f64, f64) {
    let mut out = None;
    let ran = layout
        .layout(outer.width, outer.height, size, Suggestion::default(), |solution| {
            out = Some((
                inner.resolve(solution),
                solution.evaluate(&inner.right()),
                solution.evaluate(&inner.bottom()),
            ));
        })
        .unwrap();
    assert!(ran);
    out.unwrap()
}

// ═════════════════════════════════════════════════════════════════════════
// Scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn test_inset_child_follows_container() {
    let (outer, inner) = (BoxModel::new(), BoxModel::new());
    let layout = ConstraintsLayout::new();
    layout.initialize(&inset(&outer, &inner, 10.0)).unwrap();

    let (geometry, _, _) = layout_once(&layout, &outer, &inner, Size::new(200.0, 100.0));
    assert_eq!(geometry, Geometry::new(10.0, 10.0, 180.0, 80.0));
}

#[test]
fn test_update_replaces_constraint() {
    let model = BoxModel::new();
    let c1 = model.width.equal_to(50.0);
    let c2 = model.width.equal_to(80.0);
    let layout = ConstraintsLayout::new();
    layout.initialize(std::slice::from_ref(&c1)).unwrap();

    layout.update_constraints(&[c1.clone()], &[c2.clone()]).unwrap();
    assert!(!layout.contains(&c1));
    assert!(layout.contains(&c2));

    // c1 is gone, so removing it again is an error.
    let err = layout.update_constraints(&[c1], &[]).unwrap_err();
    assert_eq!(err, LayoutError::Solver(SolverError::UnknownConstraint));
    assert!(layout.contains(&c2));
}

#[test]
fn test_operations_before_initialize_fail() {
    let model = BoxModel::new();
    let layout = ConstraintsLayout::new();
    assert!(matches!(
        layout.update_constraints(&[], &[model.width.equal_to(1.0)]),
        Err(LayoutError::NotInitialized(_))
    ));
    assert!(matches!(
        layout.min_size(model.width, model.height, Suggestion::default()),
        Err(LayoutError::NotInitialized(_))
    ));
}

#[test]
fn test_failed_initialize_leaves_layout_uninitialized() {
    let model = BoxModel::new();
    let layout = ConstraintsLayout::new();
    let err = layout
        .initialize(&[model.width.greater_or_equal(10.0), model.width.less_or_equal(5.0)])
        .unwrap_err();
    assert_eq!(err, LayoutError::Solver(SolverError::UnsatisfiableConstraint));
    assert!(!layout.is_initialized());

    layout.initialize(&[model.width.greater_or_equal(10.0)]).unwrap();
    assert!(layout.is_initialized());
}

#[test]
fn test_failed_batch_is_rolled_back() {
    let model = BoxModel::new();
    let keep = model.width.greater_or_equal(10.0);
    let layout = ConstraintsLayout::new();
    layout.initialize(std::slice::from_ref(&keep)).unwrap();

    let fine = model.height.equal_to(20.0);
    let bad = model.width.less_or_equal(5.0);
    assert!(layout.update_constraints(&[], &[fine.clone(), bad]).is_err());
    assert!(layout.contains(&keep));
    assert!(!layout.contains(&fine));
}

#[test]
fn test_max_size_reports_bounded_and_unbounded() {
    let (outer, inner) = (BoxModel::new(), BoxModel::new());
    let layout = ConstraintsLayout::new();
    layout
        .initialize(&[
            outer.width.greater_or_equal(0.0),
            outer.height.less_or_equal(300.0),
            inner.right().less_or_equal(outer.width),
        ])
        .unwrap();
    let max = layout
        .max_size(outer.width, outer.height, Suggestion::new(Strength::MEDIUM, 0.1))
        .unwrap();
    assert_eq!(max.width, UNBOUNDED);
    assert!((max.height - 300.0).abs() < TOLERANCE);
}

#[test]
fn test_solver_edit_variables() {
    let model = BoxModel::new();
    let mut solver = Solver::new();
    solver.add_constraint(model.width.less_or_equal(100.0)).unwrap();
    solver.add_edit_variable(model.width, Strength::STRONG).unwrap();
    assert_eq!(
        solver.add_edit_variable(model.width, Strength::STRONG),
        Err(SolverError::DuplicateEditVariable)
    );
    solver.suggest_value(model.width, 250.0).unwrap();
    assert!((solver.value(model.width) - 100.0).abs() < TOLERANCE);
    solver.remove_edit_variable(model.width).unwrap();
    assert_eq!(
        solver.suggest_value(model.width, 1.0),
        Err(SolverError::UnknownEditVariable)
    );
}

#[test]
fn test_weighted_edit_cannot_beat_strong() {
    let model = BoxModel::new();
    let mut solver = Solver::new();
    solver
        .add_constraint(model.width.equal_to(10.0).with_strength(Strength::STRONG))
        .unwrap();
    solver
        .add_edit_variable(model.width, Strength::MEDIUM.weighted(2000.0))
        .unwrap();
    solver.suggest_value(model.width, 500.0).unwrap();
    assert!((solver.value(model.width) - 10.0).abs() < TOLERANCE);
}

// ═════════════════════════════════════════════════════════════════════════
// Properties
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_box_relations_hold(
        width in 20.0f64..2000.0,
        height in 20.0f64..2000.0,
        margin in 0.0f64..10.0,
    ) {
        let (outer, inner) = (BoxModel::new(), BoxModel::new());
        let layout = ConstraintsLayout::new();
        layout.initialize(&inset(&outer, &inner, margin)).unwrap();

        let (geometry, right, bottom) = layout_once(&layout, &outer, &inner, Size::new(width, height));
        prop_assert!((right - (geometry.x + geometry.width)).abs() < TOLERANCE);
        prop_assert!((bottom - (geometry.y + geometry.height)).abs() < TOLERANCE);
        prop_assert!((geometry.width - (width - 2.0 * margin)).abs() < TOLERANCE);
    }

    #[test]
    fn prop_layout_is_idempotent(width in 0.0f64..1000.0, height in 0.0f64..1000.0) {
        let (outer, inner) = (BoxModel::new(), BoxModel::new());
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[
                outer.width.greater_or_equal(0.0),
                outer.height.greater_or_equal(0.0),
                inner.left.greater_or_equal(0.0),
                inner.right().less_or_equal(outer.width),
                inner.width.equal_to(120.0).with_strength(Strength::STRONG),
                inner.h_center().equal_to(outer.width / 2.0).with_strength(Strength::MEDIUM),
                inner.top.equal_to(0.0),
                inner.height.equal_to(outer.height),
            ])
            .unwrap();

        let size = Size::new(width, height);
        let first = layout_once(&layout, &outer, &inner, size).0;
        let second = layout_once(&layout, &outer, &inner, size).0;
        prop_assert!((first.x - second.x).abs() < TOLERANCE);
        prop_assert!((first.width - second.width).abs() < TOLERANCE);
        prop_assert!((first.height - second.height).abs() < TOLERANCE);
    }

    #[test]
    fn prop_min_size_is_monotonic(low in 0.0f64..500.0, delta in 0.0f64..500.0) {
        let min_width = |target: f64| {
            let (outer, inner) = (BoxModel::new(), BoxModel::new());
            let layout = ConstraintsLayout::new();
            layout
                .initialize(&[
                    outer.width.greater_or_equal(0.0),
                    outer.height.greater_or_equal(0.0),
                    inner.left.equal_to(0.0),
                    inner.right().less_or_equal(outer.width),
                    inner.width.greater_or_equal(target).with_strength(Strength::MEDIUM),
                ])
                .unwrap();
            layout
                .min_size(outer.width, outer.height, Suggestion::new(Strength::MEDIUM, 0.1))
                .unwrap()
                .width
        };
        prop_assert!(min_width(low + delta) + TOLERANCE >= min_width(low));
    }

    #[test]
    fn prop_repeated_suggestions_stay_solvable(
        sizes in prop::collection::vec((0.0f64..1000.0, 0.0f64..1000.0), 1..24),
    ) {
        let (outer, left, right) = (BoxModel::new(), BoxModel::new(), BoxModel::new());
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[
                outer.width.greater_or_equal(0.0),
                outer.height.greater_or_equal(0.0),
                left.left.equal_to(0.0),
                right.left.equal_to(left.right()),
                right.right().less_or_equal(outer.width),
                (left.width * 3.0).equal_to(right.width * 7.0).with_strength(Strength::STRONG),
                left.width.greater_or_equal(10.0).with_strength(Strength::MEDIUM),
                left.top.equal_to(0.0),
                right.top.equal_to(0.0),
                left.height.less_or_equal(outer.height / 3.0),
            ])
            .unwrap();

        for (width, height) in sizes {
            let mut edge = None;
            let ran = layout
                .layout(outer.width, outer.height, Size::new(width, height), Suggestion::default(), |s| {
                    edge = Some((s.evaluate(&right.right()), s.value(outer.width)));
                })
                .unwrap();
            prop_assert!(ran);
            let (edge, outer_width) = edge.unwrap();
            prop_assert!(edge <= outer_width + TOLERANCE);
            prop_assert!(layout.min_size(outer.width, outer.height, Suggestion::new(Strength::MEDIUM, 0.1)).is_ok());
        }
    }

    #[test]
    fn prop_unbounded_width_detected(hint in 0.0f64..5000.0) {
        let (outer, inner) = (BoxModel::new(), BoxModel::new());
        let layout = ConstraintsLayout::new();
        layout
            .initialize(&[
                outer.width.greater_or_equal(0.0),
                outer.height.equal_to(40.0),
                inner.left.equal_to(0.0),
                inner.right().less_or_equal(outer.width),
                inner.width.greater_or_equal(hint).with_strength(Strength::STRONG),
            ])
            .unwrap();
        let max = layout
            .max_size(outer.width, outer.height, Suggestion::new(Strength::MEDIUM, 0.1))
            .unwrap();
        prop_assert_eq!(max.width, UNBOUNDED);
        prop_assert!((max.height - 40.0).abs() < TOLERANCE);
    }
}
