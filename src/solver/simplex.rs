//! Incremental simplex solver.
//!
//! The tableau keeps every basic symbol as a row over parametric symbols.
//! Adding or removing a constraint touches only the rows that mention its
//! symbols, and suggesting a new edit value re-optimizes with the dual
//! simplex from the previous solution, so a resize costs a few pivots
//! rather than a rebuild.
//!
//! ```ignore
//! let mut solver = Solver::new();
//! solver.add_constraint(width.greater_or_equal(100.0))?;
//! solver.add_edit_variable(width, Strength::MEDIUM)?;
//! solver.suggest_value(width, 40.0)?;
//! assert_eq!(solver.value(width), 100.0);
//! ```

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::trace;

use super::constraint::{Constraint, RelationalOperator};
use super::expression::Expression;
use super::row::{near_zero, Row, Symbol, SymbolKind};
use super::strength::Strength;
use super::variable::Variable;
use crate::error::SolverError;

/// Symbols a constraint contributed to the tableau.
#[derive(Debug, Clone, Copy)]
struct Tag {
    marker: Symbol,
    other: Symbol,
}

#[derive(Debug, Clone)]
struct EditInfo {
    tag: Tag,
    constraint: Constraint,
    constant: f64,
}

#[derive(Clone, Copy)]
enum Objective {
    Main,
    Artificial,
}

/// Snapshot of variable values taken from a solver.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    values: FxHashMap<Variable, f64>,
}

impl Solution {
    /// Value of `variable`, `0.0` if the solver never saw it.
    pub fn value(&self, variable: Variable) -> f64 {
        self.values.get(&variable).copied().unwrap_or(0.0)
    }

    pub fn evaluate(&self, expression: &Expression) -> f64 {
        expression.evaluate(|v| self.value(v))
    }
}

/// Cassowary solver over [`Constraint`]s.
#[derive(Debug)]
pub struct Solver {
    cns: FxHashMap<Constraint, Tag>,
    rows: BTreeMap<Symbol, Row>,
    vars: FxHashMap<Variable, Symbol>,
    edits: FxHashMap<Variable, EditInfo>,
    infeasible: Vec<Symbol>,
    objective: Row,
    artificial: Option<Row>,
    next_id: usize,
    auto_solve: bool,
    dirty: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            cns: FxHashMap::default(),
            rows: BTreeMap::new(),
            vars: FxHashMap::default(),
            edits: FxHashMap::default(),
            infeasible: Vec::new(),
            objective: Row::new(0.0),
            artificial: None,
            next_id: 1,
            auto_solve: true,
            dirty: false,
        }
    }

    // =========================================================================
    // Public API
    // =========================================================================

    /// Add a constraint.
    ///
    /// Fails with [`SolverError::UnsatisfiableConstraint`] if a required
    /// constraint conflicts with the required constraints already present.
    /// The solver is left unchanged on failure.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        if self.cns.contains_key(&constraint) {
            return Err(SolverError::DuplicateConstraint);
        }

        let objective = self.objective.clone();
        let (mut row, tag) = self.create_row(&constraint);
        let mut subject = Self::choose_subject(&row, tag);

        if subject.is_invalid() && row.all_dummies() {
            if !near_zero(row.constant) {
                self.objective = objective;
                return Err(SolverError::UnsatisfiableConstraint);
            }
            subject = tag.marker;
        }

        if subject.is_invalid() {
            // A failed artificial pass leaves pivots behind; restore the
            // tableau so the solver stays at its last good state.
            let rows = self.rows.clone();
            if !self.add_with_artificial_variable(row)? {
                self.rows = rows;
                self.objective = objective;
                self.infeasible.clear();
                return Err(SolverError::UnsatisfiableConstraint);
            }
        } else {
            row.solve_for(subject);
            self.substitute(subject, &row);
            self.rows.insert(subject, row);
        }

        trace!(constraint = ?constraint, "added constraint");
        self.cns.insert(constraint, tag);
        self.settle()
    }

    /// Remove a constraint previously added.
    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let tag = self
            .cns
            .remove(constraint)
            .ok_or(SolverError::UnknownConstraint)?;

        self.remove_constraint_effects(constraint, tag);

        if self.rows.remove(&tag.marker).is_none() {
            let leaving = self
                .marker_leaving_row(tag.marker)
                .ok_or(SolverError::Internal("failed to find leaving row"))?;
            let mut row = self
                .rows
                .remove(&leaving)
                .ok_or(SolverError::Internal("leaving row vanished"))?;
            row.solve_for_pair(leaving, tag.marker);
            self.substitute(tag.marker, &row);
        }

        trace!(constraint = ?constraint, "removed constraint");
        self.settle()
    }

    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.cns.contains_key(constraint)
    }

    pub fn constraint_count(&self) -> usize {
        self.cns.len()
    }

    /// Make `variable` suggestible at `strength`, which must be below required.
    pub fn add_edit_variable(
        &mut self,
        variable: Variable,
        strength: Strength,
    ) -> Result<(), SolverError> {
        if self.edits.contains_key(&variable) {
            return Err(SolverError::DuplicateEditVariable);
        }
        let strength = strength.clipped();
        if strength.is_required() {
            return Err(SolverError::BadRequiredStrength);
        }

        let constraint = Constraint::new(
            Expression::from(variable),
            RelationalOperator::Equal,
            strength,
        );
        self.add_constraint(constraint.clone())?;
        let tag = *self
            .cns
            .get(&constraint)
            .ok_or(SolverError::Internal("edit constraint missing"))?;
        self.edits.insert(
            variable,
            EditInfo {
                tag,
                constraint,
                constant: 0.0,
            },
        );
        Ok(())
    }

    pub fn remove_edit_variable(&mut self, variable: Variable) -> Result<(), SolverError> {
        let info = self
            .edits
            .remove(&variable)
            .ok_or(SolverError::UnknownEditVariable)?;
        self.remove_constraint(&info.constraint)
    }

    pub fn has_edit_variable(&self, variable: Variable) -> bool {
        self.edits.contains_key(&variable)
    }

    /// Suggest a value for an edit variable and re-solve.
    pub fn suggest_value(&mut self, variable: Variable, value: f64) -> Result<(), SolverError> {
        // The dual simplex starts from an optimal tableau.
        if self.dirty {
            self.optimize(Objective::Main)?;
            self.dirty = false;
        }

        let info = self
            .edits
            .get_mut(&variable)
            .ok_or(SolverError::UnknownEditVariable)?;
        let delta = value - info.constant;
        info.constant = value;
        let tag = info.tag;

        if let Some(row) = self.rows.get_mut(&tag.marker) {
            if row.add(-delta) < 0.0 {
                self.infeasible.push(tag.marker);
            }
        } else if let Some(row) = self.rows.get_mut(&tag.other) {
            if row.add(delta) < 0.0 {
                self.infeasible.push(tag.other);
            }
        } else {
            for (&symbol, row) in self.rows.iter_mut() {
                let coefficient = row.coefficient_for(tag.marker);
                if coefficient != 0.0
                    && row.add(delta * coefficient) < 0.0
                    && symbol.kind != SymbolKind::External
                {
                    self.infeasible.push(symbol);
                }
            }
        }

        self.dual_optimize()
    }

    /// Toggle auto-solve. While off, additions and removals keep the tableau
    /// feasible but skip optimization; turning it back on optimizes once.
    pub fn set_auto_solve(&mut self, enabled: bool) -> Result<(), SolverError> {
        self.auto_solve = enabled;
        if enabled { self.solve() } else { Ok(()) }
    }

    pub fn auto_solve(&self) -> bool {
        self.auto_solve
    }

    /// Optimize pending changes, if any.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        if self.dirty {
            self.optimize(Objective::Main)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Current value of `variable`.
    pub fn value(&self, variable: Variable) -> f64 {
        self.vars
            .get(&variable)
            .and_then(|symbol| self.rows.get(symbol))
            .map_or(0.0, |row| row.constant)
    }

    /// Values of every known variable.
    pub fn solution(&self) -> Solution {
        Solution {
            values: self
                .vars
                .keys()
                .map(|&variable| (variable, self.value(variable)))
                .collect(),
        }
    }

    // =========================================================================
    // Tableau construction
    // =========================================================================

    fn symbol(&mut self, kind: SymbolKind) -> Symbol {
        let symbol = Symbol::new(self.next_id, kind);
        self.next_id += 1;
        symbol
    }

    fn var_symbol(&mut self, variable: Variable) -> Symbol {
        if let Some(&symbol) = self.vars.get(&variable) {
            return symbol;
        }
        let symbol = self.symbol(SymbolKind::External);
        self.vars.insert(variable, symbol);
        symbol
    }

    fn create_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let expression = constraint.expression();
        let strength = constraint.strength();
        let mut row = Row::new(expression.constant);

        for term in &expression.terms {
            if near_zero(term.coefficient) {
                continue;
            }
            let symbol = self.var_symbol(term.variable);
            match self.rows.get(&symbol) {
                Some(basic) => row.insert_row(basic, term.coefficient),
                None => row.insert_symbol(symbol, term.coefficient),
            }
        }

        let mut tag = Tag {
            marker: Symbol::invalid(),
            other: Symbol::invalid(),
        };

        match constraint.op() {
            RelationalOperator::LessOrEqual | RelationalOperator::GreaterOrEqual => {
                let coefficient = if constraint.op() == RelationalOperator::LessOrEqual {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.symbol(SymbolKind::Slack);
                tag.marker = slack;
                row.insert_symbol(slack, coefficient);
                if !strength.is_required() {
                    let error = self.symbol(SymbolKind::Error);
                    tag.other = error;
                    row.insert_symbol(error, -coefficient);
                    self.objective.insert_symbol(error, strength.value());
                }
            }
            RelationalOperator::Equal => {
                if strength.is_required() {
                    let dummy = self.symbol(SymbolKind::Dummy);
                    tag.marker = dummy;
                    row.insert_symbol(dummy, 1.0);
                } else {
                    let plus = self.symbol(SymbolKind::Error);
                    let minus = self.symbol(SymbolKind::Error);
                    tag.marker = plus;
                    tag.other = minus;
                    row.insert_symbol(plus, -1.0);
                    row.insert_symbol(minus, 1.0);
                    self.objective.insert_symbol(plus, strength.value());
                    self.objective.insert_symbol(minus, strength.value());
                }
            }
        }

        if row.constant < 0.0 {
            row.reverse_sign();
        }
        (row, tag)
    }

    fn choose_subject(row: &Row, tag: Tag) -> Symbol {
        if let Some(&symbol) = row
            .cells
            .keys()
            .find(|symbol| symbol.kind == SymbolKind::External)
        {
            return symbol;
        }
        for symbol in [tag.marker, tag.other] {
            if symbol.is_restricted_pivot() && row.coefficient_for(symbol) < 0.0 {
                return symbol;
            }
        }
        Symbol::invalid()
    }

    fn add_with_artificial_variable(&mut self, row: Row) -> Result<bool, SolverError> {
        let art = self.symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row);

        self.optimize(Objective::Artificial)?;
        let success = self
            .artificial
            .take()
            .is_some_and(|artificial| near_zero(artificial.constant));

        if let Some(mut row) = self.rows.remove(&art) {
            if row.cells.is_empty() {
                return Ok(success);
            }
            let Some(&entering) = row.cells.keys().find(|s| s.is_restricted_pivot()) else {
                return Ok(false);
            };
            row.solve_for_pair(art, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }

        for row in self.rows.values_mut() {
            row.remove(art);
        }
        self.objective.remove(art);
        Ok(success)
    }

    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        for (&basic, other) in self.rows.iter_mut() {
            other.substitute(symbol, row);
            if basic.kind != SymbolKind::External && other.constant < 0.0 {
                self.infeasible.push(basic);
            }
        }
        self.objective.substitute(symbol, row);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(symbol, row);
        }
    }

    // =========================================================================
    // Optimization
    // =========================================================================

    fn settle(&mut self) -> Result<(), SolverError> {
        if self.auto_solve {
            self.optimize(Objective::Main)
        } else {
            self.dirty = true;
            Ok(())
        }
    }

    fn objective_row(&self, objective: Objective) -> Option<&Row> {
        match objective {
            Objective::Main => Some(&self.objective),
            Objective::Artificial => self.artificial.as_ref(),
        }
    }

    /// Primal simplex on the given objective.
    fn optimize(&mut self, objective: Objective) -> Result<(), SolverError> {
        loop {
            let entering = self.objective_row(objective).and_then(|row| {
                row.cells
                    .iter()
                    .find(|(symbol, c)| symbol.kind != SymbolKind::Dummy && **c < 0.0)
                    .map(|(&symbol, _)| symbol)
            });
            let Some(entering) = entering else {
                return Ok(());
            };

            let leaving = self
                .leaving_row(entering)
                .ok_or(SolverError::Internal("objective is unbounded"))?;
            let mut row = self
                .rows
                .remove(&leaving)
                .ok_or(SolverError::Internal("leaving row vanished"))?;
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
    }

    fn leaving_row(&self, entering: Symbol) -> Option<Symbol> {
        let mut ratio = f64::MAX;
        let mut found = None;
        for (&symbol, row) in &self.rows {
            if symbol.kind == SymbolKind::External {
                continue;
            }
            let coefficient = row.coefficient_for(entering);
            if coefficient < 0.0 {
                let r = -row.constant / coefficient;
                if r < ratio {
                    ratio = r;
                    found = Some(symbol);
                }
            }
        }
        found
    }

    /// Dual simplex over the rows made infeasible by an edit.
    fn dual_optimize(&mut self) -> Result<(), SolverError> {
        while let Some(leaving) = self.infeasible.pop() {
            let entering = match self.rows.get(&leaving) {
                Some(row) if !near_zero(row.constant) && row.constant < 0.0 => {
                    self.dual_entering_symbol(row)
                }
                _ => continue,
            };
            let entering = entering.ok_or(SolverError::Internal("dual optimize failed"))?;
            let mut row = self
                .rows
                .remove(&leaving)
                .ok_or(SolverError::Internal("leaving row vanished"))?;
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
        Ok(())
    }

    fn dual_entering_symbol(&self, row: &Row) -> Option<Symbol> {
        let mut ratio = f64::MAX;
        let mut entering = None;
        for (&symbol, &c) in &row.cells {
            if c > 0.0 && symbol.kind != SymbolKind::Dummy {
                let r = self.objective.coefficient_for(symbol) / c;
                if r < ratio {
                    ratio = r;
                    entering = Some(symbol);
                }
            }
        }
        entering
    }

    // =========================================================================
    // Removal
    // =========================================================================

    fn remove_constraint_effects(&mut self, constraint: &Constraint, tag: Tag) {
        let strength = constraint.strength().value();
        for marker in [tag.marker, tag.other] {
            if marker.kind != SymbolKind::Error {
                continue;
            }
            match self.rows.get(&marker) {
                Some(row) => {
                    let row = row.clone();
                    self.objective.insert_row(&row, -strength);
                }
                None => self.objective.insert_symbol(marker, -strength),
            }
        }
    }

    fn marker_leaving_row(&self, marker: Symbol) -> Option<Symbol> {
        let mut r1 = f64::MAX;
        let mut r2 = f64::MAX;
        let mut first = None;
        let mut second = None;
        let mut third = None;
        for (&symbol, row) in &self.rows {
            let c = row.coefficient_for(marker);
            if c == 0.0 {
                continue;
            }
            if symbol.kind == SymbolKind::External {
                third = Some(symbol);
            } else if c < 0.0 {
                let r = -row.constant / c;
                if r < r1 {
                    r1 = r;
                    first = Some(symbol);
                }
            } else {
                let r = row.constant / c;
                if r < r2 {
                    r2 = r;
                    second = Some(symbol);
                }
            }
        }
        first.or(second).or(third)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_required_equalities() {
        let x = Variable::new();
        let y = Variable::new();
        let mut solver = Solver::new();

        solver.add_constraint(x.equal_to(20.0)).unwrap();
        solver.add_constraint((x + y).equal_to(50.0)).unwrap();

        assert!(close(solver.value(x), 20.0));
        assert!(close(solver.value(y), 30.0));
    }

    #[test]
    fn test_strengths_compete() {
        let x = Variable::new();
        let mut solver = Solver::new();

        solver
            .add_constraint(x.equal_to(10.0).with_strength(Strength::WEAK))
            .unwrap();
        solver
            .add_constraint(x.equal_to(30.0).with_strength(Strength::STRONG))
            .unwrap();

        assert!(close(solver.value(x), 30.0));
    }

    #[test]
    fn test_unsatisfiable_leaves_solver_usable() {
        let x = Variable::new();
        let mut solver = Solver::new();
        solver.add_constraint(x.greater_or_equal(10.0)).unwrap();

        let conflict = x.less_or_equal(5.0);
        assert_eq!(
            solver.add_constraint(conflict.clone()),
            Err(SolverError::UnsatisfiableConstraint)
        );
        assert!(!solver.has_constraint(&conflict));

        solver
            .add_constraint(x.equal_to(12.0).with_strength(Strength::MEDIUM))
            .unwrap();
        assert!(close(solver.value(x), 12.0));
    }

    #[test]
    fn test_remove_unknown_constraint() {
        let x = Variable::new();
        let mut solver = Solver::new();
        assert_eq!(
            solver.remove_constraint(&x.equal_to(1.0)),
            Err(SolverError::UnknownConstraint)
        );
    }

    #[test]
    fn test_remove_restores_previous_solution() {
        let x = Variable::new();
        let mut solver = Solver::new();
        solver
            .add_constraint(x.equal_to(10.0).with_strength(Strength::WEAK))
            .unwrap();

        let strong = x.equal_to(40.0).with_strength(Strength::STRONG);
        solver.add_constraint(strong.clone()).unwrap();
        assert!(close(solver.value(x), 40.0));

        solver.remove_constraint(&strong).unwrap();
        assert!(close(solver.value(x), 10.0));
    }

    #[test]
    fn test_edit_variable_suggestions() {
        let width = Variable::new();
        let mut solver = Solver::new();
        solver.add_constraint(width.greater_or_equal(100.0)).unwrap();
        solver.add_edit_variable(width, Strength::MEDIUM).unwrap();

        solver.suggest_value(width, 250.0).unwrap();
        assert!(close(solver.value(width), 250.0));

        solver.suggest_value(width, 40.0).unwrap();
        assert!(close(solver.value(width), 100.0));

        assert_eq!(
            solver.add_edit_variable(width, Strength::WEAK),
            Err(SolverError::DuplicateEditVariable)
        );
        solver.remove_edit_variable(width).unwrap();
        assert!(!solver.has_edit_variable(width));
    }

    #[test]
    fn test_required_edit_is_rejected() {
        let x = Variable::new();
        let mut solver = Solver::new();
        assert_eq!(
            solver.add_edit_variable(x, Strength::REQUIRED),
            Err(SolverError::BadRequiredStrength)
        );
        assert_eq!(
            solver.suggest_value(x, 1.0),
            Err(SolverError::UnknownEditVariable)
        );
    }

    #[test]
    fn test_batched_changes() {
        let x = Variable::new();
        let mut solver = Solver::new();
        solver.set_auto_solve(false).unwrap();
        solver
            .add_constraint(x.equal_to(5.0).with_strength(Strength::WEAK))
            .unwrap();
        solver
            .add_constraint(x.greater_or_equal(7.0).with_strength(Strength::STRONG))
            .unwrap();
        solver.set_auto_solve(true).unwrap();

        assert!(close(solver.value(x), 7.0));
        assert!(close(solver.solution().value(x), 7.0));
    }
}
