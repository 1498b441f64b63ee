//! Tableau rows and internal symbols.

use std::collections::BTreeMap;

const EPSILON: f64 = 1.0e-8;

pub(super) fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) enum SymbolKind {
    Invalid,
    External,
    Slack,
    Error,
    Dummy,
}

/// Tableau column. Ordered by creation so pivot choices are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) struct Symbol {
    id: usize,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: usize, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub fn invalid() -> Self {
        Self {
            id: 0,
            kind: SymbolKind::Invalid,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == SymbolKind::Invalid
    }

    /// Slack and error symbols may be pivoted into the basis freely.
    pub fn is_restricted_pivot(&self) -> bool {
        matches!(self.kind, SymbolKind::Slack | SymbolKind::Error)
    }
}

/// `basic = constant + sum(coefficient * symbol)`.
#[derive(Debug, Clone, Default)]
pub(super) struct Row {
    pub cells: BTreeMap<Symbol, f64>,
    pub constant: f64,
}

impl Row {
    pub fn new(constant: f64) -> Self {
        Self {
            cells: BTreeMap::new(),
            constant,
        }
    }

    /// Add to the constant, returning the new constant.
    pub fn add(&mut self, value: f64) -> f64 {
        self.constant += value;
        self.constant
    }

    /// Accumulate `coefficient * symbol`, dropping the cell if it cancels.
    pub fn insert_symbol(&mut self, symbol: Symbol, coefficient: f64) {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if near_zero(*entry) {
            self.cells.remove(&symbol);
        }
    }

    /// Accumulate `coefficient * other`.
    pub fn insert_row(&mut self, other: &Row, coefficient: f64) {
        self.constant += other.constant * coefficient;
        for (&symbol, &c) in &other.cells {
            self.insert_symbol(symbol, c * coefficient);
        }
    }

    pub fn remove(&mut self, symbol: Symbol) {
        self.cells.remove(&symbol);
    }

    pub fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for c in self.cells.values_mut() {
            *c = -*c;
        }
    }

    /// Rewrite `0 = row` as `symbol = row'`.
    pub fn solve_for(&mut self, symbol: Symbol) {
        let Some(c) = self.cells.remove(&symbol) else {
            return;
        };
        let coefficient = -1.0 / c;
        self.constant *= coefficient;
        for value in self.cells.values_mut() {
            *value *= coefficient;
        }
    }

    /// Rewrite `lhs = row` as `rhs = row'`.
    pub fn solve_for_pair(&mut self, lhs: Symbol, rhs: Symbol) {
        self.insert_symbol(lhs, -1.0);
        self.solve_for(rhs);
    }

    pub fn coefficient_for(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Replace `symbol` with the expression in `row`.
    pub fn substitute(&mut self, symbol: Symbol, row: &Row) {
        if let Some(c) = self.cells.remove(&symbol) {
            self.insert_row(row, c);
        }
    }

    pub fn all_dummies(&self) -> bool {
        self.cells.keys().all(|s| s.kind == SymbolKind::Dummy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_for() {
        let x = Symbol::new(1, SymbolKind::External);
        let s = Symbol::new(2, SymbolKind::Slack);

        // 0 = 10 - 2x + s  =>  x = 5 + 0.5s
        let mut row = Row::new(10.0);
        row.insert_symbol(x, -2.0);
        row.insert_symbol(s, 1.0);
        row.solve_for(x);

        assert_eq!(row.constant, 5.0);
        assert_eq!(row.coefficient_for(s), 0.5);
        assert_eq!(row.coefficient_for(x), 0.0);
    }

    #[test]
    fn test_insert_cancels() {
        let x = Symbol::new(1, SymbolKind::External);
        let mut row = Row::new(0.0);
        row.insert_symbol(x, 1.0);
        row.insert_symbol(x, -1.0);
        assert!(row.cells.is_empty());
    }
}
