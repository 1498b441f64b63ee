//! Layout tuning knobs.

use serde::{Deserialize, Serialize};

use crate::solver::Strength;

/// Edit strength and weight pair used for one kind of suggestion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion {
    pub strength: Strength,
    pub weight: f64,
}

impl Suggestion {
    pub const fn new(strength: Strength, weight: f64) -> Self {
        Self { strength, weight }
    }

    /// Effective edit strength.
    pub fn strength(&self) -> Strength {
        self.strength.weighted(self.weight)
    }
}

impl Default for Suggestion {
    fn default() -> Self {
        Self::new(Strength::MEDIUM, 1.0)
    }
}

/// Strengths used when a container drives its own solver.
///
/// Resizes suggest the container size at `resize_*`. Min/max probes use
/// the much lower `probe_*` so author constraints at medium strength win.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub resize_strength: Strength,
    pub resize_weight: f64,
    pub probe_strength: Strength,
    pub probe_weight: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            resize_strength: Strength::MEDIUM,
            resize_weight: 1.0,
            probe_strength: Strength::MEDIUM,
            probe_weight: 0.1,
        }
    }
}

impl LayoutConfig {
    pub fn resize(&self) -> Suggestion {
        Suggestion::new(self.resize_strength, self.resize_weight)
    }

    pub fn probe(&self) -> Suggestion {
        Suggestion::new(self.probe_strength, self.probe_weight)
    }
}
