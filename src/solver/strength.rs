//! Constraint strengths.
//!
//! A strength folds a priority tier and a weight into one number:
//! `strong * 1e6 + medium * 1e3 + weak`, each tier clipped to `[0, 1000]`
//! after the weight is applied. Any amount of a higher tier beats any amount
//! of a lower one, and the weight breaks ties inside a tier.

use serde::{Deserialize, Serialize};

/// Priority of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strength(f64);

impl Strength {
    pub const REQUIRED: Strength = Strength(1_001_001_000.0);
    pub const STRONG: Strength = Strength(1_000_000.0);
    pub const MEDIUM: Strength = Strength(1_000.0);
    pub const WEAK: Strength = Strength(1.0);

    /// Build a strength from its three tiers and a weight.
    pub fn new(strong: f64, medium: f64, weak: f64, weight: f64) -> Self {
        let tier = |v: f64| (v * weight).clamp(0.0, 1000.0);
        Strength(tier(strong) * 1_000_000.0 + tier(medium) * 1_000.0 + tier(weak))
    }

    /// Scale each tier by `weight`. The result stays below the tier above
    /// its highest non-zero tier, and required stays required.
    pub fn weighted(self, weight: f64) -> Self {
        if self.is_required() {
            return self;
        }
        let (strong, medium, weak) = self.tiers();
        let ceiling = if strong > 0.0 {
            Self::REQUIRED.0
        } else if medium > 0.0 {
            Self::STRONG.0
        } else {
            Self::MEDIUM.0
        };
        let scaled = Strength::new(strong, medium, weak, weight);
        Strength(scaled.0.min(ceiling - 1.0))
    }

    /// Split into `(strong, medium, weak)` tier amounts.
    fn tiers(self) -> (f64, f64, f64) {
        let strong = (self.0 / 1_000_000.0).floor().min(1000.0);
        let rest = self.0 - strong * 1_000_000.0;
        let medium = (rest / 1_000.0).floor().min(1000.0);
        (strong, medium, rest - medium * 1_000.0)
    }

    /// Clamp into the valid range `[0, REQUIRED]`.
    pub fn clipped(self) -> Self {
        Strength(self.0.clamp(0.0, Self::REQUIRED.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_required(self) -> bool {
        self.0 >= Self::REQUIRED.0
    }

    /// Parse a strength name. `"ignore"` yields `None`: the constraint
    /// should not be generated at all.
    pub fn from_name(name: &str) -> Option<Option<Self>> {
        match name {
            "ignore" => Some(None),
            "weak" => Some(Some(Self::WEAK)),
            "medium" => Some(Some(Self::MEDIUM)),
            "strong" => Some(Some(Self::STRONG)),
            "required" => Some(Some(Self::REQUIRED)),
            _ => None,
        }
    }

    /// Name of a standard strength, if it is one.
    pub fn name(self) -> Option<&'static str> {
        if self == Self::WEAK {
            Some("weak")
        } else if self == Self::MEDIUM {
            Some("medium")
        } else if self == Self::STRONG {
            Some("strong")
        } else if self == Self::REQUIRED {
            Some("required")
        } else {
            None
        }
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::REQUIRED
    }
}
