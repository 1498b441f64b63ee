//! Constraints a container generates for itself and its children.

use super::box_model::BoxModel;
use crate::solver::{Constraint, Strength};
use crate::types::Size;

/// How firmly a widget holds its size hint, per dimension.
///
/// Hugging keeps the widget from growing past the hint, compression
/// resistance keeps it from shrinking below it. `None` means the hint is
/// ignored in that direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePolicy {
    pub hug_width: Option<Strength>,
    pub hug_height: Option<Strength>,
    pub compress_width: Option<Strength>,
    pub compress_height: Option<Strength>,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            hug_width: Some(Strength::STRONG),
            hug_height: Some(Strength::STRONG),
            compress_width: Some(Strength::STRONG),
            compress_height: Some(Strength::STRONG),
        }
    }
}

/// Size-hint constraints for one child. Negative hints mean "no hint".
pub fn size_hint_constraints(model: &BoxModel, hint: Size, policy: &SizePolicy) -> Vec<Constraint> {
    let mut cns = Vec::with_capacity(4);
    let dims = [
        (model.width, hint.width, policy.hug_width, policy.compress_width),
        (model.height, hint.height, policy.hug_height, policy.compress_height),
    ];
    for (variable, value, hug, compress) in dims {
        if value < 0.0 {
            continue;
        }
        if let Some(strength) = hug {
            cns.push(variable.equal_to(value).with_strength(strength));
        }
        if let Some(strength) = compress {
            cns.push(variable.greater_or_equal(value).with_strength(strength));
        }
    }
    cns
}

/// Non-negative size for a container's own box.
pub fn container_constraints(model: &BoxModel) -> Vec<Constraint> {
    vec![
        model.width.greater_or_equal(0.0),
        model.height.greater_or_equal(0.0),
    ]
}

/// Keep `child` inside `parent`, in the parent's coordinates.
pub fn containment_constraints(parent: &BoxModel, child: &BoxModel) -> Vec<Constraint> {
    vec![
        child.left.greater_or_equal(0.0),
        child.top.greater_or_equal(0.0),
        child.right().less_or_equal(parent.width),
        child.bottom().less_or_equal(parent.height),
        child.width.greater_or_equal(0.0),
        child.height.greater_or_equal(0.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::RelationalOperator;

    #[test]
    fn test_hint_constraints_follow_policy() {
        let model = BoxModel::new();
        let policy = SizePolicy {
            hug_width: None,
            ..SizePolicy::default()
        };
        let cns = size_hint_constraints(&model, Size::new(80.0, 24.0), &policy);

        assert_eq!(cns.len(), 3);
        assert_eq!(cns[0].op(), RelationalOperator::GreaterOrEqual);
        assert_eq!(cns[1].op(), RelationalOperator::Equal);
        assert!(cns.iter().all(|c| c.strength() == Strength::STRONG));
    }

    #[test]
    fn test_negative_hint_is_skipped() {
        let model = BoxModel::new();
        let cns = size_hint_constraints(&model, Size::new(-1.0, 24.0), &SizePolicy::default());
        assert_eq!(cns.len(), 2);
    }
}
