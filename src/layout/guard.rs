//! Reentrancy guard for layout passes.

use std::cell::Cell;

/// Allows one active entry at a time.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    active: Cell<bool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the guarded section, or `None` if it is already entered.
    /// The section is left when the token drops, including on early return.
    pub fn enter(&self) -> Option<GuardToken<'_>> {
        if self.active.replace(true) {
            return None;
        }
        Some(GuardToken(&self.active))
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

#[must_use]
pub struct GuardToken<'a>(&'a Cell<bool>);

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
