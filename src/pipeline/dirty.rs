//! Per-component dirty flags.

bitflags::bitflags! {
    /// Pending work on a component.
    ///
    /// Combine with bitwise OR: `Dirty::CONSTRAINTS | Dirty::LAYOUT`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        const NONE = 0;
        /// User constraints must be pushed to the solver again.
        const CONSTRAINTS = 1 << 0;
        /// Geometry must be recomputed and assigned to the children.
        const LAYOUT = 1 << 1;
    }
}
