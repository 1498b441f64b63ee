//! Constraint Layout
//!
//! Every widget owns a [`BoxModel`] of four solver variables. Every container
//! owns a [`ConstraintsLayout`] whose solver relates its own box to the boxes
//! of its children:
//!
//! ```text
//! container.width ──┐
//! container.height ─┼─> Solver ──> child geometry ──> WidgetAdapter
//! child boxes ──────┘      ^
//! user + size-hint cns ────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_view::layout::{BoxModel, ConstraintsLayout, Suggestion};
//! use spark_view::Size;
//!
//! let outer = BoxModel::new();
//! let inner = BoxModel::new();
//! let layout = ConstraintsLayout::new();
//! layout.initialize(&[inner.left.equal_to(10.0), inner.right().equal_to(outer.width - 10.0)])?;
//! layout.layout(outer.width, outer.height, Size::new(200.0, 100.0), Suggestion::default(), |s| {
//!     assert_eq!(inner.resolve(s).width, 180.0);
//! })?;
//! ```

mod box_model;
mod config;
mod constraints_layout;
mod guard;
mod size_constraints;

pub use box_model::BoxModel;
pub use config::{LayoutConfig, Suggestion};
pub use constraints_layout::{ConstraintsLayout, MAX_SIZE_SENTINEL, UNBOUNDED};
pub use guard::{GuardToken, ReentrancyGuard};
pub use size_constraints::{
    container_constraints, containment_constraints, size_hint_constraints, SizePolicy,
};
