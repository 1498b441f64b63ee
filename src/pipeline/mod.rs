//! View Pipeline
//!
//! Connects the compiler, the component tree and the host:
//!
//! ```text
//! Document ──ViewFactory::new──> CompiledView ──instantiate──> View
//!                                                               │
//!      host Scheduler <── if-needed tasks <── Dirty flags <─────┘
//! ```
//!
//! ## Key Design Principles
//!
//! - **Explicit host**: toolkit, modules, factories and scheduler are passed
//!   in through [`FactoryConfig`]; nothing is global.
//! - **Deferred passes**: invalidation sets [`Dirty`] flags and schedules
//!   work; passes run when the host drains its [`Scheduler`].

mod dirty;
mod scheduler;
mod view;

pub use dirty::Dirty;
pub use scheduler::{Scheduler, Task, TaskQueue};
pub use view::{FactoryConfig, View, ViewFactory};
