//! Live component tree.
//!
//! A [`Component`] is one instantiated widget: its attribute [`Object`], its
//! [`BoxModel`], and (once it has children) a [`ConstraintsLayout`] that
//! places those children. Work is never done inline. Mutations set a
//! [`Dirty`] flag and hand an if-needed task to the host [`Scheduler`];
//! the task re-checks the flag, so a burst of invalidations costs one pass.
//!
//! ```text
//! set_constraints ──> CONSTRAINTS ──task──> update_constraints ─┐
//!                 └─> LAYOUT ───────task──> do_layout <─────────┘
//!                                              │
//!                        child.set_geometry <──┘ (resized child containers
//!                                                 are marked LAYOUT)
//! ```
//!
//! Each container's solver holds:
//! - its own `width >= 0`, `height >= 0`;
//! - per child, containment and size-hint constraints;
//! - the container's user constraints.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::object::Object;
use crate::binding::{BindingHandle, Subscription};
use crate::compiler::{WidgetAdapter, WidgetClass};
use crate::error::LayoutError;
use crate::layout::{
    container_constraints, containment_constraints, size_hint_constraints, BoxModel,
    ConstraintsLayout, LayoutConfig, SizePolicy,
};
use crate::pipeline::{Dirty, Scheduler};
use crate::solver::{Constraint, Strength};
use crate::types::{Geometry, Size, Value};

const POLICY_ATTRIBUTES: [&str; 4] = ["hug_width", "hug_height", "compress_width", "compress_height"];

/// Pass counters, mostly for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub constraint_passes: usize,
    pub layout_passes: usize,
}

/// What every component of one view shares.
#[derive(Clone)]
pub struct Host {
    pub scheduler: Rc<dyn Scheduler>,
    pub config: LayoutConfig,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").field("config", &self.config).finish()
    }
}

pub struct Component {
    this: Weak<Component>,
    class: Rc<WidgetClass>,
    identifier: Option<String>,
    object: Object,
    model: BoxModel,
    layout: ConstraintsLayout,
    adapter: Rc<dyn WidgetAdapter>,
    host: Host,

    dirty: Cell<Dirty>,
    live: Cell<bool>,
    size: Cell<Size>,
    geometry: Cell<Option<Geometry>>,

    parent: RefCell<Weak<Component>>,
    children: RefCell<Vec<Rc<Component>>>,
    metas: RefCell<Vec<Object>>,

    /// Constraints set by the user, and the copy currently in the solver.
    user_constraints: RefCell<Vec<Constraint>>,
    applied_constraints: RefCell<Vec<Constraint>>,
    /// This component's contributions to its parent's solver.
    containment: RefCell<Vec<Constraint>>,
    hint_constraints: RefCell<Vec<Constraint>>,

    bindings: RefCell<Vec<BindingHandle>>,
    watchers: RefCell<Vec<Subscription>>,
    stats: Cell<PassStats>,
}

impl Component {
    pub fn new(class: Rc<WidgetClass>, identifier: Option<String>, host: Host) -> Rc<Self> {
        let component = Rc::new_cyclic(|this| {
            let object = class.create_object();
            let adapter = class.create_adapter(&object);
            Self {
                this: this.clone(),
                class,
                identifier,
                object,
                model: BoxModel::new(),
                layout: ConstraintsLayout::new(),
                adapter,
                host,
                dirty: Cell::new(Dirty::NONE),
                live: Cell::new(false),
                size: Cell::new(Size::default()),
                geometry: Cell::new(None),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                metas: RefCell::new(Vec::new()),
                user_constraints: RefCell::new(Vec::new()),
                applied_constraints: RefCell::new(Vec::new()),
                containment: RefCell::new(Vec::new()),
                hint_constraints: RefCell::new(Vec::new()),
                bindings: RefCell::new(Vec::new()),
                watchers: RefCell::new(Vec::new()),
                stats: Cell::new(PassStats::default()),
            }
        });
        component.watch_size_hint();
        component
    }

    /// Re-derive size constraints when the policy or the hint inputs change.
    fn watch_size_hint(&self) {
        let names = POLICY_ATTRIBUTES
            .iter()
            .map(|s| s.to_string())
            .chain(self.class.hint_attributes().iter().cloned())
            .filter(|name| self.class.has_attribute(name));
        let watchers = names
            .map(|name| {
                let this = self.this.clone();
                Subscription::new(&self.object, &name, move |_| {
                    if let Some(component) = this.upgrade() {
                        component.size_hint_updated();
                    }
                })
            })
            .collect();
        *self.watchers.borrow_mut() = watchers;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn class(&self) -> &Rc<WidgetClass> {
        &self.class
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Identifier, or the class name for anonymous components.
    pub fn label(&self) -> &str {
        self.identifier.as_deref().unwrap_or(self.class.name())
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn model(&self) -> &BoxModel {
        &self.model
    }

    pub fn layout(&self) -> &ConstraintsLayout {
        &self.layout
    }

    pub fn adapter(&self) -> &Rc<dyn WidgetAdapter> {
        &self.adapter
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty.get()
    }

    /// Whether [`initialize_layout`](Self::initialize_layout) has run.
    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Size the component's own solver lays out for.
    pub fn size(&self) -> Size {
        self.size.get()
    }

    /// Last geometry assigned to the adapter, in the parent's coordinates.
    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry.get()
    }

    pub fn stats(&self) -> PassStats {
        self.stats.get()
    }

    pub fn parent(&self) -> Option<Rc<Component>> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<Rc<Component>> {
        self.children.borrow().clone()
    }

    pub fn has_children(&self) -> bool {
        !self.children.borrow().is_empty()
    }

    pub fn metas(&self) -> Vec<Object> {
        self.metas.borrow().clone()
    }

    pub fn add_meta(&self, meta: Object) {
        self.metas.borrow_mut().push(meta);
    }

    /// Keep a live binding connected for as long as this component exists.
    pub fn retain_binding(&self, handle: BindingHandle) {
        if handle.is_live() {
            self.bindings.borrow_mut().push(handle);
        }
    }

    /// Search this subtree, depth first, for `identifier`.
    pub fn find(&self, identifier: &str) -> Option<Rc<Component>> {
        if self.identifier() == Some(identifier) {
            return self.this.upgrade();
        }
        self.children
            .borrow()
            .iter()
            .find_map(|child| child.find(identifier))
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        self.user_constraints.borrow().clone()
    }

    /// Size hint reported to the parent. A container reports its minimum
    /// size; a leaf asks its adapter.
    pub fn size_hint(&self) -> Size {
        if self.layout.is_initialized() {
            if let Ok(size) = self.min_size() {
                return size;
            }
        }
        self.adapter.size_hint()
    }

    pub fn size_policy(&self) -> SizePolicy {
        let defaults = SizePolicy::default();
        SizePolicy {
            hug_width: self.strength_attribute("hug_width", defaults.hug_width),
            hug_height: self.strength_attribute("hug_height", defaults.hug_height),
            compress_width: self.strength_attribute("compress_width", defaults.compress_width),
            compress_height: self.strength_attribute("compress_height", defaults.compress_height),
        }
    }

    fn strength_attribute(&self, name: &str, default: Option<Strength>) -> Option<Strength> {
        let Some(Value::Str(value)) = self.object.get(name) else {
            return default;
        };
        Strength::from_name(&value).unwrap_or_else(|| {
            warn!(component = %self.label(), attribute = name, value = %value, "unknown strength name");
            default
        })
    }

    // =========================================================================
    // Tree construction
    // =========================================================================

    /// Attach `child`. On a live component the child's subtree is
    /// initialized and its constraints are added to the running solver.
    pub fn add_child(&self, child: Rc<Component>) -> Result<(), LayoutError> {
        if !self.live.get() {
            self.link_child(child);
            return Ok(());
        }
        self.link_child(Rc::clone(&child));

        let result = child.initialize_layout().and_then(|()| {
            if self.layout.is_initialized() {
                let added = child.contributed_constraints(&self.model);
                self.layout.update_constraints(&[], &added)
            } else {
                self.initialize_own_layout()
            }
        });
        if let Err(err) = result {
            self.children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, &child));
            *child.parent.borrow_mut() = Weak::new();
            return Err(err);
        }

        trace!(parent = %self.label(), child = %child.label(), "child added");
        self.update_size_bounds();
        self.set_needs_layout();
        self.size_hint_updated();
        Ok(())
    }

    /// Attach `child` without touching any solver. The tree is built this
    /// way before [`initialize_layout`](Self::initialize_layout) runs.
    pub fn link_child(&self, child: Rc<Component>) {
        *child.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().push(child);
    }

    /// Build the solvers of this subtree, children first so container
    /// size hints are available to their parents.
    pub fn initialize_layout(&self) -> Result<(), LayoutError> {
        if self.live.get() {
            return Ok(());
        }
        for child in self.children() {
            child.initialize_layout()?;
        }
        if self.has_children() {
            self.initialize_own_layout()?;
        }
        self.dirty.set(Dirty::NONE);
        self.live.set(true);
        Ok(())
    }

    fn initialize_own_layout(&self) -> Result<(), LayoutError> {
        let mut constraints = container_constraints(&self.model);
        for child in self.children() {
            constraints.extend(child.contributed_constraints(&self.model));
        }
        let user = self.constraints();
        constraints.extend(user.iter().cloned());

        self.layout.initialize(&constraints)?;
        *self.applied_constraints.borrow_mut() = user;
        debug!(
            component = %self.label(),
            constraints = constraints.len(),
            "layout initialized"
        );
        self.update_size_bounds();
        Ok(())
    }

    /// Containment plus size-hint constraints this component feeds its
    /// parent's solver. Remembered so they can be replaced later.
    fn contributed_constraints(&self, parent: &BoxModel) -> Vec<Constraint> {
        let containment = containment_constraints(parent, &self.model);
        let hints = size_hint_constraints(&self.model, self.size_hint(), &self.size_policy());
        let all = containment.iter().chain(hints.iter()).cloned().collect();
        *self.containment.borrow_mut() = containment;
        *self.hint_constraints.borrow_mut() = hints;
        all
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Replace the user constraints. On a live component this schedules a
    /// constraint update followed by a layout.
    pub fn set_constraints(&self, constraints: Vec<Constraint>) {
        *self.user_constraints.borrow_mut() = constraints;
        if self.live.get() {
            self.set_needs_update_constraints();
            self.set_needs_layout();
        }
    }

    pub fn set_needs_update_constraints(&self) {
        self.dirty.set(self.dirty.get() | Dirty::CONSTRAINTS);
        self.schedule(|component| {
            if component.dirty().contains(Dirty::CONSTRAINTS) {
                if let Err(err) = component.update_constraints() {
                    warn!(component = %component.label(), error = %err, "constraint update failed");
                }
            }
        });
    }

    pub fn set_needs_layout(&self) {
        self.dirty.set(self.dirty.get() | Dirty::LAYOUT);
        self.schedule(|component| {
            if component.dirty().contains(Dirty::LAYOUT) {
                if let Err(err) = component.do_layout() {
                    warn!(component = %component.label(), error = %err, "layout pass failed");
                }
            }
        });
    }

    /// Queue `task` for a live container. Leaves and components that are
    /// still being built only keep the flag.
    fn schedule(&self, task: fn(&Component)) {
        if !self.live.get() || !self.has_children() {
            return;
        }
        let this = self.this.clone();
        self.host.scheduler.invoke_later(Box::new(move || {
            if let Some(component) = this.upgrade() {
                task(&component);
            }
        }));
    }

    /// The size hint or size policy changed: ask the parent to rebuild this
    /// component's size constraints.
    pub fn size_hint_updated(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        if !parent.live.get() {
            return;
        }
        let parent = Rc::downgrade(&parent);
        let child = self.this.clone();
        self.host.scheduler.invoke_later(Box::new(move || {
            let (Some(parent), Some(child)) = (parent.upgrade(), child.upgrade()) else {
                return;
            };
            if let Err(err) = parent.update_size_constraints(&child) {
                warn!(
                    component = %parent.label(),
                    child = %child.label(),
                    error = %err,
                    "size constraint update failed"
                );
            }
        }));
    }

    // =========================================================================
    // Passes
    // =========================================================================

    /// Push the user constraints through the solver, then recurse.
    pub fn update_constraints(&self) -> Result<(), LayoutError> {
        self.dirty.set(self.dirty.get() - Dirty::CONSTRAINTS);
        let mut stats = self.stats.get();
        stats.constraint_passes += 1;
        self.stats.set(stats);

        if self.layout.is_initialized() {
            let old = self.applied_constraints.borrow().clone();
            let new = self.constraints();
            self.layout.update_constraints(&old, &new)?;
            *self.applied_constraints.borrow_mut() = new;
            self.update_size_bounds();
            self.size_hint_updated();
        }
        for child in self.children() {
            child.update_constraints()?;
        }
        Ok(())
    }

    /// Solve for the current size and assign every child its geometry.
    pub fn do_layout(&self) -> Result<(), LayoutError> {
        self.dirty.set(self.dirty.get() - Dirty::LAYOUT);
        if !self.layout.is_initialized() {
            return Ok(());
        }

        let children = self.children();
        let mut resolved = Vec::with_capacity(children.len());
        let ran = self.layout.layout(
            self.model.width,
            self.model.height,
            self.size.get(),
            self.host.config.resize(),
            |solution| resolved.extend(children.iter().map(|c| c.model.resolve(solution))),
        )?;
        if !ran {
            return Ok(());
        }

        let mut stats = self.stats.get();
        stats.layout_passes += 1;
        self.stats.set(stats);
        debug!(
            component = %self.label(),
            width = self.size.get().width,
            height = self.size.get().height,
            children = children.len(),
            "layout pass"
        );

        for (child, geometry) in children.iter().zip(resolved) {
            child.apply_geometry(geometry);
        }
        Ok(())
    }

    fn apply_geometry(&self, geometry: Geometry) {
        let previous = self.geometry.replace(Some(geometry));
        self.adapter.set_geometry(geometry);
        let resized = previous.is_none_or(|p| p.size() != geometry.size());
        if resized {
            self.size.set(geometry.size());
            if self.has_children() {
                self.set_needs_layout();
            }
        }
    }

    /// Set the size of a top-level component and schedule a layout.
    pub fn resize(&self, size: Size) {
        let geometry = Geometry::new(0.0, 0.0, size.width, size.height);
        self.geometry.set(Some(geometry));
        self.size.set(size);
        self.adapter.set_geometry(geometry);
        self.set_needs_layout();
    }

    /// Rebuild `child`'s size-hint constraints in this component's solver.
    pub fn update_size_constraints(&self, child: &Component) -> Result<(), LayoutError> {
        if !self.layout.is_initialized() {
            return Ok(());
        }
        let old = child.hint_constraints.take();
        let new = size_hint_constraints(&child.model, child.size_hint(), &child.size_policy());
        if let Err(err) = self.layout.update_constraints(&old, &new) {
            *child.hint_constraints.borrow_mut() = old;
            return Err(err);
        }
        *child.hint_constraints.borrow_mut() = new;

        self.update_size_bounds();
        self.set_needs_layout();
        // Our own minimum may have moved with the child's.
        self.size_hint_updated();
        Ok(())
    }

    // =========================================================================
    // Size probes
    // =========================================================================

    pub fn min_size(&self) -> Result<Size, LayoutError> {
        self.layout
            .min_size(self.model.width, self.model.height, self.host.config.probe())
    }

    /// Maximum size; unbounded dimensions are [`UNBOUNDED`](crate::layout::UNBOUNDED).
    pub fn max_size(&self) -> Result<Size, LayoutError> {
        self.layout
            .max_size(self.model.width, self.model.height, self.host.config.probe())
    }

    fn update_size_bounds(&self) {
        match self.min_size().and_then(|min| Ok((min, self.max_size()?))) {
            Ok((min, max)) => {
                self.adapter.set_min_size(min);
                self.adapter.set_max_size(max);
            }
            Err(err) => {
                warn!(component = %self.label(), error = %err, "size probe failed");
            }
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("class", &self.class.name())
            .field("identifier", &self.identifier)
            .field("dirty", &self.dirty.get())
            .field("geometry", &self.geometry.get())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}
