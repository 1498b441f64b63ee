//! Widget registry and the native-widget boundary.
//!
//! A [`Toolkit`] maps widget names from the markup to [`WidgetClass`]es.
//! Each class declares its role, its attributes with default values, and
//! how to build the [`WidgetAdapter`] that stands in for the native widget.
//!
//! ```ignore
//! let toolkit = Toolkit::headless().with_class(
//!     WidgetClass::component("Badge")
//!         .attribute("text", "")
//!         .measure(&["text"], |obj| Size::new(text_width(obj), 18.0)),
//! );
//! let ctor = toolkit.create_ctor("Badge")?;
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::constructor::ConstructorNode;
use crate::engine::{Object, WeakObject};
use crate::error::CompileError;
use crate::types::{Geometry, Size, Value};

/// No size hint in either dimension.
pub const NO_HINT: Size = Size::new(-1.0, -1.0);

// =============================================================================
// Adapter boundary
// =============================================================================

/// What a component needs from the widget it drives.
///
/// Negative size-hint dimensions mean "no preference".
pub trait WidgetAdapter {
    fn size_hint(&self) -> Size;

    fn set_geometry(&self, geometry: Geometry);

    fn set_min_size(&self, _size: Size) {}

    fn set_max_size(&self, _size: Size) {}
}

/// Computes a size hint from a widget's attributes.
pub type Measure = Rc<dyn Fn(&Object) -> Size>;

/// Builds the adapter for a freshly created widget object.
pub type AdapterFactory = Rc<dyn Fn(&Object, Measure) -> Rc<dyn WidgetAdapter>>;

/// Adapter that records what it is told instead of driving a native widget.
pub struct HeadlessAdapter {
    object: WeakObject,
    measure: Measure,
    geometry: Cell<Option<Geometry>>,
    min_size: Cell<Option<Size>>,
    max_size: Cell<Option<Size>>,
    geometry_updates: Cell<usize>,
}

impl HeadlessAdapter {
    pub fn new(object: &Object, measure: Measure) -> Self {
        Self {
            object: object.downgrade(),
            measure,
            geometry: Cell::new(None),
            min_size: Cell::new(None),
            max_size: Cell::new(None),
            geometry_updates: Cell::new(0),
        }
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry.get()
    }

    pub fn min_size(&self) -> Option<Size> {
        self.min_size.get()
    }

    pub fn max_size(&self) -> Option<Size> {
        self.max_size.get()
    }

    /// How often `set_geometry` has been called.
    pub fn geometry_updates(&self) -> usize {
        self.geometry_updates.get()
    }
}

impl WidgetAdapter for HeadlessAdapter {
    fn size_hint(&self) -> Size {
        self.object
            .upgrade()
            .map_or(NO_HINT, |object| (self.measure)(&object))
    }

    fn set_geometry(&self, geometry: Geometry) {
        self.geometry.set(Some(geometry));
        self.geometry_updates.set(self.geometry_updates.get() + 1);
    }

    fn set_min_size(&self, size: Size) {
        self.min_size.set(Some(size));
    }

    fn set_max_size(&self, size: Size) {
        self.max_size.set(Some(size));
    }
}

impl fmt::Debug for HeadlessAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessAdapter")
            .field("geometry", &self.geometry.get())
            .field("min_size", &self.min_size.get())
            .field("max_size", &self.max_size.get())
            .finish()
    }
}

// =============================================================================
// Widget classes
// =============================================================================

/// Where a class may appear in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetRole {
    /// Regular element: gets a box model and takes part in layout.
    Component,
    /// Metadata attached to the enclosing element.
    Meta,
}

impl WidgetRole {
    pub fn describe(self) -> &'static str {
        match self {
            WidgetRole::Component => "an element",
            WidgetRole::Meta => "a meta",
        }
    }
}

/// Attributes every component class declares.
const COMPONENT_ATTRIBUTES: [(&str, &str); 4] = [
    ("hug_width", "strong"),
    ("hug_height", "strong"),
    ("compress_width", "strong"),
    ("compress_height", "strong"),
];

/// Describes one kind of widget.
#[derive(Clone)]
pub struct WidgetClass {
    name: String,
    role: WidgetRole,
    attributes: Vec<(String, Value)>,
    hint_attributes: Vec<String>,
    measure: Measure,
    adapter: AdapterFactory,
}

impl WidgetClass {
    /// Component class with the common attributes (`name`, `enabled`,
    /// `visible` and the four hug/compress strengths).
    pub fn component(name: &str) -> Self {
        let class = Self::bare(name, WidgetRole::Component)
            .attribute("name", "")
            .attribute("enabled", true)
            .attribute("visible", true);
        COMPONENT_ATTRIBUTES
            .iter()
            .fold(class, |class, (attr, default)| class.attribute(attr, *default))
    }

    pub fn meta(name: &str) -> Self {
        Self::bare(name, WidgetRole::Meta)
    }

    fn bare(name: &str, role: WidgetRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            attributes: Vec::new(),
            hint_attributes: Vec::new(),
            measure: Rc::new(|_: &Object| NO_HINT),
            adapter: Rc::new(|object: &Object, measure: Measure| -> Rc<dyn WidgetAdapter> {
                Rc::new(HeadlessAdapter::new(object, measure))
            }),
        }
    }

    /// Declare an attribute, or replace the default of an existing one.
    pub fn attribute(mut self, name: &str, default: impl Into<Value>) -> Self {
        let default = default.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = default,
            None => self.attributes.push((name.to_string(), default)),
        }
        self
    }

    /// Size hint computed from attributes; a change to any of `depends_on`
    /// invalidates it.
    pub fn measure(mut self, depends_on: &[&str], measure: impl Fn(&Object) -> Size + 'static) -> Self {
        self.hint_attributes = depends_on.iter().map(|s| s.to_string()).collect();
        self.measure = Rc::new(measure);
        self
    }

    /// Replace the headless adapter with a toolkit-specific one.
    pub fn adapter(
        mut self,
        factory: impl Fn(&Object, Measure) -> Rc<dyn WidgetAdapter> + 'static,
    ) -> Self {
        self.adapter = Rc::new(factory);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> WidgetRole {
        self.role
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(n, _)| n == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn hint_attributes(&self) -> &[String] {
        &self.hint_attributes
    }

    /// Fresh widget object holding the declared defaults.
    pub fn create_object(&self) -> Object {
        Object::declared(
            &self.name,
            self.attributes.iter().map(|(n, v)| (n.clone(), v.clone())),
        )
    }

    pub fn create_adapter(&self, object: &Object) -> Rc<dyn WidgetAdapter> {
        (self.adapter)(object, Rc::clone(&self.measure))
    }
}

impl fmt::Debug for WidgetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetClass")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

// =============================================================================
// Toolkit
// =============================================================================

/// Registry of widget classes by name.
#[derive(Debug, Clone, Default)]
pub struct Toolkit {
    classes: FxHashMap<String, Rc<WidgetClass>>,
}

impl Toolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: WidgetClass) -> &mut Self {
        self.classes.insert(class.name.clone(), Rc::new(class));
        self
    }

    pub fn with_class(mut self, class: WidgetClass) -> Self {
        self.register(class);
        self
    }

    pub fn class(&self, name: &str) -> Option<Rc<WidgetClass>> {
        self.classes.get(name).cloned()
    }

    /// Empty constructor node for the widget called `name`.
    pub fn create_ctor(&self, name: &str) -> Result<ConstructorNode, CompileError> {
        self.class(name)
            .map(ConstructorNode::new)
            .ok_or_else(|| CompileError::UnknownWidget(name.to_string()))
    }

    /// Small toolkit backed by [`HeadlessAdapter`]s, sized as if every
    /// character were 8 units wide.
    pub fn headless() -> Self {
        Self::new()
            .with_class(
                WidgetClass::component("Window")
                    .attribute("title", "")
                    .attribute("hug_width", "ignore")
                    .attribute("hug_height", "ignore"),
            )
            .with_class(
                WidgetClass::component("Container")
                    .attribute("hug_width", "ignore")
                    .attribute("hug_height", "ignore"),
            )
            .with_class(
                WidgetClass::component("Label")
                    .attribute("text", "")
                    .measure(&["text"], |obj| Size::new(text_width(obj, "text"), 16.0)),
            )
            .with_class(
                WidgetClass::component("Button")
                    .attribute("text", "")
                    .attribute("clicked", false)
                    .measure(&["text"], |obj| Size::new(text_width(obj, "text") + 16.0, 24.0)),
            )
            .with_class(
                WidgetClass::component("Field")
                    .attribute("text", "")
                    .attribute("placeholder", "")
                    .attribute("hug_width", "ignore")
                    .measure(&[], |_| Size::new(120.0, 24.0)),
            )
            .with_class(
                WidgetClass::component("CheckBox")
                    .attribute("text", "")
                    .attribute("checked", false)
                    .measure(&["text"], |obj| Size::new(text_width(obj, "text") + 20.0, 20.0)),
            )
            .with_class(
                WidgetClass::component("Slider")
                    .attribute("value", 0)
                    .attribute("minimum", 0)
                    .attribute("maximum", 100)
                    .attribute("hug_width", "ignore")
                    .measure(&[], |_| Size::new(100.0, 20.0)),
            )
            .with_class(WidgetClass::meta("Hint").attribute("text", ""))
    }
}

fn text_width(object: &Object, attribute: &str) -> f64 {
    let chars = object
        .get(attribute)
        .map_or(0, |value| value.to_string().chars().count());
    chars as f64 * 8.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_classes_declare_common_attributes() {
        let class = WidgetClass::component("Thing").attribute("hug_width", "weak");
        assert!(class.has_attribute("name"));
        assert!(class.has_attribute("compress_height"));
        let object = class.create_object();
        assert_eq!(object.get("hug_width"), Some(Value::str("weak")));
        assert!(object.set("undeclared", Value::Int(1)).is_err());
    }

    #[test]
    fn test_create_ctor() {
        let toolkit = Toolkit::headless();
        assert!(toolkit.create_ctor("Label").is_ok());
        assert!(matches!(
            toolkit.create_ctor("Unknown"),
            Err(CompileError::UnknownWidget(name)) if name == "Unknown"
        ));
        assert_eq!(toolkit.class("Hint").map(|c| c.role()), Some(WidgetRole::Meta));
    }

    #[test]
    fn test_headless_measure_follows_text() {
        let class = Toolkit::headless().class("Label").unwrap();
        let object = class.create_object();
        let adapter = class.create_adapter(&object);
        assert_eq!(adapter.size_hint(), Size::new(0.0, 16.0));
        object.set("text", Value::str("Hello")).unwrap();
        assert_eq!(adapter.size_hint(), Size::new(40.0, 16.0));
    }
}
