//! Deferred constructor nodes.
//!
//! A compiled document is a tree of [`ConstructorNode`]s: the widget class
//! to build, the identifier to register it under, and the compiled bindings
//! to inject. The tree is immutable after compilation and can be
//! instantiated any number of times.
//!
//! Instantiation runs in two phases so bindings may refer to any widget in
//! the document, including ones declared further down:
//!
//! 1. build every component and meta object, collecting identifiers;
//! 2. inject bindings with the identifiers layer in scope.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::toolkit::WidgetClass;
use crate::binding::{Binding, BindingKind};
use crate::engine::{Component, Host, Namespace, Object, Scope};
use crate::error::BindingError;

#[derive(Clone)]
pub struct ConstructorNode {
    pub class: Rc<WidgetClass>,
    pub identifier: Option<String>,
    pub children: Vec<ConstructorNode>,
    pub metas: Vec<ConstructorNode>,
    /// Default, bind and delegate bindings, at most one per attribute.
    pub delegates: Vec<(String, Rc<dyn Binding>)>,
    /// Notify bindings; several may watch the same attribute.
    pub notifiers: Vec<(String, Rc<dyn Binding>)>,
}

impl ConstructorNode {
    pub fn new(class: Rc<WidgetClass>) -> Self {
        Self {
            class,
            identifier: None,
            children: Vec::new(),
            metas: Vec::new(),
            delegates: Vec::new(),
            notifiers: Vec::new(),
        }
    }

    /// Widget type name.
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Identifier, or the class name for anonymous nodes.
    pub fn label(&self) -> &str {
        self.identifier.as_deref().unwrap_or(self.class.name())
    }

    /// Record a binding. Notifiers accumulate; any other kind replaces an
    /// earlier binding of the same attribute and moves to the end, so
    /// bindings inject in document order.
    pub fn add_binding(&mut self, attribute: &str, binding: Rc<dyn Binding>) {
        if binding.kind() == BindingKind::Notify {
            self.notifiers.push((attribute.to_string(), binding));
            return;
        }
        self.delegates.retain(|(name, _)| name != attribute);
        self.delegates.push((attribute.to_string(), binding));
    }

    /// Number of nodes in this subtree, metas included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .chain(&self.metas)
            .map(ConstructorNode::node_count)
            .sum::<usize>()
    }

    /// Build a live component tree. `scope` supplies everything below the
    /// identifiers layer (imports, context, builtins).
    pub fn instantiate(&self, scope: &Scope, host: &Host) -> Result<Instance, BindingError> {
        let mut identifiers = Namespace::new();
        let root = self.build(host, &mut identifiers);
        let identifiers = Rc::new(identifiers);
        let scope = scope.clone().push(Rc::clone(&identifiers));
        self.inject(&root, &scope)?;
        Ok(Instance { root, identifiers })
    }

    fn build(&self, host: &Host, identifiers: &mut Namespace) -> Rc<Component> {
        let component = Component::new(Rc::clone(&self.class), self.identifier.clone(), host.clone());
        if let Some(id) = &self.identifier {
            identifiers.insert(id.clone(), component.object().clone());
        }
        for meta in &self.metas {
            let object = meta.class.create_object();
            if let Some(id) = &meta.identifier {
                identifiers.insert(id.clone(), object.clone());
            }
            component.add_meta(object);
        }
        for child in &self.children {
            component.link_child(child.build(host, identifiers));
        }
        trace!(widget = %self.label(), "component built");
        component
    }

    fn inject(&self, component: &Component, scope: &Scope) -> Result<(), BindingError> {
        self.inject_into(component, component.object(), scope)?;
        for (meta, object) in self.metas.iter().zip(component.metas()) {
            meta.inject_into(component, &object, scope)?;
        }
        for (child, live) in self.children.iter().zip(component.children()) {
            child.inject(&live, scope)?;
        }
        Ok(())
    }

    /// Delegates first so initial assignments do not fire notifiers.
    fn inject_into(&self, owner: &Component, target: &Object, scope: &Scope) -> Result<(), BindingError> {
        let scope = scope.with_layer(Namespace::new().with("self", target.clone()));
        for (attribute, binding) in self.delegates.iter().chain(&self.notifiers) {
            let handle = binding
                .inject(target, attribute, &scope)
                .map_err(|source| BindingError {
                    widget: self.label().to_string(),
                    attribute: attribute.clone(),
                    kind: binding.kind(),
                    source,
                })?;
            owner.retain_binding(handle);
        }
        Ok(())
    }
}

impl fmt::Debug for ConstructorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorNode")
            .field("name", &self.name())
            .field("identifier", &self.identifier)
            .field("children", &self.children)
            .field("metas", &self.metas)
            .field("delegates", &self.delegates.iter().map(|(a, _)| a).collect::<Vec<_>>())
            .field("notifiers", &self.notifiers.iter().map(|(a, _)| a).collect::<Vec<_>>())
            .finish()
    }
}

/// Result of one instantiation: the root component and the objects
/// registered under identifiers.
#[derive(Debug)]
pub struct Instance {
    pub root: Rc<Component>,
    pub identifiers: Rc<Namespace>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingFactory, BindFactory, DefaultFactory, NotifyFactory};
    use crate::compiler::Toolkit;
    use crate::layout::LayoutConfig;
    use crate::pipeline::TaskQueue;
    use crate::types::Value;

    fn host() -> Host {
        Host {
            scheduler: Rc::new(TaskQueue::new()),
            config: LayoutConfig::default(),
        }
    }

    fn node(toolkit: &Toolkit, name: &str, id: Option<&str>) -> ConstructorNode {
        let mut node = toolkit.create_ctor(name).unwrap();
        node.identifier = id.map(str::to_string);
        node
    }

    #[test]
    fn test_later_binding_replaces_earlier() {
        let toolkit = Toolkit::headless();
        let mut label = node(&toolkit, "Label", Some("label"));
        label.add_binding("text", DefaultFactory.compile("'one'").unwrap());
        label.add_binding("text", BindFactory.compile("'two'").unwrap());
        label.add_binding("text", NotifyFactory.compile("None").unwrap());
        label.add_binding("text", NotifyFactory.compile("None").unwrap());
        assert_eq!(label.delegates.len(), 1);
        assert_eq!(label.delegates[0].1.code(), "'two'");
        assert_eq!(label.notifiers.len(), 2);
    }

    #[test]
    fn test_replaced_binding_keeps_document_order() {
        let toolkit = Toolkit::headless();
        let mut label = node(&toolkit, "Label", None);
        label.add_binding("text", DefaultFactory.compile("'one'").unwrap());
        label.add_binding("name", DefaultFactory.compile("'label'").unwrap());
        label.add_binding("text", BindFactory.compile("'two'").unwrap());
        let order: Vec<_> = label.delegates.iter().map(|(a, b)| (a.as_str(), b.code())).collect();
        assert_eq!(order, [("name", "'label'"), ("text", "'two'")]);
    }

    #[test]
    fn test_build_links_children_before_layout() {
        let toolkit = Toolkit::headless();
        let mut window = node(&toolkit, "Window", Some("window"));
        window.children = vec![node(&toolkit, "Label", Some("a")), node(&toolkit, "Button", Some("b"))];

        let instance = window.instantiate(&Scope::new(), &host()).unwrap();
        let children = instance.root.children();
        assert_eq!(children.len(), 2);
        assert!(!instance.root.is_live());
        for child in &children {
            let parent = child.parent().unwrap();
            assert!(Rc::ptr_eq(&parent, &instance.root));
        }
    }

    #[test]
    fn test_forward_references_resolve() {
        let toolkit = Toolkit::headless();
        let mut window = node(&toolkit, "Window", Some("window"));
        let mut first = node(&toolkit, "Label", Some("first"));
        first.add_binding("text", BindFactory.compile("second.text + '!'").unwrap());
        let mut second = node(&toolkit, "Label", Some("second"));
        second.add_binding("text", DefaultFactory.compile("'hi'").unwrap());
        window.children = vec![first, second];
        assert_eq!(window.node_count(), 3);

        let instance = window.instantiate(&Scope::new(), &host()).unwrap();
        let first = instance.root.find("first").unwrap();
        assert_eq!(first.object().get("text"), Some(Value::str("hi!")));

        let second = instance.identifiers.get("second").and_then(Value::as_object).cloned().unwrap();
        second.set("text", Value::str("bye")).unwrap();
        assert_eq!(first.object().get("text"), Some(Value::str("bye!")));
    }

    #[test]
    fn test_failure_names_widget_and_attribute() {
        let toolkit = Toolkit::headless();
        let mut label = node(&toolkit, "Label", None);
        label.add_binding("text", DefaultFactory.compile("missing").unwrap());
        let err = label.instantiate(&Scope::new(), &host()).unwrap_err();
        assert_eq!(err.widget, "Label");
        assert_eq!(err.attribute, "text");
        assert_eq!(err.kind, BindingKind::Default);
    }
}
