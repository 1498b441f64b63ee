//! AST visitor that assembles the constructor tree.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use super::constructor::ConstructorNode;
use super::modules::{module_object, ModuleLoader};
use super::toolkit::{Toolkit, WidgetRole};
use crate::ast::{AttributeBinding, Element, Import, Node};
use crate::binding::{BindingFactories, BindingKind};
use crate::engine::Namespace;
use crate::error::{CompileError, ImportError};

/// Output of a successful compile.
#[derive(Debug, Clone)]
pub struct CompiledView {
    pub root: Rc<ConstructorNode>,
    /// Symbols bound by the document's imports, shared by every instance.
    pub imports: Rc<Namespace>,
}

/// Walks a document once, keeping a stack of open constructor nodes.
pub struct CtorBuilder<'a> {
    toolkit: &'a Toolkit,
    modules: &'a dyn ModuleLoader,
    factories: &'a BindingFactories,
    stack: Vec<ConstructorNode>,
    root: Option<ConstructorNode>,
    imports: Namespace,
    identifiers: FxHashSet<String>,
}

impl<'a> CtorBuilder<'a> {
    pub fn new(
        toolkit: &'a Toolkit,
        modules: &'a dyn ModuleLoader,
        factories: &'a BindingFactories,
    ) -> Self {
        Self {
            toolkit,
            modules,
            factories,
            stack: Vec::new(),
            root: None,
            imports: Namespace::new(),
            identifiers: FxHashSet::default(),
        }
    }

    pub fn visit(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Import(import) => self.visit_import(import),
            Node::Element(element) => self.visit_element(element, WidgetRole::Component),
            Node::Meta(element) => self.visit_element(element, WidgetRole::Meta),
            Node::Default(binding) => self.visit_binding(BindingKind::Default, binding),
            Node::Bind(binding) => self.visit_binding(BindingKind::Bind, binding),
            Node::Delegate(binding) => self.visit_binding(BindingKind::Delegate, binding),
            Node::Notify(binding) => self.visit_binding(BindingKind::Notify, binding),
            _ => self.default_visit(node),
        }
    }

    /// Visit the children of a node without meaning of its own.
    fn default_visit(&mut self, node: &Node) -> Result<(), CompileError> {
        for child in node.children() {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_import(&mut self, import: &Import) -> Result<(), CompileError> {
        let symbols = self.modules.load(&import.module)?;
        if import.names.is_empty() {
            let name = import.alias.as_deref().unwrap_or(&import.module);
            self.imports.insert(name, module_object(&import.module, &symbols));
        } else {
            for item in &import.names {
                let value = symbols.get(&item.name).ok_or_else(|| ImportError::UnknownSymbol {
                    module: import.module.clone(),
                    name: item.name.clone(),
                })?;
                self.imports.insert(item.bound_name(), value.clone());
            }
        }
        debug!(module = %import.module, symbols = import.names.len(), "import");
        Ok(())
    }

    fn visit_element(&mut self, element: &Element, role: WidgetRole) -> Result<(), CompileError> {
        if role == WidgetRole::Meta && self.stack.is_empty() {
            return Err(CompileError::MetaWithoutParent(element.name.clone()));
        }
        let mut ctor = self.toolkit.create_ctor(&element.name)?;
        if ctor.class.role() != role {
            return Err(CompileError::RoleMismatch {
                name: element.name.clone(),
                expected: role.describe(),
            });
        }
        if let Some(id) = &element.identifier {
            if !self.identifiers.insert(id.clone()) {
                return Err(CompileError::DuplicateIdentifier(id.clone()));
            }
        }
        ctor.identifier = element.identifier.clone();

        trace!(widget = %element.name, depth = self.stack.len(), "push");
        self.stack.push(ctor);
        for child in &element.body {
            self.visit(child)?;
        }
        // Pushed above, so the stack is never empty here.
        let ctor = self
            .stack
            .pop()
            .ok_or_else(|| CompileError::MetaWithoutParent(element.name.clone()))?;
        trace!(widget = %element.name, depth = self.stack.len(), "pop");

        match (self.stack.last_mut(), role) {
            (Some(parent), WidgetRole::Component) => parent.children.push(ctor),
            (Some(parent), WidgetRole::Meta) => parent.metas.push(ctor),
            (None, WidgetRole::Meta) => {
                return Err(CompileError::MetaWithoutParent(element.name.clone()));
            }
            (None, WidgetRole::Component) => {
                if self.root.is_some() {
                    return Err(CompileError::MultipleRoots(element.name.clone()));
                }
                self.root = Some(ctor);
            }
        }
        Ok(())
    }

    fn visit_binding(&mut self, kind: BindingKind, node: &AttributeBinding) -> Result<(), CompileError> {
        let Some(ctor) = self.stack.last_mut() else {
            return Err(CompileError::BindingOutsideElement(node.attribute.clone()));
        };
        if !ctor.class.has_attribute(&node.attribute) {
            return Err(CompileError::UnknownAttribute {
                widget: ctor.name().to_string(),
                attribute: node.attribute.clone(),
            });
        }
        let binding = self
            .factories
            .get(kind)
            .compile(&node.code)
            .map_err(|source| CompileError::Binding {
                widget: ctor.label().to_string(),
                attribute: node.attribute.clone(),
                kind,
                source,
            })?;
        ctor.add_binding(&node.attribute, binding);
        Ok(())
    }

    pub fn finish(self) -> Result<CompiledView, CompileError> {
        let root = self.root.ok_or(CompileError::EmptyDocument)?;
        Ok(CompiledView {
            root: Rc::new(root),
            imports: Rc::new(self.imports),
        })
    }
}
