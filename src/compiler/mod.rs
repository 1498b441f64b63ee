//! Declarative Tree Compiler
//!
//! Turns a parsed [`Document`] into an immutable tree of
//! [`ConstructorNode`]s plus the namespace its imports produced.
//!
//! ```text
//! Document ──CtorBuilder──> CompiledView { root, imports } ──instantiate──> Component tree
//!             │  toolkit: widget names -> classes
//!             │  modules: import statements, run once
//!             └  factories: default / bind / delegate / notify code
//! ```
//!
//! Every problem in the document is reported here, by [`compile`]; nothing
//! is deferred to instantiation except evaluation errors.

mod builder;
mod constructor;
mod modules;
mod toolkit;

use tracing::debug;

use crate::ast::Document;
use crate::binding::BindingFactories;
use crate::error::CompileError;

pub use builder::{CompiledView, CtorBuilder};
pub use constructor::{ConstructorNode, Instance};
pub use modules::{ModuleLoader, ModuleRegistry};
pub use toolkit::{
    AdapterFactory, HeadlessAdapter, Measure, NO_HINT, Toolkit, WidgetAdapter, WidgetClass,
    WidgetRole,
};

/// Compile `document` against an explicit toolkit, module loader and set
/// of binding factories.
pub fn compile(
    document: &Document,
    toolkit: &Toolkit,
    modules: &dyn ModuleLoader,
    factories: &BindingFactories,
) -> Result<CompiledView, CompileError> {
    let mut builder = CtorBuilder::new(toolkit, modules, factories);
    for node in &document.body {
        builder.visit(node)?;
    }
    let view = builder.finish()?;
    debug!(
        root = %view.root.name(),
        nodes = view.root.node_count(),
        imports = view.imports.len(),
        "compiled view"
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::binding::BindingKind;
    use crate::engine::Namespace;
    use crate::types::Value;

    fn compile_body(body: Vec<Node>) -> Result<CompiledView, CompileError> {
        let modules = ModuleRegistry::new().with_module(
            "models",
            Namespace::new().with("greeting", "Hello"),
        );
        compile(
            &Document::new(body),
            &Toolkit::headless(),
            &modules,
            &BindingFactories::default(),
        )
    }

    #[test]
    fn test_structure_in_document_order() {
        let view = compile_body(vec![
            Node::Comment { text: "top".into() },
            Node::element("Window", Some("main"), vec![
                Node::element("Label", Some("a"), vec![]),
                Node::meta("Hint", vec![Node::default("text", "'tip'")]),
                Node::Block {
                    body: vec![Node::element("Button", Some("b"), vec![])],
                },
            ]),
        ])
        .unwrap();
        let root = &view.root;
        assert_eq!(root.name(), "Window");
        let ids: Vec<_> = root.children.iter().map(|c| c.identifier.as_deref()).collect();
        assert_eq!(ids, vec![Some("a"), Some("b")]);
        assert_eq!(root.metas.len(), 1);
        assert_eq!(root.metas[0].delegates.len(), 1);
    }

    #[test]
    fn test_imports_run_once_into_shared_namespace() {
        let view = compile_body(vec![
            Node::import("models", &["greeting"]),
            Node::import("models", &[]),
            Node::element("Label", None, vec![]),
        ])
        .unwrap();
        assert_eq!(view.imports.get("greeting"), Some(&Value::str("Hello")));
        assert!(matches!(view.imports.get("models"), Some(Value::Object(_))));
    }

    #[test]
    fn test_compile_errors() {
        let err = |body| compile_body(body).unwrap_err();

        assert_eq!(err(vec![]), CompileError::EmptyDocument);
        assert_eq!(
            err(vec![Node::element("Nope", None, vec![])]),
            CompileError::UnknownWidget("Nope".into())
        );
        assert_eq!(
            err(vec![
                Node::element("Label", None, vec![]),
                Node::element("Button", None, vec![]),
            ]),
            CompileError::MultipleRoots("Button".into())
        );
        assert_eq!(
            err(vec![Node::meta("Hint", vec![])]),
            CompileError::MetaWithoutParent("Hint".into())
        );
        assert!(matches!(
            err(vec![Node::element("Hint", None, vec![])]),
            CompileError::RoleMismatch { .. }
        ));
        assert_eq!(
            err(vec![Node::bind("text", "1")]),
            CompileError::BindingOutsideElement("text".into())
        );
        assert!(matches!(
            err(vec![Node::element("Label", None, vec![Node::bind("colour", "1")])]),
            CompileError::UnknownAttribute { .. }
        ));
        assert!(matches!(
            err(vec![Node::element("Label", Some("l"), vec![Node::bind("text", "1 +")])]),
            CompileError::Binding { kind: BindingKind::Bind, .. }
        ));
        assert!(matches!(
            err(vec![Node::element("Field", None, vec![Node::delegate("text", "model")])]),
            CompileError::Binding { kind: BindingKind::Delegate, .. }
        ));
        assert!(matches!(
            err(vec![Node::import("missing", &[])]),
            CompileError::Import(_)
        ));
        assert!(matches!(
            err(vec![Node::element("Window", Some("x"), vec![
                Node::element("Label", Some("x"), vec![]),
            ])]),
            CompileError::DuplicateIdentifier(_)
        ));
    }
}
