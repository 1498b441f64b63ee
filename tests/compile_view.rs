//! Compiling documents and instantiating views end to end.

use std::rc::Rc;

use spark_view::ast::{Document, Node};
use spark_view::compiler::{ModuleRegistry, Toolkit, WidgetRole};
use spark_view::engine::{Namespace, Object};
use spark_view::pipeline::{FactoryConfig, TaskQueue, ViewFactory};
use spark_view::{CompileError, Geometry, Size, Value, ViewError};

fn factory(document: &Document) -> (ViewFactory, Rc<TaskQueue>) {
    let queue = Rc::new(TaskQueue::new());
    let config = FactoryConfig::new(Toolkit::headless(), queue.clone());
    (ViewFactory::new(document, config).unwrap(), queue)
}

#[test]
fn test_bound_greeting_for_ada() {
    let document = Document::new(vec![Node::element("Window", None, vec![Node::element(
        "Button",
        None,
        vec![Node::bind("text", "'%s' % user.name")],
    )])]);
    let (factory, _queue) = factory(&document);

    let user = Object::new("User").with("name", "Ada");
    let view = factory
        .instantiate(Namespace::new().with("user", user.clone()))
        .unwrap();
    let children = view.root().children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].object().get("text"), Some(Value::str("Ada")));

    user.set("name", Value::str("Grace")).unwrap();
    assert_eq!(children[0].object().get("text"), Some(Value::str("Grace")));
}

#[test]
fn test_same_scenario_from_json() {
    let json = r#"{ "body": [
        { "kind": "element", "name": "Window", "identifier": "main", "body": [
            { "kind": "element", "name": "Button", "identifier": "greet", "body": [
                { "kind": "bind", "attribute": "text", "code": "'%s' % user.name" }
            ]}
        ]}
    ]}"#;
    let queue = Rc::new(TaskQueue::new());
    let factory =
        ViewFactory::from_json(json, FactoryConfig::new(Toolkit::headless(), queue)).unwrap();
    let view = factory
        .instantiate(Namespace::new().with("user", Object::new("User").with("name", "Ada")))
        .unwrap();
    assert_eq!(view.object("greet").unwrap().get("text"), Some(Value::str("Ada")));
}

#[test]
fn test_exactly_one_root() {
    let (factory, _) = factory(&Document::new(vec![
        Node::Comment { text: "header".into() },
        Node::element("Window", Some("main"), vec![]),
    ]));
    assert_eq!(factory.compiled().root.name(), "Window");

    let config = || FactoryConfig::new(Toolkit::headless(), Rc::new(TaskQueue::new()));
    assert!(matches!(
        ViewFactory::new(&Document::default(), config()),
        Err(ViewError::Compile(CompileError::EmptyDocument))
    ));
    assert!(matches!(
        ViewFactory::new(
            &Document::new(vec![
                Node::element("Window", None, vec![]),
                Node::element("Window", None, vec![]),
            ]),
            config(),
        ),
        Err(ViewError::Compile(CompileError::MultipleRoots(_)))
    ));
}

#[test]
fn test_children_in_document_order_and_metas_below_root() {
    let document = Document::new(vec![Node::element("Window", Some("main"), vec![
        Node::element("Label", Some("first"), vec![]),
        Node::meta("Hint", vec![Node::default("text", "'window tip'")]),
        Node::element("Container", Some("box"), vec![
            Node::element("Button", Some("second"), vec![]),
            Node::meta("Hint", vec![]),
        ]),
        Node::element("Field", Some("third"), vec![]),
    ])]);
    let (factory, _) = factory(&document);
    let root = &factory.compiled().root;

    let ids: Vec<_> = root.children.iter().filter_map(|c| c.identifier.as_deref()).collect();
    assert_eq!(ids, ["first", "box", "third"]);
    assert!(root.metas.iter().all(|meta| meta.class.role() == WidgetRole::Meta));
    assert_eq!(root.children[1].metas.len(), 1);

    let view = factory.instantiate(Namespace::new()).unwrap();
    let metas = view.root().metas();
    assert_eq!(metas.len(), 1);
    assert_eq!(metas[0].get("text"), Some(Value::str("window tip")));
}

#[test]
fn test_delegate_keeps_model_and_widget_in_sync() {
    let document = Document::new(vec![Node::element("Window", None, vec![
        Node::element("Field", Some("field"), vec![Node::delegate("text", "model.query")]),
        Node::element("Label", Some("echo"), vec![Node::bind("text", "field.text.upper()")]),
    ])]);
    let (factory, _) = factory(&document);
    let model = Object::new("Search").with("query", "rust");
    let view = factory
        .instantiate(Namespace::new().with("model", model.clone()))
        .unwrap();

    let field = view.object("field").unwrap();
    let echo = view.object("echo").unwrap();
    assert_eq!(field.get("text"), Some(Value::str("rust")));
    assert_eq!(echo.get("text"), Some(Value::str("RUST")));

    field.set("text", Value::str("cassowary")).unwrap();
    assert_eq!(model.get("query"), Some(Value::str("cassowary")));
    assert_eq!(echo.get("text"), Some(Value::str("CASSOWARY")));

    model.set("query", Value::str("simplex")).unwrap();
    assert_eq!(field.get("text"), Some(Value::str("simplex")));
}

#[test]
fn test_notify_handler_updates_model() {
    let document = Document::new(vec![Node::element("Window", None, vec![Node::element(
        "Button",
        Some("button"),
        vec![Node::notify("clicked", "counter.clicks = counter.clicks + 1")],
    )])]);
    let (factory, _) = factory(&document);
    let counter = Object::new("Counter").with("clicks", Value::Int(0));
    let view = factory
        .instantiate(Namespace::new().with("counter", counter.clone()))
        .unwrap();

    let button = view.object("button").unwrap();
    button.set("clicked", Value::Bool(true)).unwrap();
    button.set("clicked", Value::Bool(false)).unwrap();
    assert_eq!(counter.get("clicks"), Some(Value::Int(2)));

    drop(view);
    button.set("clicked", Value::Bool(true)).unwrap();
    assert_eq!(counter.get("clicks"), Some(Value::Int(2)));
}

#[test]
fn test_imported_symbols_and_module_objects() {
    let modules = ModuleRegistry::new().with_module(
        "theme",
        Namespace::new().with("accent", "teal").with("spacing", Value::Int(8)),
    );
    let document = Document::new(vec![
        Node::import("theme", &["accent"]),
        Node::import("theme", &[]),
        Node::element("Label", Some("l"), vec![Node::default(
            "text",
            "'%s/%d' % [accent, theme.spacing * 2]",
        )]),
    ]);
    let queue = Rc::new(TaskQueue::new());
    let config = FactoryConfig::new(Toolkit::headless(), queue).with_modules(Rc::new(modules));
    let factory = ViewFactory::new(&document, config).unwrap();
    let view = factory.instantiate(Namespace::new()).unwrap();
    assert_eq!(view.object("l").unwrap().get("text"), Some(Value::str("teal/16")));
}

#[test]
fn test_instantiated_view_lays_out() {
    let document = Document::new(vec![Node::element("Window", Some("main"), vec![
        Node::element("Label", Some("title"), vec![Node::default("text", "'Settings'")]),
    ])]);
    let (factory, queue) = factory(&document);
    let view = factory.instantiate(Namespace::new()).unwrap();
    let title = view.component("title").unwrap();
    view.root()
        .set_constraints(vec![title.model().left.equal_to(8.0), title.model().top.equal_to(8.0)]);
    view.resize(Size::new(320.0, 200.0));
    queue.run_pending();

    assert_eq!(title.geometry(), Some(Geometry::new(8.0, 8.0, 64.0, 16.0)));
    assert_eq!(view.root().min_size().unwrap(), Size::new(72.0, 24.0));
}
