//! Change handler: `attr >> statements`.

use std::rc::{Rc, Weak};

use tracing::warn;

use super::{Binding, BindingFactory, BindingHandle, BindingKind, Subscription, describe};
use crate::engine::{AttributeChange, Namespace, Object, Scope};
use crate::error::{EvalError, SyntaxError};
use crate::expr::{parse_statements, Evaluator, Statement};

#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyFactory;

impl BindingFactory for NotifyFactory {
    fn kind(&self) -> BindingKind {
        BindingKind::Notify
    }

    fn compile(&self, code: &str) -> Result<Rc<dyn Binding>, SyntaxError> {
        Ok(Rc::new(NotifyBinding {
            code: code.to_string(),
            statements: Rc::new(parse_statements(code)?),
        }))
    }
}

struct NotifyBinding {
    code: String,
    statements: Rc<Vec<Statement>>,
}

struct NotifyState {
    statements: Rc<Vec<Statement>>,
    scope: Scope,
    _subscription: Subscription,
}

impl Binding for NotifyBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::Notify
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn inject(
        &self,
        target: &Object,
        attribute: &str,
        scope: &Scope,
    ) -> Result<BindingHandle, EvalError> {
        let state = Rc::new_cyclic(|weak: &Weak<NotifyState>| {
            let weak = weak.clone();
            NotifyState {
                statements: Rc::clone(&self.statements),
                scope: scope.clone(),
                _subscription: Subscription::new(target, attribute, move |change| {
                    if let Some(state) = weak.upgrade() {
                        run(&state, change);
                    }
                }),
            }
        });
        Ok(BindingHandle::retain(state))
    }
}

fn run(state: &NotifyState, change: &AttributeChange) {
    let scope = state.scope.with_layer(
        Namespace::new()
            .with("self", change.object.clone())
            .with("old", change.old.clone())
            .with("new", change.new.clone()),
    );
    if let Err(err) = Evaluator::new(&scope).exec(&state.statements) {
        warn!(
            widget = %describe(&change.object),
            attribute = %change.name,
            error = %err,
            "notify handler failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_runs_on_every_change() {
        let log = Object::new("Log").with("count", Value::Int(0)).with("last", "");
        let button = Object::new("Button").with("clicked", false);
        let scope = Scope::new().with_layer(Namespace::new().with("log", log.clone()));

        let binding = NotifyFactory
            .compile("log.count = log.count + 1; log.last = '%s->%s' % [old, new]")
            .unwrap();
        let _handle = binding.inject(&button, "clicked", &scope).unwrap();
        assert_eq!(log.get("count"), Some(Value::Int(0)));

        button.set("clicked", Value::Bool(true)).unwrap();
        button.set("clicked", Value::Bool(true)).unwrap();
        button.set("clicked", Value::Bool(false)).unwrap();
        assert_eq!(log.get("count"), Some(Value::Int(2)));
        assert_eq!(log.get("last"), Some(Value::str("True->False")));
    }

    #[test]
    fn test_self_refers_to_widget() {
        let field = Object::new("Field").with("text", "").with("echo", "");
        let binding = NotifyFactory.compile("self.echo = new.upper()").unwrap();
        let _handle = binding.inject(&field, "text", &Scope::new()).unwrap();

        field.set("text", Value::str("ada")).unwrap();
        assert_eq!(field.get("echo"), Some(Value::str("ADA")));
    }

    #[test]
    fn test_handler_errors_are_contained() {
        let field = Object::new("Field").with("text", "");
        let binding = NotifyFactory.compile("undefined_name.x = 1").unwrap();
        let _handle = binding.inject(&field, "text", &Scope::new()).unwrap();
        assert!(field.set("text", Value::str("x")).unwrap());
    }
}
