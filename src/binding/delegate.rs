//! Two-way link: `attr << obj.name`.
//!
//! The right-hand side must be an attribute reference. Its object part is
//! evaluated once at inject time; from then on the pair is kept in sync in
//! both directions. Object assignment ignores equal values, so an update
//! echoed back from the other side stops after one hop.

use std::rc::Rc;

use tracing::warn;

use super::{Binding, BindingFactory, BindingHandle, BindingKind, Subscription, describe};
use crate::engine::{Object, Scope};
use crate::error::{EvalError, SyntaxError};
use crate::expr::{parse_expression, Evaluator, Expr};
use crate::types::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct DelegateFactory;

impl BindingFactory for DelegateFactory {
    fn kind(&self) -> BindingKind {
        BindingKind::Delegate
    }

    fn compile(&self, code: &str) -> Result<Rc<dyn Binding>, SyntaxError> {
        match parse_expression(code)? {
            Expr::Attribute(object, name) => Ok(Rc::new(DelegateBinding {
                code: code.to_string(),
                object: *object,
                name,
            })),
            _ => Err(SyntaxError::new(
                "delegate expression must be an attribute reference",
                0,
            )),
        }
    }
}

struct DelegateBinding {
    code: String,
    object: Expr,
    name: String,
}

struct DelegateState {
    _subscriptions: [Subscription; 2],
}

impl Binding for DelegateBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::Delegate
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
        let source = match Evaluator::new(scope).eval(&self.object)? {
            Value::Object(object) => object,
            other => {
                return Err(EvalError::type_error(format!(
                    "cannot delegate to attribute '{}' of '{}'",
                    self.name,
                    other.type_name()
                )));
            }
        };
        let initial = source.get(&self.name).ok_or_else(|| EvalError::NoAttribute {
            type_name: source.class_name().to_string(),
            attribute: self.name.clone(),
        })?;
        target.set(attribute, initial)?;

        let outward = {
            let source = source.downgrade();
            let name = self.name.clone();
            Subscription::new(target, attribute, move |change| {
                let Some(source) = source.upgrade() else {
                    return;
                };
                if let Err(err) = source.set(&name, change.new.clone()) {
                    warn!(
                        widget = %describe(&change.object),
                        attribute = %change.name,
                        error = %err,
                        "delegate write-through failed"
                    );
                }
            })
        };
        let inward = {
            let target = target.downgrade();
            let attribute = attribute.to_string();
            Subscription::new(&source, &self.name, move |change| {
                let Some(target) = target.upgrade() else {
                    return;
                };
                if let Err(err) = target.set(&attribute, change.new.clone()) {
                    warn!(
                        widget = %describe(&target),
                        attribute = %attribute,
                        error = %err,
                        "delegate write-back failed"
                    );
                }
            })
        };

        Ok(BindingHandle::retain(Rc::new(DelegateState {
            _subscriptions: [outward, inward],
        })))
    }
}
