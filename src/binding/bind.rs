//! Subscription binding: `attr := expr`.
//!
//! The expression is evaluated with a tracking [`Evaluator`]; every object
//! attribute it read becomes a subscription. Any change drops the old
//! subscriptions, re-evaluates, subscribes to the new reads and assigns.
//! The set of reads can differ between evaluations (`a.x if flag.on else
//! b.y`), which is why subscriptions are rebuilt every time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::{describe, Binding, BindingFactory, BindingHandle, BindingKind, Subscription};
use crate::engine::{Object, Scope, WeakObject};
use crate::error::{EvalError, SyntaxError};
use crate::expr::{parse_expression, Evaluator, Expr};

#[derive(Debug, Default, Clone, Copy)]
pub struct BindFactory;

impl BindingFactory for BindFactory {
    fn kind(&self) -> BindingKind {
        BindingKind::Bind
    }

    fn compile(&self, code: &str) -> Result<Rc<dyn Binding>, SyntaxError> {
        Ok(Rc::new(BindBinding {
            code: code.to_string(),
            expr: Rc::new(parse_expression(code)?),
        }))
    }
}

struct BindBinding {
    code: String,
    expr: Rc<Expr>,
}

impl Binding for BindBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::Bind
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
        let state = Rc::new(BindState {
            expr: Rc::clone(&self.expr),
            target: target.downgrade(),
            attribute: attribute.to_string(),
            scope: scope.clone(),
            subscriptions: RefCell::new(Vec::new()),
        });
        refresh(&state)?;
        Ok(BindingHandle::retain(state))
    }
}

struct BindState {
    expr: Rc<Expr>,
    target: WeakObject,
    attribute: String,
    scope: Scope,
    subscriptions: RefCell<Vec<Subscription>>,
}

/// Re-evaluate, resubscribe and assign.
///
/// Subscriptions are rebuilt even when evaluation fails so a later change
/// to any attribute read before the failure can repair the binding.
fn refresh(state: &Rc<BindState>) -> Result<(), EvalError> {
    let old = state.subscriptions.take();
    drop(old);

    let evaluator = Evaluator::tracking(&state.scope);
    let result = evaluator.eval(&state.expr);
    let reads = evaluator.into_dependencies();

    let subscriptions = reads
        .iter()
        .map(|dep| {
            let weak: Weak<BindState> = Rc::downgrade(state);
            Subscription::new(&dep.object, &dep.attribute, move |_| {
                if let Some(state) = weak.upgrade() {
                    on_change(&state);
                }
            })
        })
        .collect();
    *state.subscriptions.borrow_mut() = subscriptions;

    let value = result?;
    if let Some(target) = state.target.upgrade() {
        target.set(&state.attribute, value)?;
    }
    Ok(())
}

fn on_change(state: &Rc<BindState>) {
    if let Err(err) = refresh(state) {
        let widget = state
            .target
            .upgrade()
            .map(|t| describe(&t))
            .unwrap_or_default();
        warn!(
            widget = %widget,
            attribute = %state.attribute,
            error = %err,
            "bind re-evaluation failed, keeping previous value"
        );
    }
}
