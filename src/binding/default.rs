//! One-shot assignment: `attr = expr`.

use std::rc::Rc;

use super::{Binding, BindingFactory, BindingHandle, BindingKind};
use crate::engine::{Object, Scope};
use crate::error::{EvalError, SyntaxError};
use crate::expr::{parse_expression, Evaluator, Expr};

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl BindingFactory for DefaultFactory {
    fn kind(&self) -> BindingKind {
        BindingKind::Default
    }

    fn compile(&self, code: &str) -> Result<Rc<dyn Binding>, SyntaxError> {
        Ok(Rc::new(DefaultBinding {
            code: code.to_string(),
            expr: parse_expression(code)?,
        }))
    }
}

struct DefaultBinding {
    code: String,
    expr: Expr,
}

impl Binding for DefaultBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::Default
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
        let value = Evaluator::new(scope).eval(&self.expr)?;
        target.set(attribute, value)?;
        Ok(BindingHandle::detached())
    }
}
