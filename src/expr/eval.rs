//! Tree-walking evaluator.

use std::cell::RefCell;
use std::cmp::Ordering;

use super::format::format_percent;
use super::parser::{BinaryOp, CompareOp, Expr, Statement, UnaryOp};
use crate::engine::{Object, Scope};
use crate::error::EvalError;
use crate::types::{NativeFunction, Value};

/// An `(object, attribute)` pair read during evaluation.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub object: Object,
    pub attribute: String,
}

/// Evaluates expressions against a [`Scope`], optionally recording every
/// object attribute it reads.
pub struct Evaluator<'a> {
    scope: &'a Scope,
    reads: Option<RefCell<Vec<Dependency>>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a Scope) -> Self {
        Self { scope, reads: None }
    }

    /// Evaluator that records attribute reads, see [`into_dependencies`].
    ///
    /// [`into_dependencies`]: Self::into_dependencies
    pub fn tracking(scope: &'a Scope) -> Self {
        Self {
            scope,
            reads: Some(RefCell::new(Vec::new())),
        }
    }

    /// Distinct attributes read so far, in first-read order.
    pub fn into_dependencies(self) -> Vec<Dependency> {
        self.reads.map(RefCell::into_inner).unwrap_or_default()
    }

    fn record(&self, object: &Object, attribute: &str) {
        let Some(reads) = &self.reads else {
            return;
        };
        let mut reads = reads.borrow_mut();
        let seen = reads
            .iter()
            .any(|d| d.object.ptr_eq(object) && d.attribute == attribute);
        if !seen {
            reads.push(Dependency {
                object: object.clone(),
                attribute: attribute.to_string(),
            });
        }
    }

    /// Run statements in order, stopping at the first error.
    pub fn exec(&self, statements: &[Statement]) -> Result<(), EvalError> {
        for statement in statements {
            match statement {
                Statement::Expr(expr) => {
                    self.eval(expr)?;
                }
                Statement::Assign {
                    object,
                    attribute,
                    value,
                } => match self.eval(object)? {
                    Value::Object(target) => {
                        target.set(attribute, self.eval(value)?)?;
                    }
                    other => {
                        return Err(EvalError::type_error(format!(
                            "cannot assign attribute '{attribute}' on '{}'",
                            other.type_name()
                        )));
                    }
                },
            }
        }
        Ok(())
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => self
                .scope
                .lookup(name)
                .ok_or_else(|| EvalError::NameNotFound(name.clone())),
            Expr::Attribute(object, name) => {
                let object = self.eval(object)?;
                self.attribute(&object, name)
            }
            Expr::Subscript(object, index) => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                subscript(&object, &index)
            }
            Expr::Call(function, args) => {
                let function = self.eval(function)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match function {
                    Value::Function(f) => f.call(&args),
                    other => Err(EvalError::type_error(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            Expr::List(items) => Ok(Value::list(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Expr::Unary(op, operand) => unary(*op, self.eval(operand)?),
            Expr::Binary(op, lhs, rhs) => binary(*op, &self.eval(lhs)?, &self.eval(rhs)?),
            Expr::Compare(first, chain) => {
                let mut lhs = self.eval(first)?;
                for (op, rhs) in chain {
                    let rhs = self.eval(rhs)?;
                    if !compare(*op, &lhs, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
            Expr::And(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() { self.eval(rhs) } else { Ok(lhs) }
            }
            Expr::Or(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() { Ok(lhs) } else { self.eval(rhs) }
            }
            Expr::Conditional { test, body, orelse } => {
                if self.eval(test)?.truthy() {
                    self.eval(body)
                } else {
                    self.eval(orelse)
                }
            }
        }
    }

    fn attribute(&self, object: &Value, name: &str) -> Result<Value, EvalError> {
        let missing = || EvalError::NoAttribute {
            type_name: match object {
                Value::Object(obj) => obj.class_name().to_string(),
                other => other.type_name().to_string(),
            },
            attribute: name.to_string(),
        };
        match object {
            Value::Object(obj) => {
                self.record(obj, name);
                obj.get(name).ok_or_else(missing)
            }
            Value::Str(s) => string_method(s, name).ok_or_else(missing),
            _ => Err(missing()),
        }
    }
}

// =============================================================================
// Operators
// =============================================================================

fn int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn overflow() -> EvalError {
    EvalError::type_error("integer overflow")
}

fn unsupported(op: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!operand.truthy()));
    }
    if let Value::Float(f) = operand {
        return Ok(Value::Float(if op == UnaryOp::Neg { -f } else { f }));
    }
    let Some(i) = int_like(&operand) else {
        return Err(EvalError::type_error(format!(
            "bad operand type for unary operator: '{}'",
            operand.type_name()
        )));
    };
    if op == UnaryOp::Neg {
        i.checked_neg().map(Value::Int).ok_or_else(overflow)
    } else {
        Ok(Value::Int(i))
    }
}

/// Longest list (in items) or string (in bytes) that `*` repetition may
/// build.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

/// Length of `len` repeated `times` times, if it stays within
/// [`MAX_REPEAT_LEN`]. Negative counts repeat zero times.
fn repeat_len(len: usize, times: i64) -> Result<usize, EvalError> {
    let times = usize::try_from(times).unwrap_or(0);
    len.checked_mul(times)
        .filter(|&total| total <= MAX_REPEAT_LEN)
        .ok_or_else(|| EvalError::type_error("repeated sequence is too long"))
}

fn repeat(items: &[Value], times: i64) -> Result<Value, EvalError> {
    let total = repeat_len(items.len(), times)?;
    Ok(Value::list(items.iter().cloned().cycle().take(total)))
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (int_like(lhs), int_like(rhs)) {
        return int_binary(op, a, b);
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::list(a.iter().chain(b.iter()).cloned()))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s))
            if int_like(n).is_some() =>
        {
            let times = int_like(n).unwrap_or(0);
            repeat_len(s.len(), times)?;
            Ok(Value::str(s.repeat(usize::try_from(times).unwrap_or(0))))
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if int_like(n).is_some() =>
        {
            repeat(items, int_like(n).unwrap_or(0))
        }
        (BinaryOp::Mod, Value::Str(template), args) => format_percent(template, args),
        _ => {
            let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
                return Err(unsupported(symbol(op), lhs, rhs));
            };
            float_binary(op, a, b)
        }
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::ZeroDivision);
            }
            // Floor semantics: the remainder takes the divisor's sign.
            let mut q = a.checked_div(b).ok_or_else(overflow)?;
            let mut r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && (r < 0) != (b < 0) {
                q -= 1;
                r += b;
            }
            Some(if op == BinaryOp::FloorDiv { q } else { r })
        }
    };
    result.map(Value::Int).ok_or_else(overflow)
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::ZeroDivision);
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
    };
    Ok(Value::Float(value))
}

fn order(lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError> {
    let ordering = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        EvalError::type_error(format!(
            "'<' not supported between '{}' and '{}'",
            lhs.type_name(),
            rhs.type_name()
        ))
    })
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match (container, item) {
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_ref())),
        (Value::List(items), item) => Ok(items.iter().any(|v| v == item)),
        (Value::Object(obj), Value::Str(name)) => Ok(obj.has_attribute(name)),
        (other, _) => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    Ok(match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => order(lhs, rhs)? == Ordering::Less,
        CompareOp::Le => order(lhs, rhs)? != Ordering::Greater,
        CompareOp::Gt => order(lhs, rhs)? == Ordering::Greater,
        CompareOp::Ge => order(lhs, rhs)? != Ordering::Less,
        CompareOp::In => contains(rhs, lhs)?,
        CompareOp::NotIn => !contains(rhs, lhs)?,
    })
}

fn subscript(object: &Value, index: &Value) -> Result<Value, EvalError> {
    let position = |len: usize| -> Result<usize, EvalError> {
        let i = int_like(index).ok_or_else(|| {
            EvalError::type_error(format!(
                "indices must be integers, not '{}'",
                index.type_name()
            ))
        })?;
        let resolved = if i < 0 { i + len as i64 } else { i };
        usize::try_from(resolved)
            .ok()
            .filter(|&p| p < len)
            .ok_or(EvalError::IndexOutOfRange { index: i, len })
    };
    match object {
        Value::List(items) => Ok(items[position(items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::str(chars[position(chars.len())?].to_string()))
        }
        Value::Object(obj) => {
            let Value::Str(name) = index else {
                return Err(EvalError::type_error("object keys must be strings"));
            };
            obj.get(name).ok_or_else(|| EvalError::NoAttribute {
                type_name: obj.class_name().to_string(),
                attribute: name.to_string(),
            })
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Bound string methods.
fn string_method(s: &str, name: &str) -> Option<Value> {
    let s = s.to_string();
    let method = match name {
        "upper" => NativeFunction::new("upper", move |_| Ok(Value::str(s.to_uppercase()))),
        "lower" => NativeFunction::new("lower", move |_| Ok(Value::str(s.to_lowercase()))),
        "strip" => NativeFunction::new("strip", move |_| Ok(Value::str(s.trim()))),
        "startswith" => NativeFunction::new("startswith", move |args| match args {
            [Value::Str(prefix)] => Ok(Value::Bool(s.starts_with(prefix.as_ref()))),
            _ => Err(EvalError::type_error("startswith() expects one string")),
        }),
        "endswith" => NativeFunction::new("endswith", move |args| match args {
            [Value::Str(suffix)] => Ok(Value::Bool(s.ends_with(suffix.as_ref()))),
            _ => Err(EvalError::type_error("endswith() expects one string")),
        }),
        "replace" => NativeFunction::new("replace", move |args| match args {
            [Value::Str(from), Value::Str(to)] => Ok(Value::str(s.replace(from.as_ref(), to))),
            _ => Err(EvalError::type_error("replace() expects two strings")),
        }),
        "join" => NativeFunction::new("join", move |args| match args {
            [Value::List(items)] => {
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                Ok(Value::str(parts.join(s.as_str())))
            }
            _ => Err(EvalError::type_error("join() expects a list")),
        }),
        _ => return None,
    };
    Some(Value::Function(method))
}
