//! Builtin functions available to every expression.
//!
//! The namespace is built once per thread and shared; it sits at the bottom
//! of every instantiation scope so imports and context can shadow it.

use std::rc::Rc;

use super::scope::Namespace;
use crate::error::EvalError;
use crate::types::{NativeFunction, Value};

thread_local! {
    static BUILTINS: Rc<Namespace> = Rc::new(build());
}

/// Shared builtins namespace.
pub fn builtins() -> Rc<Namespace> {
    BUILTINS.with(Rc::clone)
}

fn build() -> Namespace {
    let mut ns = Namespace::new();
    let mut register = |name: &str, f: fn(&[Value]) -> Result<Value, EvalError>| {
        ns.insert(name, NativeFunction::new(name, f));
    };
    register("len", len);
    register("str", str_);
    register("repr", repr);
    register("int", int);
    register("float", float);
    register("bool", bool_);
    register("abs", abs);
    register("min", min);
    register("max", max);
    register("round", round);
    ns
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Call {
            function: name.to_string(),
            message: format!("takes {expected} argument(s), {} given", args.len()),
        })
    }
}

fn len(args: &[Value]) -> Result<Value, EvalError> {
    arity("len", args, 1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Object(obj) => obj.attribute_names().len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(n as i64))
}

fn str_(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [] => Ok(Value::str("")),
        [value] => Ok(Value::str(value.to_string())),
        _ => arity("str", args, 1).map(|()| Value::None),
    }
}

fn repr(args: &[Value]) -> Result<Value, EvalError> {
    arity("repr", args, 1)?;
    Ok(Value::str(args[0].repr()))
}

fn int(args: &[Value]) -> Result<Value, EvalError> {
    arity("int", args, 1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| EvalError::Call {
            function: "int".into(),
            message: format!("invalid literal: '{s}'"),
        }),
        other => Err(EvalError::type_error(format!(
            "int() argument must be a number or string, not '{}'",
            other.type_name()
        ))),
    }
}

fn float(args: &[Value]) -> Result<Value, EvalError> {
    arity("float", args, 1)?;
    match &args[0] {
        Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| EvalError::Call {
            function: "float".into(),
            message: format!("could not convert string to float: '{s}'"),
        }),
        other => other.as_f64().map(Value::Float).ok_or_else(|| {
            EvalError::type_error(format!(
                "float() argument must be a number or string, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn bool_(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [] => Ok(Value::Bool(false)),
        [value] => Ok(Value::Bool(value.truthy())),
        _ => arity("bool", args, 1).map(|()| Value::None),
    }
}

fn abs(args: &[Value]) -> Result<Value, EvalError> {
    arity("abs", args, 1)?;
    match &args[0] {
        Value::Int(i) => i.checked_abs().map(Value::Int).ok_or_else(|| {
            EvalError::type_error("integer overflow in abs()")
        }),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(EvalError::type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// Shared body of `min` and `max`: one list argument or several values.
fn extreme(name: &str, args: &[Value], pick_later: fn(f64, f64) -> bool) -> Result<Value, EvalError> {
    let items: &[Value] = match args {
        [Value::List(items)] => &items[..],
        _ => args,
    };
    let mut best: Option<(&Value, f64)> = None;
    for item in items {
        let key = item.as_f64().ok_or_else(|| {
            EvalError::type_error(format!("{name}() expects numbers, got '{}'", item.type_name()))
        })?;
        if best.is_none_or(|(_, current)| pick_later(current, key)) {
            best = Some((item, key));
        }
    }
    best.map(|(item, _)| item.clone()).ok_or_else(|| EvalError::Call {
        function: name.to_string(),
        message: "arg is an empty sequence".into(),
    })
}

fn min(args: &[Value]) -> Result<Value, EvalError> {
    extreme("min", args, |current, candidate| candidate < current)
}

fn max(args: &[Value]) -> Result<Value, EvalError> {
    extreme("max", args, |current, candidate| candidate > current)
}

fn round(args: &[Value]) -> Result<Value, EvalError> {
    let (value, digits) = match args {
        [value] => (value, None),
        [value, Value::Int(d)] => (value, Some(*d)),
        _ => {
            return Err(EvalError::Call {
                function: "round".into(),
                message: "expects a number and optional integer digits".into(),
            });
        }
    };
    let x = value.as_f64().ok_or_else(|| {
        EvalError::type_error(format!(
            "type '{}' doesn't define round()",
            value.type_name()
        ))
    })?;
    match digits {
        None => Ok(Value::Int(round_half_even(x) as i64)),
        Some(d) => {
            let d = d.clamp(-300, 300) as i32;
            let scale = 10f64.powi(d);
            Ok(Value::Float(round_half_even(x * scale) / scale))
        }
    }
}

/// Banker's rounding.
fn round_half_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
        r - x.signum()
    } else {
        r
    }
}
