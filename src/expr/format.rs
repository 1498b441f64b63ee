//! printf-style `template % args` formatting.
//!
//! Supported conversions: `%s`, `%r`, `%d`, `%i`, `%f` and `%%`, each with an
//! optional `-` flag, width and `.precision` (each at most
//! [`MAX_FIELD_WIDTH`]). A list on the right supplies
//! one argument per conversion; any other value is a single argument.

use crate::error::EvalError;
use crate::types::Value;

/// Largest width or precision a conversion accepts.
pub const MAX_FIELD_WIDTH: usize = 4096;

pub fn format_percent(template: &str, args: &Value) -> Result<Value, EvalError> {
    let args: Vec<Value> = match args {
        Value::List(items) => items.to_vec(),
        other => vec![other.clone()],
    };
    let mut next = args.iter();
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut left_align = false;
        while chars.next_if_eq(&'-').is_some() {
            left_align = true;
        }
        let width = digits(&mut chars);
        let precision = if chars.next_if_eq(&'.').is_some() {
            Some(digits(&mut chars).unwrap_or(0))
        } else {
            None
        };

        if width.max(precision).is_some_and(|n| n > MAX_FIELD_WIDTH) {
            return Err(EvalError::Format(format!(
                "width or precision exceeds {MAX_FIELD_WIDTH}"
            )));
        }

        let conversion = chars
            .next()
            .ok_or_else(|| EvalError::Format("incomplete format".into()))?;
        if conversion == '%' {
            out.push('%');
            continue;
        }

        let arg = next
            .next()
            .ok_or_else(|| EvalError::Format("not enough arguments for format string".into()))?;
        let text = convert(conversion, arg, precision)?;
        pad(&mut out, &text, width.unwrap_or(0), left_align);
    }

    if next.next().is_some() {
        return Err(EvalError::Format(
            "not all arguments converted during string formatting".into(),
        ));
    }
    Ok(Value::str(out))
}

fn digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
    }
    value
}

fn convert(conversion: char, arg: &Value, precision: Option<usize>) -> Result<String, EvalError> {
    match conversion {
        's' => {
            let text = arg.to_string();
            Ok(match precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            })
        }
        'r' => Ok(arg.repr()),
        'd' | 'i' => match arg {
            Value::Int(i) => Ok(i.to_string()),
            Value::Bool(b) => Ok(i64::from(*b).to_string()),
            Value::Float(f) if f.is_finite() => Ok((f.trunc() as i64).to_string()),
            other => Err(EvalError::Format(format!(
                "%{conversion} format: a number is required, not {}",
                other.type_name()
            ))),
        },
        'f' => {
            let value = arg.as_f64().ok_or_else(|| {
                EvalError::Format(format!(
                    "%f format: a number is required, not {}",
                    arg.type_name()
                ))
            })?;
            Ok(format!("{value:.*}", precision.unwrap_or(6)))
        }
        other => Err(EvalError::Format(format!(
            "unsupported format character '{other}'"
        ))),
    }
}

fn pad(out: &mut String, text: &str, width: usize, left_align: bool) {
    let fill = width.saturating_sub(text.chars().count());
    if !left_align {
        out.extend(std::iter::repeat_n(' ', fill));
    }
    out.push_str(text);
    if left_align {
        out.extend(std::iter::repeat_n(' ', fill));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(template: &str, args: Value) -> Result<Value, EvalError> {
        format_percent(template, &args)
    }

    #[test]
    fn test_single_argument() {
        assert_eq!(fmt("%s", Value::str("Ada")).unwrap(), Value::str("Ada"));
        assert_eq!(fmt("%r", Value::str("Ada")).unwrap(), Value::str("'Ada'"));
        assert_eq!(fmt("100%%", Value::list(Vec::new())).unwrap(), Value::str("100%"));
    }

    #[test]
    fn test_widths_and_precision() {
        let args = Value::list([Value::Float(1.23456), Value::Int(7), Value::str("x")]);
        assert_eq!(
            fmt("%.2f|%3d|%-3s|", args).unwrap(),
            Value::str("1.23|  7|x  |")
        );
        assert_eq!(fmt("%d", Value::Float(9.7)).unwrap(), Value::str("9"));
    }

    #[test]
    fn test_oversized_fields_rejected() {
        assert!(matches!(
            fmt("%99999999999999999999s", Value::str("x")),
            Err(EvalError::Format(_))
        ));
        assert!(matches!(
            fmt("%.5000f", Value::Float(1.0)),
            Err(EvalError::Format(_))
        ));
        let widest = format!("%{MAX_FIELD_WIDTH}s");
        let Value::Str(text) = fmt(&widest, Value::str("x")).unwrap() else {
            panic!("expected a string");
        };
        assert_eq!(text.len(), MAX_FIELD_WIDTH);
    }

    #[test]
    fn test_argument_count_mismatch() {
        assert!(matches!(
            fmt("%s %s", Value::str("one")),
            Err(EvalError::Format(_))
        ));
        assert!(matches!(
            fmt("%s", Value::list([Value::Int(1), Value::Int(2)])),
            Err(EvalError::Format(_))
        ));
        assert!(matches!(fmt("%d", Value::str("x")), Err(EvalError::Format(_))));
    }
}
