//! PostgreSQL literal escaping, for rendering statements as text.

use crate::error::{DbError, DbResult};
use crate::value::Value;
use std::fmt::Write;

/// Quote `text` as a string literal.
///
/// Embedded `'` are doubled. Text containing `\` is written as an escape
/// string (`E'...'`) with each `\` doubled, so the result reads the same
/// whatever `standard_conforming_strings` is set to. NUL bytes cannot be
/// represented and are rejected.
pub fn quote_literal(text: &str) -> DbResult<String> {
    if text.contains('\0') {
        return Err(DbError::Serialization(
            "string literal contains a NUL byte".to_string(),
        ));
    }
    let has_backslash = text.contains('\\');
    let mut out = String::with_capacity(text.len() + 3);
    if has_backslash {
        out.push('E');
    }
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    Ok(out)
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "'NaN'::float8".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "'Infinity'::float8".to_string()
        } else {
            "'-Infinity'::float8".to_string()
        }
    } else {
        f.to_string()
    }
}

/// Literal SQL for a native value.
pub fn escape_value(value: &Value) -> DbResult<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(float_literal(*f)),
        Value::Text(s) => quote_literal(s),
        Value::Json(v) => quote_literal(&v.to_string()),
        Value::Bytes(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 12);
            out.push_str("E'\\\\x");
            for b in bytes {
                let _ = write!(out, "{b:02x}");
            }
            out.push_str("'::bytea");
            Ok(out)
        }
        Value::Array(items) if items.is_empty() => Ok("'{}'".to_string()),
        Value::Array(items) => {
            let items = items.iter().map(escape_value).collect::<DbResult<Vec<_>>>()?;
            Ok(format!("ARRAY[{}]", items.join(", ")))
        }
    }
}
