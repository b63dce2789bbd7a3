//! `?` placeholders to Postgres `$n` parameters.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// An empty row set for `IN`.
const EMPTY_LIST: &str = "(SELECT NULL WHERE FALSE)";

/// Rewrite `?` placeholders into `$1, $2, ...` and flatten list parameters.
///
/// A `Value::List` bound to a placeholder becomes a parenthesized group
/// (`IN ?` -> `IN ($1, $2)`). An empty list becomes an empty subquery, so
/// `IN` is false and `NOT (.. IN ..)` is true. Question marks inside quoted literals or identifiers are left
/// alone. The number of placeholders must equal the number of parameters.
pub fn expand(sql: &str, params: &[Value]) -> OrmResult<(String, Vec<Value>)> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + params.len() * 2);
    let mut flat = Vec::with_capacity(params.len());
    let mut next_param = params.iter();
    let mut seen = 0usize;
    let mut copied = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                // Skip literal; doubled quotes are escapes
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        if i + 1 < bytes.len() && bytes[i + 1] == quote {
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    i += 1;
                }
            }
            b'?' => {
                out.push_str(&sql[copied..i]);
                copied = i + 1;
                seen += 1;

                let param = next_param.next().ok_or_else(|| {
                    OrmError::construction(format!(
                        "statement has more placeholders than the {} parameters given",
                        params.len()
                    ))
                })?;
                push_param(&mut out, &mut flat, param);
            }
            _ => {}
        }
        i += 1;
    }

    if seen != params.len() {
        return Err(OrmError::construction(format!(
            "statement has {seen} placeholders but {} parameters were given",
            params.len()
        )));
    }

    out.push_str(&sql[copied..]);
    Ok((out, flat))
}

fn push_param(out: &mut String, flat: &mut Vec<Value>, param: &Value) {
    match param {
        Value::List(items) if items.is_empty() => out.push_str(EMPTY_LIST),
        Value::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                flat.push(item.clone());
                out.push_str(&format!("${}", flat.len()));
            }
            out.push(')');
        }
        scalar => {
            flat.push(scalar.clone());
            out.push_str(&format!("${}", flat.len()));
        }
    }
}
