//! Positional values to keyed rows.

use crate::types::{Column, Row, Value};

/// Builds a row from `values` laid out in `columns` order.
///
/// Missing trailing values become `Null`; values past the last column are
/// dropped. Strings spelling `true`/`false` (trimmed, any case) become
/// booleans and nothing else is coerced.
pub fn map_row_values(columns: &[Column], values: &[Value]) -> Row {
    columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let value = values.get(i).cloned().map(coerce).unwrap_or(Value::Null);
            (col.key.clone(), value)
        })
        .collect()
}

fn coerce(value: Value) -> Value {
    match value {
        Value::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => Value::Text(s),
        },
        other => other,
    }
}
