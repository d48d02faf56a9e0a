//! In-memory structural transforms on a single [`TableDocument`].
//!
//! Each function either fails without touching the document or applies the
//! whole change. The `bool` results report whether the document changed, so
//! callers can skip the write for no-op requests.

use crate::config::ColumnKeyPolicy;
use crate::error::TableError;
use crate::mapper::map_row_values;
use crate::types::{Column, Fields, NewTable, Row, TableDocument, Value};
use std::collections::HashSet;

const KEY_FIELD: &str = "Key";
const TABLE_ID_FIELD: &str = "tableId";

pub fn build_document(
    request: NewTable,
    policy: ColumnKeyPolicy,
) -> Result<TableDocument, TableError> {
    if request.name.is_empty() {
        return Err(TableError::Validation("Name and Columns are required".into()));
    }
    if request.columns.is_empty() {
        return Err(TableError::Validation("Name and Columns are required".into()));
    }
    for column in &request.columns {
        validate_column(column)?;
    }
    if policy == ColumnKeyPolicy::Reject {
        ensure_unique_keys(&request.columns)?;
    }

    let rows = request
        .rows
        .iter()
        .map(|raw| map_row_values(&request.columns, &raw.values))
        .collect();

    Ok(TableDocument {
        rows,
        metadata: request.metadata.unwrap_or_default(),
        ..TableDocument::new(request.name, request.columns)
    })
}

pub fn validate_column(column: &Column) -> Result<(), TableError> {
    if column.key.is_empty() {
        return Err(TableError::Validation("column Key is required".into()));
    }
    Ok(())
}

pub fn ensure_unique_keys(columns: &[Column]) -> Result<(), TableError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.key.as_str()) {
            return Err(TableError::DuplicateColumnKey {
                key: column.key.clone(),
            });
        }
    }
    Ok(())
}

/// Shallow-merges `updates` over the document's top-level fields. The
/// result must still decode as a table; `tableId` is never writable.
pub fn merge_table_fields(
    document: &mut TableDocument,
    updates: &Fields,
    policy: ColumnKeyPolicy,
) -> Result<bool, TableError> {
    if updates.is_empty() {
        return Ok(false);
    }
    if updates.contains_key(TABLE_ID_FIELD) {
        return Err(TableError::Validation("tableId cannot be updated".into()));
    }

    let serde_json::Value::Object(mut fields) =
        serde_json::to_value(&*document).map_err(|e| TableError::Encode(e.to_string()))?
    else {
        return Err(TableError::Encode("table did not encode as an object".into()));
    };
    for (name, value) in updates {
        let value = serde_json::to_value(value).map_err(|e| TableError::Encode(e.to_string()))?;
        fields.insert(name.clone(), value);
    }
    let merged: TableDocument = serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| TableError::Validation(format!("updates do not describe a table: {e}")))?;

    for column in &merged.columns {
        validate_column(column)?;
    }
    if policy == ColumnKeyPolicy::Reject {
        ensure_unique_keys(&merged.columns)?;
    }
    *document = merged;
    Ok(true)
}

pub fn add_column(
    document: &mut TableDocument,
    column: Column,
    policy: ColumnKeyPolicy,
) -> Result<(), TableError> {
    validate_column(&column)?;
    if policy == ColumnKeyPolicy::Reject && document.column(&column.key).is_some() {
        return Err(TableError::DuplicateColumnKey { key: column.key });
    }
    document.columns.push(column);
    Ok(())
}

/// Merges `updates` into the first column whose key is `key`. An unknown key
/// leaves the document untouched and is not an error. Renaming through
/// `Key` carries each row's field over to the new key, unless another column
/// already uses that key (only possible under `Permit`); rows are then left as
/// they are.
pub fn update_column(
    document: &mut TableDocument,
    key: &str,
    updates: &Fields,
    policy: ColumnKeyPolicy,
) -> Result<bool, TableError> {
    let Some(pos) = document.columns.iter().position(|c| c.key == key) else {
        return Ok(false);
    };
    if updates.is_empty() {
        return Ok(false);
    }

    let new_key = match updates.get(KEY_FIELD) {
        None => None,
        Some(Value::Text(k)) if !k.is_empty() => Some(k.clone()),
        Some(other) => {
            return Err(TableError::Validation(format!(
                "column Key must be a non-empty string, got {}",
                other.type_name()
            )));
        }
    };
    let renamed = new_key.filter(|k| k != key);
    let collides = renamed
        .as_deref()
        .is_some_and(|k| document.column(k).is_some());
    if collides && policy == ColumnKeyPolicy::Reject {
        return Err(TableError::DuplicateColumnKey {
            key: renamed.unwrap_or_default(),
        });
    }

    let column = &mut document.columns[pos];
    for (name, value) in updates {
        if name != KEY_FIELD {
            column.attributes.insert(name.clone(), value.clone());
        }
    }
    if let Some(new_key) = renamed {
        column.key = new_key.clone();
        // Rows already hold a value for the other column under that key.
        if collides {
            return Ok(true);
        }
        for row in &mut document.rows {
            if let Some(value) = row.remove(key) {
                row.insert(new_key.clone(), value);
            }
        }
    }
    Ok(true)
}

/// Removes every column keyed `key` and strips the field from all rows.
pub fn delete_column(document: &mut TableDocument, key: &str) -> bool {
    let before = document.columns.len();
    document.columns.retain(|c| c.key != key);
    let mut changed = document.columns.len() != before;
    for row in &mut document.rows {
        changed |= row.remove(key).is_some();
    }
    changed
}

pub fn add_row(document: &mut TableDocument, row: Row) -> Result<(), TableError> {
    if row.is_empty() {
        return Err(TableError::missing("row"));
    }
    document.rows.push(row);
    Ok(())
}

pub fn update_row(
    document: &mut TableDocument,
    index: i64,
    updates: &Fields,
) -> Result<bool, TableError> {
    let pos = row_position(document.rows.len(), index)?;
    if updates.is_empty() {
        return Ok(false);
    }
    let row = &mut document.rows[pos];
    for (name, value) in updates {
        row.insert(name.clone(), value.clone());
    }
    Ok(true)
}

/// Removes the row at `index`; later rows shift down by one.
pub fn delete_row(document: &mut TableDocument, index: i64) -> Result<Row, TableError> {
    let pos = row_position(document.rows.len(), index)?;
    Ok(document.rows.remove(pos))
}

pub fn row_position(len: usize, index: i64) -> Result<usize, TableError> {
    usize::try_from(index)
        .ok()
        .filter(|&pos| pos < len)
        .ok_or(TableError::OutOfRange { index, len })
}
