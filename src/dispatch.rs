//! Request layer: an operation name plus a JSON payload in, a JSON result
//! out. Failures never escape as Rust errors from [`Dispatcher::handle`];
//! they become `{"error": "<message>"}`.

use crate::engine::TableEngine;
use crate::error::TableError;
use crate::identity::{CallerContext, require_caller};
use crate::store::DocumentStore;
use crate::types::{Column, Fields, NewTable, Row};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as Json, json};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTable,
    ListTables,
    UpdateTable,
    DeleteTable,
    CloneTable,
    AddColumn,
    UpdateColumn,
    DeleteColumn,
    AddRow,
    UpdateRow,
    DeleteRow,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::CreateTable,
        Operation::ListTables,
        Operation::UpdateTable,
        Operation::DeleteTable,
        Operation::CloneTable,
        Operation::AddColumn,
        Operation::UpdateColumn,
        Operation::DeleteColumn,
        Operation::AddRow,
        Operation::UpdateRow,
        Operation::DeleteRow,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateTable => "create_table",
            Operation::ListTables => "list_tables",
            Operation::UpdateTable => "update_table",
            Operation::DeleteTable => "delete_table",
            Operation::CloneTable => "clone_table",
            Operation::AddColumn => "add_column",
            Operation::UpdateColumn => "update_column",
            Operation::DeleteColumn => "delete_column",
            Operation::AddRow => "add_row",
            Operation::UpdateRow => "update_row",
            Operation::DeleteRow => "delete_row",
        }
    }
}

/// Every field any operation reads. Absent fields stay `None` so each
/// operation reports exactly which one it needed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    #[serde(rename = "tableId")]
    table_id: Option<String>,
    #[serde(rename = "columnKey")]
    column_key: Option<String>,
    #[serde(rename = "rowIndex")]
    row_index: Option<i64>,
    updates: Option<Fields>,
    column: Option<Column>,
    row: Option<Row>,
}

impl Payload {
    fn table_id(&self) -> Result<&str, TableError> {
        non_empty(self.table_id.as_deref(), "tableId")
    }

    fn column_key(&self) -> Result<&str, TableError> {
        non_empty(self.column_key.as_deref(), "columnKey")
    }

    fn row_index(&self) -> Result<i64, TableError> {
        self.row_index.ok_or_else(|| TableError::missing("rowIndex"))
    }

    fn take_updates(&mut self) -> Fields {
        self.updates.take().unwrap_or_default()
    }
}

fn non_empty<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, TableError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TableError::missing(field))
}

fn decode<T: DeserializeOwned>(payload: Json) -> Result<T, TableError> {
    let payload = if payload.is_null() { json!({}) } else { payload };
    serde_json::from_value(payload)
        .map_err(|e| TableError::Validation(format!("invalid payload: {e}")))
}

fn success() -> Json {
    json!({ "success": true })
}

pub struct Dispatcher<S> {
    engine: Arc<TableEngine<S>>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S: DocumentStore> Dispatcher<S> {
    pub fn new(engine: Arc<TableEngine<S>>) -> Self {
        Self { engine }
    }

    /// Runs `operation` and folds any failure into `{"error": ...}`.
    pub async fn handle(
        &self,
        caller: Option<&CallerContext>,
        operation: &str,
        payload: Json,
    ) -> Json {
        let result = match Operation::parse(operation) {
            Some(op) => self.execute(caller, op, payload).await,
            None => Err(TableError::Validation(format!(
                "unknown operation '{operation}'"
            ))),
        };
        match result {
            Ok(body) => body,
            Err(err) => {
                debug!(operation, code = err.code_str(), error = %err, "request failed");
                json!({ "error": err.to_string() })
            }
        }
    }

    pub async fn execute(
        &self,
        caller: Option<&CallerContext>,
        operation: Operation,
        payload: Json,
    ) -> Result<Json, TableError> {
        let caller = require_caller(caller)?;
        let engine = &self.engine;

        match operation {
            Operation::CreateTable => {
                let request: NewTable = decode(payload)?;
                let table_id = engine.create_table(caller, request).await?;
                Ok(json!({ "tableId": table_id }))
            }
            Operation::ListTables => {
                let tables = engine.list_tables(caller).await?;
                let tables =
                    serde_json::to_value(tables).map_err(|e| TableError::Encode(e.to_string()))?;
                Ok(json!({ "tables": tables }))
            }
            Operation::UpdateTable => {
                let mut p: Payload = decode(payload)?;
                let updates = p.take_updates();
                engine.update_table(caller, p.table_id()?, updates).await?;
                Ok(success())
            }
            Operation::DeleteTable => {
                let p: Payload = decode(payload)?;
                engine.delete_table(caller, p.table_id()?).await?;
                Ok(success())
            }
            Operation::CloneTable => {
                let p: Payload = decode(payload)?;
                let table_id = engine.clone_table(caller, p.table_id()?).await?;
                Ok(json!({ "tableId": table_id }))
            }
            Operation::AddColumn => {
                let mut p: Payload = decode(payload)?;
                let column = p.column.take().ok_or_else(|| TableError::missing("column"))?;
                engine.add_column(caller, p.table_id()?, column).await?;
                Ok(success())
            }
            Operation::UpdateColumn => {
                let mut p: Payload = decode(payload)?;
                let updates = p.take_updates();
                engine
                    .update_column(caller, p.table_id()?, p.column_key()?, updates)
                    .await?;
                Ok(success())
            }
            Operation::DeleteColumn => {
                let p: Payload = decode(payload)?;
                engine
                    .delete_column(caller, p.table_id()?, p.column_key()?)
                    .await?;
                Ok(success())
            }
            Operation::AddRow => {
                let mut p: Payload = decode(payload)?;
                let row = p.row.take().unwrap_or_default();
                engine.add_row(caller, p.table_id()?, row).await?;
                Ok(success())
            }
            Operation::UpdateRow => {
                let mut p: Payload = decode(payload)?;
                let updates = p.take_updates();
                engine
                    .update_row(caller, p.table_id()?, p.row_index()?, updates)
                    .await?;
                Ok(success())
            }
            Operation::DeleteRow => {
                let p: Payload = decode(payload)?;
                engine
                    .delete_row(caller, p.table_id()?, p.row_index()?)
                    .await?;
                Ok(success())
            }
        }
    }
}
