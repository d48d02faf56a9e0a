//! Owner-scoped tabular documents.
//!
//! A table is a named document holding an ordered list of columns (each
//! identified by a unique `Key`) and an ordered list of rows keyed by those
//! column keys. [`TableEngine`] applies structural edits (columns, rows,
//! whole-table create/clone/update/delete) as a single read-modify-write of
//! the document against a [`DocumentStore`], guarded by a revision
//! compare-and-swap. [`Dispatcher`] adapts operation names and JSON payloads
//! onto the engine.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod mapper;
pub mod store;
pub mod sync_bridge;
pub mod types;

pub use config::{ColumnKeyPolicy, EngineConfig};
pub use dispatch::{Dispatcher, Operation};
pub use engine::TableEngine;
pub use error::{TableError, TableErrorCode};
pub use identity::CallerContext;
pub use mapper::map_row_values;
pub use store::{DocumentStore, MemoryStore, StoredTable};
pub use sync_bridge::TableEngineSync;
pub use types::{Column, Fields, NewTable, RawRow, Row, Table, TableDocument, TableId, Value};
