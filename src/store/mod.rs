//! Persistence boundary. A store keeps one document per (owner, table id)
//! and versions it with a revision counter so the engine can perform its
//! read-modify-write cycle as a single compare-and-swap.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::TableError;
use crate::types::{Table, TableDocument, TableId};
use std::future::Future;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub id: TableId,
    pub revision: u64,
    pub document: TableDocument,
}

impl StoredTable {
    pub fn into_table(self) -> Table {
        Table {
            id: self.id,
            document: self.document,
        }
    }
}

pub trait DocumentStore: Send + Sync {
    /// Stores `document` under a freshly generated id at revision 1.
    fn create(
        &self,
        owner: &str,
        document: TableDocument,
    ) -> impl Future<Output = Result<StoredTable, TableError>> + Send;

    /// Returns an independent copy of the stored document.
    fn get(
        &self,
        owner: &str,
        table_id: &str,
    ) -> impl Future<Output = Result<Option<StoredTable>, TableError>> + Send;

    fn list(
        &self,
        owner: &str,
    ) -> impl Future<Output = Result<Vec<StoredTable>, TableError>> + Send;

    /// Replaces the document only if its revision still equals
    /// `expected_revision`; returns the new revision.
    fn compare_and_swap(
        &self,
        owner: &str,
        table_id: &str,
        expected_revision: u64,
        document: TableDocument,
    ) -> impl Future<Output = Result<u64, TableError>> + Send;

    /// Returns whether a document was removed.
    fn delete(
        &self,
        owner: &str,
        table_id: &str,
    ) -> impl Future<Output = Result<bool, TableError>> + Send;
}
