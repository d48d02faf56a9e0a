pub mod mutation;

use crate::config::EngineConfig;
use crate::error::TableError;
use crate::identity::CallerContext;
use crate::store::{DocumentStore, StoredTable};
use crate::types::{Column, Fields, NewTable, Row, Table, TableDocument, TableId};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Owns the table lifecycle and every structural operation. Each mutation is
/// one read of the document, an in-memory transform, and one
/// compare-and-swap against the revision that was read.
pub struct TableEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S> Clone for TableEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: DocumentStore> TableEngine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn create_table(
        &self,
        caller: &CallerContext,
        request: NewTable,
    ) -> Result<TableId, TableError> {
        let mut document = mutation::build_document(request, self.config.column_key_policy)
            .inspect_err(|err| log_rejected_key(caller, "create_table", err))?;
        self.stamp_created(&mut document);
        self.check_size(&document)?;
        let stored = self.store.create(caller.owner_id(), document).await?;
        info!(
            owner = caller.owner_id(),
            table_id = %stored.id,
            rows = stored.document.rows.len(),
            "table created"
        );
        Ok(stored.id)
    }

    pub async fn list_tables(&self, caller: &CallerContext) -> Result<Vec<Table>, TableError> {
        let tables = self.store.list(caller.owner_id()).await?;
        Ok(tables.into_iter().map(StoredTable::into_table).collect())
    }

    pub async fn get_table(
        &self,
        caller: &CallerContext,
        table_id: &str,
    ) -> Result<Table, TableError> {
        Ok(self.load(caller, table_id).await?.into_table())
    }

    /// Shallow-merges arbitrary top-level fields into the stored document.
    pub async fn update_table(
        &self,
        caller: &CallerContext,
        table_id: &str,
        updates: Fields,
    ) -> Result<(), TableError> {
        let policy = self.config.column_key_policy;
        self.mutate(caller, table_id, "update_table", move |doc| {
            mutation::merge_table_fields(doc, &updates, policy)
        })
        .await
    }

    pub async fn delete_table(&self, caller: &CallerContext, table_id: &str) -> Result<(), TableError> {
        require_table_id(table_id)?;
        if !self.store.delete(caller.owner_id(), table_id).await? {
            return Err(TableError::not_found(table_id));
        }
        info!(owner = caller.owner_id(), table_id, "table deleted");
        Ok(())
    }

    /// Copies columns, rows, metadata and extra fields into a new document
    /// under a fresh id.
    pub async fn clone_table(
        &self,
        caller: &CallerContext,
        table_id: &str,
    ) -> Result<TableId, TableError> {
        let source = self.load(caller, table_id).await?;
        let mut document = source.document;
        document.created_at = None;
        document.updated_at = None;
        self.stamp_created(&mut document);
        self.check_size(&document)?;
        let stored = self.store.create(caller.owner_id(), document).await?;
        info!(
            owner = caller.owner_id(),
            source = table_id,
            table_id = %stored.id,
            "table cloned"
        );
        Ok(stored.id)
    }

    pub async fn add_column(
        &self,
        caller: &CallerContext,
        table_id: &str,
        column: Column,
    ) -> Result<(), TableError> {
        mutation::validate_column(&column)?;
        let policy = self.config.column_key_policy;
        self.mutate(caller, table_id, "add_column", move |doc| {
            mutation::add_column(doc, column, policy).map(|()| true)
        })
        .await
    }

    pub async fn update_column(
        &self,
        caller: &CallerContext,
        table_id: &str,
        column_key: &str,
        updates: Fields,
    ) -> Result<(), TableError> {
        require_column_key(column_key)?;
        let policy = self.config.column_key_policy;
        self.mutate(caller, table_id, "update_column", move |doc| {
            mutation::update_column(doc, column_key, &updates, policy)
        })
        .await
    }

    pub async fn delete_column(
        &self,
        caller: &CallerContext,
        table_id: &str,
        column_key: &str,
    ) -> Result<(), TableError> {
        require_column_key(column_key)?;
        self.mutate(caller, table_id, "delete_column", move |doc| {
            Ok(mutation::delete_column(doc, column_key))
        })
        .await
    }

    pub async fn add_row(
        &self,
        caller: &CallerContext,
        table_id: &str,
        row: Row,
    ) -> Result<(), TableError> {
        if row.is_empty() {
            return Err(TableError::missing("row"));
        }
        self.mutate(caller, table_id, "add_row", move |doc| {
            mutation::add_row(doc, row).map(|()| true)
        })
        .await
    }

    pub async fn update_row(
        &self,
        caller: &CallerContext,
        table_id: &str,
        row_index: i64,
        updates: Fields,
    ) -> Result<(), TableError> {
        self.mutate(caller, table_id, "update_row", move |doc| {
            mutation::update_row(doc, row_index, &updates)
        })
        .await
    }

    /// Removes one row. Indices of later rows shift down, so a batch of
    /// index-based deletes must re-read the rows between calls.
    pub async fn delete_row(
        &self,
        caller: &CallerContext,
        table_id: &str,
        row_index: i64,
    ) -> Result<(), TableError> {
        self.mutate(caller, table_id, "delete_row", move |doc| {
            mutation::delete_row(doc, row_index).map(|_| true)
        })
        .await
    }

    async fn load(&self, caller: &CallerContext, table_id: &str) -> Result<StoredTable, TableError> {
        require_table_id(table_id)?;
        self.store
            .get(caller.owner_id(), table_id)
            .await?
            .ok_or_else(|| TableError::not_found(table_id))
    }

    async fn mutate<F>(
        &self,
        caller: &CallerContext,
        table_id: &str,
        operation: &'static str,
        apply: F,
    ) -> Result<(), TableError>
    where
        F: FnOnce(&mut TableDocument) -> Result<bool, TableError> + Send,
    {
        let StoredTable {
            revision,
            mut document,
            ..
        } = self.load(caller, table_id).await?;

        let changed = apply(&mut document)
            .inspect_err(|err| log_rejected_key(caller, operation, err))?;
        if !changed {
            debug!(owner = caller.owner_id(), table_id, operation, "no change");
            return Ok(());
        }

        if self.config.record_timestamps {
            document.updated_at = Some(now_millis());
        }
        self.check_size(&document)?;

        match self
            .store
            .compare_and_swap(caller.owner_id(), table_id, revision, document)
            .await
        {
            Ok(new_revision) => {
                debug!(
                    owner = caller.owner_id(),
                    table_id,
                    operation,
                    revision = new_revision,
                    "table updated"
                );
                Ok(())
            }
            Err(err) => {
                if matches!(err, TableError::Conflict { .. }) {
                    warn!(owner = caller.owner_id(), table_id, operation, error = %err, "concurrent write");
                }
                Err(err)
            }
        }
    }

    fn stamp_created(&self, document: &mut TableDocument) {
        if self.config.record_timestamps {
            let now = now_millis();
            document.created_at = Some(now);
            document.updated_at = Some(now);
        }
    }

    fn check_size(&self, document: &TableDocument) -> Result<(), TableError> {
        let size = serde_json::to_vec(document)
            .map_err(|e| TableError::Encode(e.to_string()))?
            .len();
        if size > self.config.max_document_bytes {
            return Err(TableError::DocumentTooLarge {
                size,
                limit: self.config.max_document_bytes,
            });
        }
        Ok(())
    }
}

fn log_rejected_key(caller: &CallerContext, operation: &str, err: &TableError) {
    if let TableError::DuplicateColumnKey { key } = err {
        warn!(owner = caller.owner_id(), operation, key = %key, "duplicate column key rejected");
    }
}

fn require_table_id(table_id: &str) -> Result<(), TableError> {
    if table_id.is_empty() {
        return Err(TableError::missing("tableId"));
    }
    Ok(())
}

fn require_column_key(column_key: &str) -> Result<(), TableError> {
    if column_key.is_empty() {
        return Err(TableError::missing("columnKey"));
    }
    Ok(())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::RawRow;

    fn engine() -> TableEngine<MemoryStore> {
        TableEngine::new(Arc::new(MemoryStore::new()), EngineConfig::default())
    }

    #[tokio::test]
    async fn noop_mutation_does_not_bump_revision() {
        let engine = engine();
        let alice = CallerContext::new("alice");
        let id = engine
            .create_table(&alice, NewTable::new("T", vec![Column::new("x")]))
            .await
            .expect("create");
        engine
            .update_column(&alice, &id, "missing", Fields::from([("Label".into(), "L".into())]))
            .await
            .expect("unknown column is a successful no-op");
        assert_eq!(engine.store().revision("alice", &id), Some(1));

        engine
            .add_column(&alice, &id, Column::new("y"))
            .await
            .expect("add column");
        assert_eq!(engine.store().revision("alice", &id), Some(2));
    }

    #[tokio::test]
    async fn timestamps_are_stamped_when_enabled() {
        let engine = engine();
        let alice = CallerContext::new("alice");
        let id = engine
            .create_table(
                &alice,
                NewTable::new("T", vec![Column::new("x")]).with_rows(vec![RawRow::default()]),
            )
            .await
            .expect("create");
        let table = engine.get_table(&alice, &id).await.expect("get");
        let created = table.document.created_at.expect("createdAt");
        assert!(table.document.updated_at.expect("updatedAt") >= created);

        let literal = TableEngine::new(Arc::new(MemoryStore::new()), EngineConfig::literal());
        let id = literal
            .create_table(&alice, NewTable::new("T", vec![Column::new("x")]))
            .await
            .expect("create");
        let table = literal.get_table(&alice, &id).await.expect("get");
        assert_eq!(table.document.created_at, None);
        assert_eq!(table.document.updated_at, None);
    }

    #[tokio::test]
    async fn oversized_document_is_rejected_without_write() {
        let engine = TableEngine::new(
            Arc::new(MemoryStore::new()),
            EngineConfig::default().with_max_document_bytes(256),
        );
        let alice = CallerContext::new("alice");
        let id = engine
            .create_table(&alice, NewTable::new("T", vec![Column::new("x")]))
            .await
            .expect("create");
        let big = Row::from([("x".into(), "v".repeat(512).into())]);
        let err = engine.add_row(&alice, &id, big).await.expect_err("too large");
        assert!(matches!(err, TableError::DocumentTooLarge { limit: 256, .. }));
        let table = engine.get_table(&alice, &id).await.expect("get");
        assert!(table.document.rows.is_empty());
        assert_eq!(engine.store().revision("alice", &id), Some(1));
    }

    #[tokio::test]
    async fn empty_identifiers_fail_validation_before_loading() {
        let engine = engine();
        let alice = CallerContext::new("alice");
        assert!(matches!(
            engine.delete_table(&alice, "").await,
            Err(TableError::Validation(_))
        ));
        assert!(matches!(
            engine.delete_column(&alice, "whatever", "").await,
            Err(TableError::Validation(_))
        ));
        assert!(matches!(
            engine.add_row(&alice, "whatever", Row::new()).await,
            Err(TableError::Validation(_))
        ));
    }
}
