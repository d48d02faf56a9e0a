use crate::engine::TableEngine;
use crate::error::TableError;
use crate::identity::CallerContext;
use crate::store::DocumentStore;
use crate::types::{Column, Fields, NewTable, Row, Table, TableId};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Drives an engine future to completion from synchronous code.
///
/// On a multi-thread runtime worker the thread is handed off with
/// `block_in_place`. A current-thread runtime cannot give up its only
/// worker, so the future runs on a scoped helper thread while the caller
/// waits; work that needs that runtime's IO or timer drivers would stall.
pub fn block_on_engine<F, T>(rt: &Handle, f: F) -> T
where
    F: Future<Output = T> + Send,
    T: Send,
{
    match Handle::try_current().map(|current| current.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| rt.block_on(f)),
        Ok(_) => std::thread::scope(|scope| match scope.spawn(move || rt.block_on(f)).join() {
            Ok(output) => output,
            Err(panic) => std::panic::resume_unwind(panic),
        }),
        Err(_) => rt.block_on(f),
    }
}

/// Blocking facade over [`TableEngine`] for callers without an async context.
/// Safe to call from inside either runtime flavor; see [`block_on_engine`].
pub struct TableEngineSync<S> {
    inner: Arc<TableEngine<S>>,
    rt: Handle,
}

impl<S: DocumentStore> TableEngineSync<S> {
    pub fn new(inner: Arc<TableEngine<S>>, rt: Handle) -> Self {
        Self { inner, rt }
    }

    pub fn create_table(
        &self,
        caller: &CallerContext,
        request: NewTable,
    ) -> Result<TableId, TableError> {
        block_on_engine(&self.rt, self.inner.create_table(caller, request))
    }

    pub fn list_tables(&self, caller: &CallerContext) -> Result<Vec<Table>, TableError> {
        block_on_engine(&self.rt, self.inner.list_tables(caller))
    }

    pub fn get_table(&self, caller: &CallerContext, table_id: &str) -> Result<Table, TableError> {
        block_on_engine(&self.rt, self.inner.get_table(caller, table_id))
    }

    pub fn update_table(
        &self,
        caller: &CallerContext,
        table_id: &str,
        updates: Fields,
    ) -> Result<(), TableError> {
        block_on_engine(&self.rt, self.inner.update_table(caller, table_id, updates))
    }

    pub fn delete_table(&self, caller: &CallerContext, table_id: &str) -> Result<(), TableError> {
        block_on_engine(&self.rt, self.inner.delete_table(caller, table_id))
    }

    pub fn clone_table(&self, caller: &CallerContext, table_id: &str) -> Result<TableId, TableError> {
        block_on_engine(&self.rt, self.inner.clone_table(caller, table_id))
    }

    pub fn add_column(
        &self,
        caller: &CallerContext,
        table_id: &str,
        column: Column,
    ) -> Result<(), TableError> {
        block_on_engine(&self.rt, self.inner.add_column(caller, table_id, column))
    }

    pub fn update_column(
        &self,
        caller: &CallerContext,
        table_id: &str,
        column_key: &str,
        updates: Fields,
    ) -> Result<(), TableError> {
        block_on_engine(
            &self.rt,
            self.inner
                .update_column(caller, table_id, column_key, updates),
        )
    }

    pub fn delete_column(
        &self,
        caller: &CallerContext,
        table_id: &str,
        column_key: &str,
    ) -> Result<(), TableError> {
        block_on_engine(
            &self.rt,
            self.inner.delete_column(caller, table_id, column_key),
        )
    }

    pub fn add_row(&self, caller: &CallerContext, table_id: &str, row: Row) -> Result<(), TableError> {
        block_on_engine(&self.rt, self.inner.add_row(caller, table_id, row))
    }

    pub fn update_row(
        &self,
        caller: &CallerContext,
        table_id: &str,
        row_index: i64,
        updates: Fields,
    ) -> Result<(), TableError> {
        block_on_engine(
            &self.rt,
            self.inner.update_row(caller, table_id, row_index, updates),
        )
    }

    pub fn delete_row(
        &self,
        caller: &CallerContext,
        table_id: &str,
        row_index: i64,
    ) -> Result<(), TableError> {
        block_on_engine(&self.rt, self.inner.delete_row(caller, table_id, row_index))
    }
}
