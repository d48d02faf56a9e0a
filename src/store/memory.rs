use super::{DocumentStore, StoredTable};
use crate::error::TableError;
use crate::types::{TableDocument, TableId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Entry {
    revision: u64,
    body: Vec<u8>,
}

/// In-process store. Documents are kept JSON-encoded, so reads never alias
/// the stored value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    owners: RwLock<HashMap<String, BTreeMap<TableId, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_count(&self, owner: &str) -> usize {
        self.owners.read().get(owner).map_or(0, BTreeMap::len)
    }

    pub fn revision(&self, owner: &str, table_id: &str) -> Option<u64> {
        self.owners
            .read()
            .get(owner)
            .and_then(|tables| tables.get(table_id))
            .map(|e| e.revision)
    }
}

fn encode(document: &TableDocument) -> Result<Vec<u8>, TableError> {
    serde_json::to_vec(document).map_err(|e| TableError::Encode(e.to_string()))
}

fn decode(id: &str, entry: &Entry) -> Result<StoredTable, TableError> {
    let document = serde_json::from_slice(&entry.body)
        .map_err(|e| TableError::Decode(format!("table '{id}': {e}")))?;
    Ok(StoredTable {
        id: id.to_string(),
        revision: entry.revision,
        document,
    })
}

impl DocumentStore for MemoryStore {
    async fn create(&self, owner: &str, document: TableDocument) -> Result<StoredTable, TableError> {
        let body = encode(&document)?;
        let id = Uuid::new_v4().simple().to_string();
        self.owners
            .write()
            .entry(owner.to_string())
            .or_default()
            .insert(id.clone(), Entry { revision: 1, body });
        Ok(StoredTable {
            id,
            revision: 1,
            document,
        })
    }

    async fn get(&self, owner: &str, table_id: &str) -> Result<Option<StoredTable>, TableError> {
        let owners = self.owners.read();
        let Some(entry) = owners.get(owner).and_then(|tables| tables.get(table_id)) else {
            return Ok(None);
        };
        decode(table_id, entry).map(Some)
    }

    async fn list(&self, owner: &str) -> Result<Vec<StoredTable>, TableError> {
        let owners = self.owners.read();
        let Some(tables) = owners.get(owner) else {
            return Ok(Vec::new());
        };
        tables.iter().map(|(id, entry)| decode(id, entry)).collect()
    }

    async fn compare_and_swap(
        &self,
        owner: &str,
        table_id: &str,
        expected_revision: u64,
        document: TableDocument,
    ) -> Result<u64, TableError> {
        let body = encode(&document)?;
        let mut owners = self.owners.write();
        let entry = owners
            .get_mut(owner)
            .and_then(|tables| tables.get_mut(table_id))
            .ok_or_else(|| TableError::not_found(table_id))?;
        if entry.revision != expected_revision {
            return Err(TableError::Conflict {
                table_id: table_id.to_string(),
                expected: expected_revision,
                actual: entry.revision,
            });
        }
        entry.revision += 1;
        entry.body = body;
        Ok(entry.revision)
    }

    async fn delete(&self, owner: &str, table_id: &str) -> Result<bool, TableError> {
        let mut owners = self.owners.write();
        Ok(owners
            .get_mut(owner)
            .and_then(|tables| tables.remove(table_id))
            .is_some())
    }
}
