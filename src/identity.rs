use crate::error::TableError;
use serde::{Deserialize, Serialize};

/// Verified identity of the caller. Every table is namespaced under its
/// `owner_id`; the engine only ever sees identities handed to it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CallerContext {
    pub owner_id: String,
}

impl CallerContext {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Resolves the optional identity attached to a request. Missing or blank
/// identities are rejected before any engine call.
pub fn require_caller(caller: Option<&CallerContext>) -> Result<&CallerContext, TableError> {
    match caller {
        Some(c) if !c.owner_id.trim().is_empty() => Ok(c),
        _ => Err(TableError::Unauthenticated),
    }
}
