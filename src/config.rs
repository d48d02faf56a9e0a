#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKeyPolicy {
    /// Reject any mutation that would leave two columns sharing a `Key`.
    #[default]
    Reject,
    /// Accept duplicate keys as the unhardened handlers did.
    Permit,
}

/// Runtime configuration for a [`crate::engine::TableEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub column_key_policy: ColumnKeyPolicy,
    /// Upper bound on the JSON-encoded size of one table document.
    pub max_document_bytes: usize,
    /// Stamp `createdAt` / `updatedAt` (epoch millis) on writes.
    pub record_timestamps: bool,
}

pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            column_key_policy: ColumnKeyPolicy::Reject,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            record_timestamps: true,
        }
    }
}

impl EngineConfig {
    pub fn hardened() -> Self {
        Self::default()
    }

    /// Behaves like the original handlers: duplicate column keys are
    /// accepted and no timestamps are written.
    pub fn literal() -> Self {
        Self {
            column_key_policy: ColumnKeyPolicy::Permit,
            record_timestamps: false,
            ..Self::default()
        }
    }

    pub fn with_column_key_policy(mut self, policy: ColumnKeyPolicy) -> Self {
        self.column_key_policy = policy;
        self
    }

    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    pub fn enforces_unique_keys(&self) -> bool {
        matches!(self.column_key_policy, ColumnKeyPolicy::Reject)
    }
}
