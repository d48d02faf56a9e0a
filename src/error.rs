use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableErrorCode {
    Validation,
    DuplicateColumnKey,
    TableNotFound,
    RowOutOfRange,
    Unauthenticated,
    Conflict,
    DocumentTooLarge,
    Encode,
    Decode,
}

impl TableErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TableErrorCode::Validation => "validation",
            TableErrorCode::DuplicateColumnKey => "duplicate_column_key",
            TableErrorCode::TableNotFound => "table_not_found",
            TableErrorCode::RowOutOfRange => "row_out_of_range",
            TableErrorCode::Unauthenticated => "unauthenticated",
            TableErrorCode::Conflict => "conflict",
            TableErrorCode::DocumentTooLarge => "document_too_large",
            TableErrorCode::Encode => "encode",
            TableErrorCode::Decode => "decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("column key '{key}' already exists")]
    DuplicateColumnKey { key: String },
    #[error("table '{table_id}' not found")]
    NotFound { table_id: String },
    #[error("Row index out of range: {index} (rows: {len})")]
    OutOfRange { index: i64, len: usize },
    #[error("User must be authenticated")]
    Unauthenticated,
    #[error("conflict on table '{table_id}': expected revision {expected}, found {actual}")]
    Conflict {
        table_id: String,
        expected: u64,
        actual: u64,
    },
    #[error("document is {size} bytes, limit is {limit}")]
    DocumentTooLarge { size: usize, limit: usize },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl TableError {
    pub fn code(&self) -> TableErrorCode {
        match self {
            TableError::Validation(_) => TableErrorCode::Validation,
            TableError::DuplicateColumnKey { .. } => TableErrorCode::DuplicateColumnKey,
            TableError::NotFound { .. } => TableErrorCode::TableNotFound,
            TableError::OutOfRange { .. } => TableErrorCode::RowOutOfRange,
            TableError::Unauthenticated => TableErrorCode::Unauthenticated,
            TableError::Conflict { .. } => TableErrorCode::Conflict,
            TableError::DocumentTooLarge { .. } => TableErrorCode::DocumentTooLarge,
            TableError::Encode(_) => TableErrorCode::Encode,
            TableError::Decode(_) => TableErrorCode::Decode,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    pub(crate) fn not_found(table_id: &str) -> Self {
        TableError::NotFound {
            table_id: table_id.to_string(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        TableError::Validation(format!("{field} is required"))
    }
}
