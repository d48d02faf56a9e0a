use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TableId = String;

/// A field value. Serializes as the plain JSON value it wraps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    /// Integers above `i64::MAX`; kept exact instead of widening to a float.
    Unsigned(u64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Unsigned(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Value::Unsigned(value), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// Keyed record: column `Key` to value. Absent keys read as unset.
pub type Row = BTreeMap<String, Value>;

/// Open attribute mapping used for metadata and partial updates.
pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(flatten)]
    pub attributes: Fields,
}

impl Column {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: Fields::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Positional row as supplied on create: `{"Values": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawRow {
    #[serde(rename = "Values", default)]
    pub values: Vec<Value>,
}

impl RawRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Creation request: `Name`, `Columns`, optional positional `Rows` and
/// `Metadata`. Missing fields decode as empty so presence can be validated
/// with a proper error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NewTable {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Columns", default)]
    pub columns: Vec<Column>,
    #[serde(rename = "Rows", default)]
    pub rows: Vec<RawRow>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<Fields>,
}

impl NewTable {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<RawRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_metadata(mut self, metadata: Fields) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// The stored unit: one table, read and written whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Columns", default)]
    pub columns: Vec<Column>,
    #[serde(rename = "Rows", default)]
    pub rows: Vec<Row>,
    #[serde(rename = "Metadata", default)]
    pub metadata: Fields,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    /// Top-level fields written through `update_table` that the engine does
    /// not interpret.
    #[serde(flatten)]
    pub extra: Fields,
}

impl TableDocument {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            metadata: Fields::new(),
            created_at: None,
            updated_at: None,
            extra: Fields::new(),
        }
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn column_keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }
}

/// A document together with the identifier the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    #[serde(rename = "tableId")]
    pub id: TableId,
    #[serde(flatten)]
    pub document: TableDocument,
}
