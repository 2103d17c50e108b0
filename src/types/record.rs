//! Raw records as delivered by the remote check-in tables

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which remote table a raw record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    /// Intake inbox (SMS / voice pipeline)
    Intake,
    /// Personal check-ins table
    Personal,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Intake => "intake",
            SourceTag::Personal => "personal",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a remote table, fields left untyped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    /// Row creation time assigned by the table service
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Build a record from an id, creation time and a JSON object of fields
    pub fn new(id: impl Into<String>, created_time: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: Some(id.into()),
            created_time: Some(created_time.into()),
            fields,
        }
    }
}

/// A raw record paired with the table it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub tag: SourceTag,
    pub record: RawRecord,
}

impl TaggedRecord {
    pub fn new(tag: SourceTag, record: RawRecord) -> Self {
        Self { tag, record }
    }
}

/// Response body of a table listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<RawRecord>,
}
