use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell of a record, typed by its column kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(Option<String>),
}

impl FieldValue {
    /// Render the value the way it appears in a CSV cell.
    pub fn to_cell(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.clone().unwrap_or_default(),
        }
    }
}

/// One entity row keyed by column name. Column order lives on the entity, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: FieldValue) {
        self.fields.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn text(&self, column: &str) -> &str {
        match self.fields.get(column) {
            Some(FieldValue::Text(s)) => s,
            Some(FieldValue::Date(Some(s))) => s,
            _ => "",
        }
    }
}

/// A document as returned by the remote store: its id plus every other field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Integer,
    Url,
    Datetime,
    Boolean,
    /// Anything the remote reports that we never create ourselves (float, enum, ...).
    #[serde(other)]
    Other,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Url => "url",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedAttribute {
    pub key: String,
    pub kind: AttributeType,
    pub size: Option<u32>,
    pub required: bool,
}

/// Attribute metadata as reported by the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualAttribute {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub status: Option<String>,
}

impl ActualAttribute {
    pub fn is_available(&self) -> bool {
        matches!(self.status.as_deref(), None | Some("available"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "$updatedAt", default)]
    pub updated_at: String,
    #[serde(default)]
    pub attributes: Vec<ActualAttribute>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_deserializes_id_and_fields() {
        let json = r#"{"$id": "abc", "name": "Bank A", "deposit": 1000}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, "abc");
        assert_eq!(doc.str_field("name"), Some("Bank A"));
        assert_eq!(doc.data.get("deposit").and_then(|v| v.as_i64()), Some(1000));
    }

    #[test]
    fn test_unknown_attribute_type_maps_to_other() {
        let json = r#"{"key": "ratio", "type": "double", "status": "available"}"#;
        let attr: ActualAttribute = serde_json::from_str(json).unwrap();
        assert_eq!(attr.kind, AttributeType::Other);
        assert!(attr.is_available());
    }

    #[test]
    fn test_processing_attribute_is_not_available() {
        let json = r#"{"key": "name", "type": "string", "size": 100, "status": "processing"}"#;
        let attr: ActualAttribute = serde_json::from_str(json).unwrap();
        assert!(!attr.is_available());
        assert_eq!(attr.size, Some(100));
    }

    #[test]
    fn test_number_cell_has_no_trailing_fraction() {
        assert_eq!(FieldValue::Number(1000.0).to_cell(), "1000");
        assert_eq!(FieldValue::Number(12.5).to_cell(), "12.5");
        assert_eq!(FieldValue::Date(None).to_cell(), "");
    }
}
