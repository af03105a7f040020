use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::DocumentId;

/// A schemaless document as held by a [`DocumentStore`](crate::store::DocumentStore).
/// Identity and timestamps are owned by the store; everything else lives in `content`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(skip)]
    pub collection: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl StoredDocument {
    /// Decode the content into a typed record.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Record<T>, serde_json::Error> {
        let body = serde_json::from_value(Value::Object(self.content))?;
        Ok(Record {
            id: self.id,
            body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row representation of a document.
/// Maps to the `documents` PostgreSQL table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub collection: String,
    pub content: sqlx::types::Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for StoredDocument {
    fn from(row: DocumentRow) -> Self {
        StoredDocument {
            id: DocumentId::from_stored(row.id),
            collection: row.collection,
            created_at: row.created_at,
            updated_at: row.updated_at,
            content: row.content.0,
        }
    }
}

/// A typed document: the store-owned envelope around an entity body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub body: T,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    fn stored(content: Value) -> StoredDocument {
        let now = Utc::now();
        StoredDocument {
            id: DocumentId::parse("n1").unwrap(),
            collection: "notes".into(),
            created_at: now,
            updated_at: now,
            content: content.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn decode_wraps_body_with_envelope() {
        let record: Record<Note> = stored(json!({ "text": "hello" })).decode().unwrap();
        assert_eq!(record.id.as_str(), "n1");
        assert_eq!(record.body, Note { text: "hello".into() });
    }

    #[test]
    fn decode_reports_shape_mismatch() {
        assert!(stored(json!({ "text": 5 })).decode::<Note>().is_err());
    }

    #[test]
    fn record_serializes_flat() {
        let record: Record<Note> = stored(json!({ "text": "hi" })).decode().unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], "n1");
        assert_eq!(value["text"], "hi");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("body").is_none());
    }
}
