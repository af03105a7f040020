/// Document identifier utilities.
///
/// Identifiers are generated by the store on insert as UUIDv7 strings, so
/// they sort roughly by creation time. Lookups accept any non-empty string:
/// an identifier that was never issued simply resolves to nothing.
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Issue a fresh identifier.
    pub fn generate() -> Self {
        DocumentId(Uuid::now_v7().to_string())
    }

    /// Parse a caller-supplied identifier, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(DocumentId(trimmed.to_string()))
        }
    }

    /// Wrap an identifier read back from the store.
    pub(crate) fn from_stored(raw: String) -> Self {
        DocumentId(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DocumentId> for serde_json::Value {
    fn from(id: DocumentId) -> Self {
        serde_json::Value::String(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
        assert!(Uuid::parse_str(b.as_str()).is_ok());
    }

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!(DocumentId::parse("  abc123 ").unwrap().as_str(), "abc123");
        assert!(DocumentId::parse("").is_none());
        assert!(DocumentId::parse("   ").is_none());
    }

    #[test]
    fn arbitrary_ids_parse() {
        let id = DocumentId::parse("64f1c2aa9b").unwrap();
        assert_eq!(id.to_string(), "64f1c2aa9b");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DocumentId::parse("abc").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("abc"));
        let back: DocumentId = serde_json::from_value(serde_json::json!("abc")).unwrap();
        assert_eq!(back, id);
    }
}
