use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Events emitted after successful writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    Change(ChangeEvent),
    Cascade(CascadeEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: String,
    pub document_id: String,
    pub action: ChangeAction,
    pub timestamp: DateTime<Utc>,
}

/// A parent deletion and the children removed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeEvent {
    pub collection: String,
    pub document_id: String,
    pub removed: Vec<(String, u64)>,
    pub timestamp: DateTime<Utc>,
}

impl ContentEvent {
    pub fn change(collection: &str, id: &DocumentId, action: ChangeAction) -> Self {
        ContentEvent::Change(ChangeEvent {
            collection: collection.to_string(),
            document_id: id.to_string(),
            action,
            timestamp: Utc::now(),
        })
    }

    pub fn created(collection: &str, id: &DocumentId) -> Self {
        Self::change(collection, id, ChangeAction::Created)
    }

    pub fn updated(collection: &str, id: &DocumentId) -> Self {
        Self::change(collection, id, ChangeAction::Updated)
    }

    pub fn deleted(collection: &str, id: &DocumentId) -> Self {
        Self::change(collection, id, ChangeAction::Deleted)
    }

    pub fn cascade(collection: &str, id: &DocumentId, removed: Vec<(String, u64)>) -> Self {
        ContentEvent::Cascade(CascadeEvent {
            collection: collection.to_string(),
            document_id: id.to_string(),
            removed,
            timestamp: Utc::now(),
        })
    }
}
