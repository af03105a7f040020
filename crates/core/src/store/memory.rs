use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::query::{compare_field, ChildLink, Filter, Query, SortKey};
use super::{CascadeReport, DocumentStore, StoreError};
use crate::document::{DocumentId, StoredDocument};

/// In-process store. Each collection is a vector in insertion order, so
/// sorting is stable with respect to insertion. One lock guards all
/// collections, which makes every operation, cascades included, atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp(collection: &str, content: Map<String, Value>) -> StoredDocument {
        let now = Utc::now();
        StoredDocument {
            id: DocumentId::generate(),
            collection: collection.to_string(),
            created_at: now,
            updated_at: now,
            content,
        }
    }
}

fn references(doc: &StoredDocument, link: &ChildLink, parent: &DocumentId) -> bool {
    doc.content
        .get(link.foreign_key)
        .and_then(Value::as_str)
        .is_some_and(|fk| fk == parent.as_str())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<StoredDocument, StoreError> {
        let doc = Self::stamp(collection, content);
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn insert_many(
        &self,
        collection: &str,
        contents: Vec<Map<String, Value>>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let docs: Vec<StoredDocument> = contents
            .into_iter()
            .map(|content| Self::stamp(collection, content))
            .collect();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs.iter().cloned());
        Ok(docs)
    }

    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| &doc.id == id))
            .cloned())
    }

    async fn find(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut docs: Vec<StoredDocument> = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|doc| query.filter.matches(&doc.content))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(sort) = &query.sort {
            docs.sort_by(|a, b| {
                let ordering = match &sort.key {
                    SortKey::Field(field) => compare_field(a.content.get(field), b.content.get(field)),
                    SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                };
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let skip = usize::try_from(query.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(&doc.content)).count())
            .unwrap_or(0) as u64)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        content: Map<String, Value>,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| &doc.id == id))
        else {
            return Ok(None);
        };
        doc.content = content;
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| &doc.id != id);
        Ok(docs.len() < before)
    }

    async fn delete_cascade(
        &self,
        collection: &str,
        id: &DocumentId,
        children: &[ChildLink],
    ) -> Result<Option<CascadeReport>, StoreError> {
        let mut collections = self.collections.write().await;

        let Some(parents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let before = parents.len();
        parents.retain(|doc| &doc.id != id);
        if parents.len() == before {
            return Ok(None);
        }

        let mut report = CascadeReport::default();
        for link in children {
            let removed = match collections.get_mut(link.collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|doc| !references(doc, link, id));
                    (before - docs.len()) as u64
                }
                None => 0,
            };
            report.removed.push((link.collection.to_string(), removed));
        }

        Ok(Some(report))
    }
}
