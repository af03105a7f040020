//! Persistence layer.
//!
//! A [`DocumentStore`] holds independent named collections of schemaless
//! JSON documents. Relationships between collections are plain foreign-key
//! fields inside the content; the store does not enforce them. The only
//! multi-document operation is [`DocumentStore::delete_cascade`], which each
//! backend executes atomically with its own primitive.

pub mod memory;
pub mod postgres;
pub mod query;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::{DocumentId, StoredDocument};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use query::{ChildLink, Condition, Filter, Match, Query, Sort, SortKey};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate key in {collection} violates {constraint}")]
    Duplicate {
        collection: String,
        constraint: String,
    },

    #[error("document {id} in {collection} could not be decoded: {source}")]
    Decode {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-collection counts of documents removed by a cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CascadeReport {
    pub removed: Vec<(String, u64)>,
}

impl CascadeReport {
    pub fn removed_from(&self, collection: &str) -> u64 {
        self.removed
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.removed.iter().map(|(_, count)| count).sum()
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name, reported by the health check.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a document, assigning its identifier and timestamps.
    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<StoredDocument, StoreError>;

    /// Insert several documents in one store operation, preserving order.
    async fn insert_many(
        &self,
        collection: &str,
        contents: Vec<Map<String, Value>>,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, StoreError>;

    /// Documents matching the query. Ties under the sort key keep
    /// insertion order.
    async fn find(&self, collection: &str, query: &Query)
        -> Result<Vec<StoredDocument>, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Replace the content of a document. Returns `None` if it does not exist.
    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        content: Map<String, Value>,
    ) -> Result<Option<StoredDocument>, StoreError>;

    /// Physically delete a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError>;

    /// Delete a parent document and every child referencing it through the
    /// given links, all or nothing. Returns `None` if the parent does not exist.
    async fn delete_cascade(
        &self,
        collection: &str,
        id: &DocumentId,
        children: &[ChildLink],
    ) -> Result<Option<CascadeReport>, StoreError>;
}
