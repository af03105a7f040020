//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::collection::payload::Payload;
use crate::collection::repository::Repository;
use crate::document::{DocumentId, Record, StoredDocument};
use crate::form::Form;
use crate::store::{
    CascadeReport, ChildLink, DocumentStore, Filter, MemoryStore, Query, StoreError,
};

pub(crate) fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::new())
}

pub(crate) fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub(crate) async fn seed_form(store: &Arc<dyn DocumentStore>, name: &str, slug: &str) -> Record<Form> {
    let form = Form {
        name: name.to_string(),
        slug: slug.to_string(),
        description: String::new(),
        is_active: true,
    };
    Repository::<Form>::new(store.clone())
        .insert(&form)
        .await
        .unwrap()
}

/// Delegates to an inner store but fails every read of one collection and
/// every cascade delete rooted in it.
pub(crate) struct FailingStore {
    inner: Arc<dyn DocumentStore>,
    broken: &'static str,
}

impl FailingStore {
    pub(crate) fn new(inner: Arc<dyn DocumentStore>, broken: &'static str) -> Self {
        Self { inner, broken }
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        if collection == self.broken {
            return Err(StoreError::Unavailable(format!("{collection} is offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<StoredDocument, StoreError> {
        self.inner.insert(collection, content).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        contents: Vec<Map<String, Value>>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.inner.insert_many(collection, contents).await
    }

    async fn get(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, StoreError> {
        self.check(collection)?;
        self.inner.get(collection, id).await
    }

    async fn find(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.check(collection)?;
        self.inner.find(collection, query).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check(collection)?;
        self.inner.count(collection, filter).await
    }

    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        content: Map<String, Value>,
    ) -> Result<Option<StoredDocument>, StoreError> {
        self.inner.replace(collection, id, content).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn delete_cascade(
        &self,
        collection: &str,
        id: &DocumentId,
        children: &[ChildLink],
    ) -> Result<Option<CascadeReport>, StoreError> {
        self.check(collection)?;
        self.inner.delete_cascade(collection, id, children).await
    }
}
