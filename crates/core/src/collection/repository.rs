use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::entity::Entity;
use crate::document::{DocumentId, Record, StoredDocument};
use crate::error::CoreError;
use crate::store::{DocumentStore, Filter, Query, StoreError};

/// Typed view over one collection of a [`DocumentStore`].
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

pub(crate) fn encode<B: Serialize>(body: &B) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(body)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encode(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn decode(doc: StoredDocument) -> Result<Record<T>, StoreError> {
        let id = doc.id.to_string();
        doc.decode().map_err(|source| StoreError::Decode {
            collection: T::COLLECTION.to_string(),
            id,
            source,
        })
    }

    fn decode_all(docs: Vec<StoredDocument>) -> Result<Vec<Record<T>>, StoreError> {
        docs.into_iter().map(Self::decode).collect()
    }

    pub async fn get(&self, id: &DocumentId) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Like [`get`](Self::get), but absence is a `NotFound` error.
    pub async fn get_404(&self, id: &DocumentId) -> Result<Record<T>, CoreError> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(T::NAME))
    }

    pub async fn find(&self, query: &Query) -> Result<Vec<Record<T>>, StoreError> {
        Self::decode_all(self.store.find(T::COLLECTION, query).await?)
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<Record<T>>, StoreError> {
        let query = Query::new(filter).limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    /// Whether a document other than `except` has `field` equal to `value`.
    pub async fn is_taken(
        &self,
        field: &str,
        value: &str,
        except: Option<&DocumentId>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .find_one(Filter::new().eq(field, value))
            .await?
            .is_some_and(|existing| Some(&existing.id) != except))
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }

    pub async fn insert(&self, body: &T) -> Result<Record<T>, StoreError> {
        Self::decode(self.store.insert(T::COLLECTION, encode(body)?).await?)
    }

    pub async fn insert_many(&self, bodies: &[T]) -> Result<Vec<Record<T>>, StoreError> {
        let contents = bodies.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        Self::decode_all(self.store.insert_many(T::COLLECTION, contents).await?)
    }

    pub async fn replace(&self, id: &DocumentId, body: &T) -> Result<Option<Record<T>>, StoreError> {
        self.store
            .replace(T::COLLECTION, id, encode(body)?)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<bool, StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }
}
