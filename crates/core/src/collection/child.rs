//! Parent-scoped CRUD shared by every collection ordered under a form.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{ser::Error as _, Serialize, Serializer};
use serde_json::Value;

use super::entity::{Entity, OrderedChild, PARENT_KEY};
use super::ordering::{indexed_order, next_order};
use super::payload::{self, Payload};
use super::repository::Repository;
use crate::document::{DocumentId, Record, ValidationError};
use crate::error::{CoreError, CoreResult};
use crate::events::{ContentEvent, EventBus};
use crate::form::model::{Form, FormSummary};
use crate::store::{DocumentStore, Filter, Query, Sort};

/// A child record with its `formId` replaced by the parent projection.
/// A parent that no longer exists is rendered as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Populated<T> {
    pub record: Record<T>,
    pub form: Option<FormSummary>,
}

impl<T: Serialize> Serialize for Populated<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.record).map_err(S::Error::custom)?;
        if let Some(object) = value.as_object_mut() {
            let form = match &self.form {
                Some(summary) => serde_json::to_value(summary).map_err(S::Error::custom)?,
                None => Value::Null,
            };
            object.insert(PARENT_KEY.to_string(), form);
        }
        value.serialize(serializer)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChildFilter {
    pub form_id: Option<DocumentId>,
    pub active_only: bool,
}

/// Siblings under an optional parent, ascending by `order`.
pub fn sibling_query(form_id: Option<&DocumentId>, active_only: bool) -> Query {
    let filter = Filter::new()
        .eq_opt(PARENT_KEY, form_id.cloned())
        .eq_opt("isActive", active_only.then_some(true));
    Query::new(filter).sort(Sort::asc("order"))
}

pub struct ChildService<T> {
    children: Repository<T>,
    forms: Repository<Form>,
    events: EventBus,
}

impl<T: OrderedChild> ChildService<T> {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self {
            children: Repository::new(store.clone()),
            forms: Repository::new(store),
            events,
        }
    }

    pub async fn list(&self, filter: &ChildFilter) -> CoreResult<Vec<Populated<T>>> {
        let query = sibling_query(filter.form_id.as_ref(), filter.active_only);
        let records = self.children.find(&query).await?;
        self.populate(records).await
    }

    pub async fn get(&self, id: &DocumentId) -> CoreResult<Populated<T>> {
        let record = self.children.get_404(id).await?;
        let form = self.forms.get(&record.body.meta().form_id).await?;
        Ok(Populated {
            form: form.as_ref().map(FormSummary::from),
            record,
        })
    }

    /// Create a child under the form named by the payload's `formId`.
    /// Without an explicit `order` it is placed after its last sibling.
    pub async fn create(&self, mut payload: Payload) -> CoreResult<Populated<T>> {
        let form_id = payload::id_field(&payload, PARENT_KEY)?
            .ok_or(ValidationError::Required(vec![PARENT_KEY]))?;
        let explicit = payload::explicit_order(&payload)?;
        payload.insert("order".to_string(), Value::from(explicit.unwrap_or(0)));
        let mut body: T = payload::decode(payload)?;

        let form = self.require_form(&form_id).await?;
        body.meta_mut().order = self.next_order(&form_id, explicit).await?;

        let record = self.children.insert(&body).await?;
        self.events
            .publish(ContentEvent::created(T::COLLECTION, &record.id));
        tracing::debug!(
            collection = T::COLLECTION,
            id = %record.id,
            form_id = %form_id,
            order = record.body.meta().order,
            "child created"
        );

        Ok(Populated {
            record,
            form: Some(FormSummary::from(&form)),
        })
    }

    /// Create a batch under one form. Every item is validated before any
    /// write; an item without `order` takes its index in the batch.
    pub async fn create_many(
        &self,
        form_id: &DocumentId,
        items: Vec<Payload>,
    ) -> CoreResult<Vec<Populated<T>>> {
        let mut bodies = Vec::with_capacity(items.len());
        for (index, mut item) in items.into_iter().enumerate() {
            let order = indexed_order(index, payload::explicit_order(&item)?);
            item.insert(PARENT_KEY.to_string(), Value::from(form_id.clone()));
            item.insert("order".to_string(), Value::from(order));
            bodies.push(payload::decode::<T>(item)?);
        }

        let form = self.require_form(form_id).await?;
        let records = self.children.insert_many(&bodies).await?;
        for record in &records {
            self.events
                .publish(ContentEvent::created(T::COLLECTION, &record.id));
        }
        tracing::debug!(
            collection = T::COLLECTION,
            form_id = %form_id,
            count = records.len(),
            "children created in bulk"
        );

        let summary = FormSummary::from(&form);
        Ok(records
            .into_iter()
            .map(|record| Populated {
                record,
                form: Some(summary.clone()),
            })
            .collect())
    }

    /// Merge a partial payload over the stored child. Reassigning `formId`
    /// re-checks that the new form exists. Last writer wins.
    pub async fn update(&self, id: &DocumentId, patch: Payload) -> CoreResult<Populated<T>> {
        let current = self.children.get_404(id).await?;
        let reassigned = payload::id_field(&patch, PARENT_KEY)?;

        let body: T = payload::merge(&current.body, patch)?;
        let form = match reassigned {
            Some(form_id) => Some(self.require_form(&form_id).await?),
            None => self.forms.get(&body.meta().form_id).await?,
        };

        let record = self
            .children
            .replace(id, &body)
            .await?
            .ok_or_else(|| CoreError::not_found(T::NAME))?;
        self.events
            .publish(ContentEvent::updated(T::COLLECTION, &record.id));

        Ok(Populated {
            record,
            form: form.as_ref().map(FormSummary::from),
        })
    }

    pub async fn delete(&self, id: &DocumentId) -> CoreResult<()> {
        if !self.children.delete(id).await? {
            return Err(CoreError::not_found(T::NAME));
        }
        self.events
            .publish(ContentEvent::deleted(T::COLLECTION, id));
        Ok(())
    }

    async fn require_form(&self, form_id: &DocumentId) -> CoreResult<Record<Form>> {
        self.forms
            .get(form_id)
            .await?
            .ok_or_else(|| CoreError::not_found(Form::NAME))
    }

    async fn next_order(&self, form_id: &DocumentId, explicit: Option<i64>) -> CoreResult<i64> {
        if explicit.is_some() {
            return Ok(next_order(None, explicit));
        }
        let last = Query::new(Filter::new().eq(PARENT_KEY, form_id.clone()))
            .sort(Sort::desc("order"))
            .limit(1);
        let siblings = self.children.find(&last).await?;
        Ok(next_order(
            siblings.iter().map(|sibling| sibling.body.meta().order),
            None,
        ))
    }

    async fn populate(&self, records: Vec<Record<T>>) -> CoreResult<Vec<Populated<T>>> {
        let mut summaries: HashMap<DocumentId, Option<FormSummary>> = HashMap::new();
        let mut populated = Vec::with_capacity(records.len());
        for record in records {
            let form_id = record.body.meta().form_id.clone();
            let form = match summaries.get(&form_id) {
                Some(cached) => cached.clone(),
                None => {
                    let summary = self.forms.get(&form_id).await?.as_ref().map(FormSummary::from);
                    summaries.insert(form_id, summary.clone());
                    summary
                }
            };
            populated.push(Populated { record, form });
        }
        Ok(populated)
    }
}
