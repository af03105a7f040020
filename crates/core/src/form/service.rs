use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::aggregate::{compose_by_slug, FormAggregate};
use super::model::{Form, FormField};
use crate::collection::cascade::{CascadeCoordinator, CascadeScope};
use crate::collection::child::sibling_query;
use crate::collection::entity::{Entity, PARENT_KEY};
use crate::collection::ordering::indexed_order;
use crate::collection::payload::{self, Payload};
use crate::collection::repository::Repository;
use crate::document::{DocumentId, Record, ValidationError};
use crate::error::{CoreError, CoreResult};
use crate::events::{ContentEvent, EventBus};
use crate::store::{CascadeReport, DocumentStore, Filter, Query, Sort};

/// A form with its fields, ascending by `order`.
#[derive(Debug, Clone, Serialize)]
pub struct FormWithFields {
    #[serde(flatten)]
    pub form: Record<Form>,
    pub fields: Vec<Record<FormField>>,
}

/// One write produced by syncing a form's field list.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Update(DocumentId, FormField),
    Insert(FormField),
}

/// Plan the writes that make a form's fields match `entries`.
///
/// An entry whose `_id` names an existing field is merged over it; any
/// other entry becomes a new field. Each entry's `order` is its explicit
/// value or its position in the list. Existing fields not named by any
/// entry are left out of the plan and get deleted by the caller.
pub fn plan_field_sync(
    form_id: &DocumentId,
    existing: &[Record<FormField>],
    entries: Vec<Payload>,
) -> Result<Vec<FieldWrite>, ValidationError> {
    let mut writes = Vec::with_capacity(entries.len());
    for (index, mut entry) in entries.into_iter().enumerate() {
        let order = indexed_order(index, payload::explicit_order(&entry)?);
        let current = payload::id_field(&entry, "_id")?
            .and_then(|id| existing.iter().find(|field| field.id == id));
        entry.insert(PARENT_KEY.to_string(), Value::from(form_id.clone()));
        entry.insert("order".to_string(), Value::from(order));

        writes.push(match current {
            Some(field) => FieldWrite::Update(field.id.clone(), payload::merge(&field.body, entry)?),
            None => FieldWrite::Insert(payload::decode(entry)?),
        });
    }
    Ok(writes)
}

pub struct FormService {
    forms: Repository<Form>,
    fields: Repository<FormField>,
    cascade: CascadeCoordinator,
    events: EventBus,
}

impl FormService {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus, scope: CascadeScope) -> Self {
        Self {
            forms: Repository::new(store.clone()),
            fields: Repository::new(store.clone()),
            cascade: CascadeCoordinator::new(store, scope, events.clone()),
            events,
        }
    }

    /// Forms, newest first.
    pub async fn list(&self, active: Option<bool>) -> CoreResult<Vec<Record<Form>>> {
        let query = Query::new(Filter::new().eq_opt("isActive", active)).sort(Sort::newest_first());
        Ok(self.forms.find(&query).await?)
    }

    pub async fn get(&self, id: &DocumentId) -> CoreResult<FormWithFields> {
        let form = self.forms.get_404(id).await?;
        let fields = self.fields_of(&form.id).await?;
        Ok(FormWithFields { form, fields })
    }

    pub async fn by_slug(&self, slug: &str) -> CoreResult<FormAggregate> {
        compose_by_slug(self.forms.store(), slug).await
    }

    /// Create a form, optionally with an initial `fields` list.
    pub async fn create(&self, mut payload: Payload) -> CoreResult<FormWithFields> {
        let entries = payload::take_objects(&mut payload, "fields")?.unwrap_or_default();
        payload::normalise_slug(&mut payload, "name", None);
        let form: Form = payload::decode(payload)?;

        // The real id is only known after insert; validate against a placeholder.
        let placeholder = DocumentId::generate();
        let plan = plan_field_sync(&placeholder, &[], entries)?;

        self.ensure_slug_free(&form.slug, None).await?;
        let record = self.forms.insert(&form).await?;
        self.events
            .publish(ContentEvent::created(Form::COLLECTION, &record.id));

        let bodies: Vec<FormField> = plan
            .into_iter()
            .map(|write| match write {
                FieldWrite::Insert(mut field) | FieldWrite::Update(_, mut field) => {
                    field.meta.form_id = record.id.clone();
                    field
                }
            })
            .collect();
        let fields = self.fields.insert_many(&bodies).await?;
        for field in &fields {
            self.events
                .publish(ContentEvent::created(FormField::COLLECTION, &field.id));
        }

        tracing::info!(form_id = %record.id, slug = %record.body.slug, fields = fields.len(), "form created");
        Ok(FormWithFields {
            form: record,
            fields,
        })
    }

    /// Merge a partial update. A `fields` list, when present, replaces the
    /// form's field set and re-orders it by list position.
    pub async fn update(&self, id: &DocumentId, mut patch: Payload) -> CoreResult<FormWithFields> {
        let current = self.forms.get_404(id).await?;
        let entries = payload::take_objects(&mut patch, "fields")?;
        payload::normalise_slug(&mut patch, "name", Some(current.body.name.as_str()));
        let form = payload::merge(&current.body, patch)?;

        // Field entries are validated before any write.
        let field_sync = match entries {
            Some(entries) => {
                let existing = self.fields_of(id).await?;
                let plan = plan_field_sync(id, &existing, entries)?;
                Some((existing, plan))
            }
            None => None,
        };

        if form.slug != current.body.slug {
            self.ensure_slug_free(&form.slug, Some(id)).await?;
        }
        let record = self
            .forms
            .replace(id, &form)
            .await?
            .ok_or_else(|| CoreError::not_found(Form::NAME))?;
        self.events
            .publish(ContentEvent::updated(Form::COLLECTION, &record.id));

        let fields = match field_sync {
            Some((existing, plan)) => self.apply_field_sync(&record.id, &existing, plan).await?,
            None => self.fields_of(&record.id).await?,
        };
        Ok(FormWithFields {
            form: record,
            fields,
        })
    }

    pub async fn delete(&self, id: &DocumentId) -> CoreResult<CascadeReport> {
        self.cascade.delete_form(id).await
    }

    async fn fields_of(&self, form_id: &DocumentId) -> CoreResult<Vec<Record<FormField>>> {
        Ok(self.fields.find(&sibling_query(Some(form_id), false)).await?)
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<&DocumentId>) -> CoreResult<()> {
        if self.forms.is_taken("slug", slug, except).await? {
            return Err(CoreError::Conflict(format!("A form with slug `{slug}` already exists")));
        }
        Ok(())
    }

    async fn apply_field_sync(
        &self,
        form_id: &DocumentId,
        existing: &[Record<FormField>],
        plan: Vec<FieldWrite>,
    ) -> CoreResult<Vec<Record<FormField>>> {
        let mut kept = HashSet::new();
        for write in plan {
            match write {
                FieldWrite::Update(id, field) => {
                    if self.fields.replace(&id, &field).await?.is_some() {
                        self.events
                            .publish(ContentEvent::updated(FormField::COLLECTION, &id));
                    }
                    kept.insert(id);
                }
                FieldWrite::Insert(field) => {
                    let record = self.fields.insert(&field).await?;
                    self.events
                        .publish(ContentEvent::created(FormField::COLLECTION, &record.id));
                    kept.insert(record.id);
                }
            }
        }

        for stale in existing.iter().filter(|field| !kept.contains(&field.id)) {
            if self.fields.delete(&stale.id).await? {
                self.events
                    .publish(ContentEvent::deleted(FormField::COLLECTION, &stale.id));
            }
        }

        tracing::debug!(form_id = %form_id, kept = kept.len(), "form fields synced");
        self.fields_of(form_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::child::{ChildFilter, ChildService};
    use crate::form::children::Faq;
    use crate::testing::{memory_store, object};
    use serde_json::json;

    fn service(store: &Arc<dyn DocumentStore>) -> FormService {
        FormService::new(store.clone(), EventBus::new(32), CascadeScope::Fields)
    }

    fn names(fields: &[Record<FormField>]) -> Vec<&str> {
        fields.iter().map(|f| f.body.name.as_str()).collect()
    }

    #[tokio::test]
    async fn create_derives_slug_and_orders_fields_by_position() {
        let store = memory_store();
        let created = service(&store)
            .create(object(json!({
                "name": "Student Visa (Canada)",
                "fields": [
                    { "label": "Full name", "name": "full_name" },
                    { "label": "Email", "name": "email", "type": "email" },
                ]
            })))
            .await
            .unwrap();

        assert_eq!(created.form.body.slug, "student-visa-canada");
        assert_eq!(names(&created.fields), vec!["full_name", "email"]);
        assert_eq!(created.fields[1].body.meta.order, 1);
        assert!(created.fields.iter().all(|f| f.body.meta.form_id == created.form.id));
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields_without_writing() {
        let store = memory_store();
        let forms = service(&store);
        let err = forms
            .create(object(json!({ "name": "Broken", "fields": [{ "label": "No name" }] })))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(forms.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let store = memory_store();
        let forms = service(&store);
        forms.create(object(json!({ "name": "Work Visa" }))).await.unwrap();

        let err = forms
            .create(object(json!({ "name": "Another", "slug": "work-visa" })))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_resyncs_and_reorders_fields() {
        let store = memory_store();
        let forms = service(&store);
        let created = forms
            .create(object(json!({
                "name": "Visit Visa",
                "fields": [
                    { "label": "A", "name": "a" },
                    { "label": "B", "name": "b" },
                    { "label": "C", "name": "c" },
                ]
            })))
            .await
            .unwrap();
        let ids: Vec<DocumentId> = created.fields.iter().map(|f| f.id.clone()).collect();

        let updated = forms
            .update(
                &created.form.id,
                object(json!({
                    "description": "Short stay",
                    "fields": [
                        { "_id": ids[2], "label": "C renamed" },
                        { "label": "D", "name": "d" },
                        { "_id": ids[0] },
                    ]
                })),
            )
            .await
            .unwrap();

        assert_eq!(updated.form.body.description, "Short stay");
        assert_eq!(updated.form.body.slug, "visit-visa");
        assert_eq!(names(&updated.fields), vec!["c", "d", "a"]);
        assert_eq!(updated.fields[0].id, ids[2]);
        assert_eq!(updated.fields[0].body.label, "C renamed");
        assert_eq!(updated.fields[2].id, ids[0]);
        assert!(updated.fields.iter().all(|f| f.id != ids[1]));
    }

    #[tokio::test]
    async fn rejected_field_entry_leaves_form_and_fields_unchanged() {
        let store = memory_store();
        let forms = service(&store);
        let created = forms
            .create(object(json!({ "name": "Visa", "fields": [{ "label": "A", "name": "a" }] })))
            .await
            .unwrap();

        let err = forms
            .update(
                &created.form.id,
                object(json!({
                    "description": "changed",
                    "slug": "renamed",
                    "fields": [{ "label": "no name" }]
                })),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let after = forms.get(&created.form.id).await.unwrap();
        assert_eq!(after.form.body.slug, "visa");
        assert_eq!(after.form.body.description, "");
        assert_eq!(names(&after.fields), vec!["a"]);
        assert_eq!(after.fields[0].id, created.fields[0].id);
    }

    #[tokio::test]
    async fn update_without_fields_leaves_them_alone() {
        let store = memory_store();
        let forms = service(&store);
        let created = forms
            .create(object(json!({ "name": "Visa", "fields": [{ "label": "A", "name": "a" }] })))
            .await
            .unwrap();

        let updated = forms
            .update(&created.form.id, object(json!({ "isActive": false })))
            .await
            .unwrap();
        assert!(!updated.form.body.is_active);
        assert_eq!(updated.fields.len(), 1);
        assert_eq!(forms.list(Some(true)).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn update_slug_conflicts_with_other_forms_only() {
        let store = memory_store();
        let forms = service(&store);
        let a = forms.create(object(json!({ "name": "A" }))).await.unwrap();
        forms.create(object(json!({ "name": "B" }))).await.unwrap();

        let same = forms
            .update(&a.form.id, object(json!({ "slug": "a", "name": "A2" })))
            .await
            .unwrap();
        assert_eq!(same.form.body.slug, "a");

        let err = forms
            .update(&a.form.id, object(json!({ "slug": "b" })))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_fields_only_by_default() {
        let store = memory_store();
        let forms = service(&store);
        let created = forms
            .create(object(json!({
                "name": "Visa",
                "fields": [{ "label": "A", "name": "a" }, { "label": "B", "name": "b" }]
            })))
            .await
            .unwrap();
        let faqs: ChildService<Faq> = ChildService::new(store.clone(), EventBus::new(4));
        faqs.create(object(json!({ "formId": created.form.id, "question": "Q", "answer": "A" })))
            .await
            .unwrap();

        let report = forms.delete(&created.form.id).await.unwrap();
        assert_eq!(report.removed_from(FormField::COLLECTION), 2);
        assert!(matches!(forms.get(&created.form.id).await.unwrap_err(), CoreError::NotFound(_)));

        let orphans = faqs.list(&ChildFilter::default()).await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].form.is_none());
    }

    #[test]
    fn plan_marks_unknown_ids_as_inserts() {
        let form_id = DocumentId::generate();
        let plan = plan_field_sync(
            &form_id,
            &[],
            vec![object(json!({ "_id": "stale", "label": "A", "name": "a", "order": 5 }))],
        )
        .unwrap();
        match &plan[..] {
            [FieldWrite::Insert(field)] => {
                assert_eq!(field.meta.order, 5);
                assert_eq!(field.meta.form_id, form_id);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }
}
