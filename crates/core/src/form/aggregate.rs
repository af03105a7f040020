//! The public landing-page read: a form with everything shown under it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::children::{ContentSection, DocumentRequirement, Faq, PricingPlan};
use super::model::{Form, FormField};
use crate::collection::child::sibling_query;
use crate::collection::entity::{Entity, OrderedChild};
use crate::collection::repository::Repository;
use crate::document::{DocumentId, Record};
use crate::error::{CoreError, CoreResult};
use crate::store::{DocumentStore, Filter, StoreError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAggregate {
    #[serde(flatten)]
    pub form: Record<Form>,
    pub fields: Vec<Record<FormField>>,
    pub documents: Vec<Record<DocumentRequirement>>,
    pub faqs: Vec<Record<Faq>>,
    pub content_sections: BTreeMap<String, Vec<Record<ContentSection>>>,
    pub pricing_plans: Vec<Record<PricingPlan>>,
}

async fn children<T: OrderedChild>(
    store: &Arc<dyn DocumentStore>,
    form_id: &DocumentId,
    active_only: bool,
) -> Result<Vec<Record<T>>, StoreError> {
    Repository::<T>::new(store.clone())
        .find(&sibling_query(Some(form_id), active_only))
        .await
}

/// Group sections by `sectionKey`, keeping their order within each group.
pub fn group_sections(
    sections: Vec<Record<ContentSection>>,
) -> BTreeMap<String, Vec<Record<ContentSection>>> {
    let mut groups: BTreeMap<String, Vec<Record<ContentSection>>> = BTreeMap::new();
    for section in sections {
        groups
            .entry(section.body.section_key.clone())
            .or_default()
            .push(section);
    }
    groups
}

/// Look a form up by slug and load its five child collections concurrently.
/// All fields are returned; the other children are filtered to active ones.
/// If any read fails the whole composition fails.
pub async fn compose_by_slug(store: &Arc<dyn DocumentStore>, slug: &str) -> CoreResult<FormAggregate> {
    let form = Repository::<Form>::new(store.clone())
        .find_one(Filter::new().eq("slug", slug))
        .await?
        .ok_or_else(|| CoreError::not_found(Form::NAME))?;

    let (fields, documents, faqs, sections, pricing_plans) = tokio::try_join!(
        children::<FormField>(store, &form.id, false),
        children::<DocumentRequirement>(store, &form.id, true),
        children::<Faq>(store, &form.id, true),
        children::<ContentSection>(store, &form.id, true),
        children::<PricingPlan>(store, &form.id, true),
    )?;

    Ok(FormAggregate {
        form,
        fields,
        documents,
        faqs,
        content_sections: group_sections(sections),
        pricing_plans,
    })
}
