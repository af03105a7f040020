//! Deleting a form together with the children that reference it.

use std::str::FromStr;
use std::sync::Arc;

use super::entity::{Entity, PARENT_KEY};
use crate::document::DocumentId;
use crate::error::{CoreError, CoreResult};
use crate::events::{ContentEvent, EventBus};
use crate::form::children::{ContentSection, DocumentRequirement, Faq, PricingPlan};
use crate::form::model::{Form, FormField};
use crate::store::{CascadeReport, ChildLink, DocumentStore};

/// Which child collections are removed along with a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CascadeScope {
    /// Form fields only. Other children keep their `formId` and become orphans.
    #[default]
    Fields,
    /// Every collection ordered under a form.
    AllChildren,
}

impl CascadeScope {
    pub fn links(self) -> Vec<ChildLink> {
        let fields = ChildLink::new(FormField::COLLECTION, PARENT_KEY);
        match self {
            CascadeScope::Fields => vec![fields],
            CascadeScope::AllChildren => vec![
                fields,
                ChildLink::new(DocumentRequirement::COLLECTION, PARENT_KEY),
                ChildLink::new(Faq::COLLECTION, PARENT_KEY),
                ChildLink::new(ContentSection::COLLECTION, PARENT_KEY),
                ChildLink::new(PricingPlan::COLLECTION, PARENT_KEY),
            ],
        }
    }
}

impl FromStr for CascadeScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fields" => Ok(CascadeScope::Fields),
            "all" => Ok(CascadeScope::AllChildren),
            other => Err(format!("unknown cascade scope `{other}` (expected `fields` or `all`)")),
        }
    }
}

#[derive(Clone)]
pub struct CascadeCoordinator {
    store: Arc<dyn DocumentStore>,
    scope: CascadeScope,
    events: EventBus,
}

impl CascadeCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>, scope: CascadeScope, events: EventBus) -> Self {
        Self {
            store,
            scope,
            events,
        }
    }

    /// Delete the form and its children in one store operation: either
    /// everything in scope is removed or nothing is.
    pub async fn delete_form(&self, form_id: &DocumentId) -> CoreResult<CascadeReport> {
        let links = self.scope.links();
        let report = self
            .store
            .delete_cascade(Form::COLLECTION, form_id, &links)
            .await?
            .ok_or_else(|| CoreError::not_found(Form::NAME))?;

        tracing::info!(
            form_id = %form_id,
            scope = ?self.scope,
            removed = report.total(),
            "form deleted with children"
        );
        self.events.publish(ContentEvent::cascade(
            Form::COLLECTION,
            form_id,
            report.removed.clone(),
        ));
        Ok(report)
    }
}
