//! Office locations, listed by city and grouped by country for the
//! contact page.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collection::entity::{default_true, Entity};
use crate::collection::payload::{self, Payload};
use crate::collection::repository::Repository;
use crate::document::validate::require_text;
use crate::document::{DocumentId, Record, ValidationError};
use crate::error::{CoreError, CoreResult};
use crate::events::{ContentEvent, EventBus};
use crate::store::{DocumentStore, Filter, Query, Sort};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Office {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub map_url: Option<String>,
    #[serde(default)]
    pub is_headquarters: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Entity for Office {
    const COLLECTION: &'static str = "offices";
    const NAME: &'static str = "Office";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[
            ("name", &self.name),
            ("country", &self.country),
            ("city", &self.city),
            ("address", &self.address),
        ])
    }
}

pub type OfficesByCountry = BTreeMap<String, Vec<Record<Office>>>;

pub struct OfficeService {
    offices: Repository<Office>,
    events: EventBus,
}

impl OfficeService {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self {
            offices: Repository::new(store),
            events,
        }
    }

    pub async fn list(
        &self,
        country: Option<String>,
        active: Option<bool>,
    ) -> CoreResult<Vec<Record<Office>>> {
        let filter = Filter::new()
            .eq_opt("country", country)
            .eq_opt("isActive", active);
        Ok(self.offices.find(&Query::new(filter).sort(Sort::asc("city"))).await?)
    }

    /// Active offices keyed by country, each group sorted by city.
    pub async fn grouped(&self) -> CoreResult<OfficesByCountry> {
        let mut groups = OfficesByCountry::new();
        for office in self.list(None, Some(true)).await? {
            groups
                .entry(office.body.country.clone())
                .or_default()
                .push(office);
        }
        Ok(groups)
    }

    pub async fn get(&self, id: &DocumentId) -> CoreResult<Record<Office>> {
        self.offices.get_404(id).await
    }

    pub async fn create(&self, payload: Payload) -> CoreResult<Record<Office>> {
        let office: Office = payload::decode(payload)?;
        let record = self.offices.insert(&office).await?;
        self.events
            .publish(ContentEvent::created(Office::COLLECTION, &record.id));
        Ok(record)
    }

    pub async fn update(&self, id: &DocumentId, patch: Payload) -> CoreResult<Record<Office>> {
        let current = self.offices.get_404(id).await?;
        let office = payload::merge(&current.body, patch)?;
        let record = self
            .offices
            .replace(id, &office)
            .await?
            .ok_or_else(|| CoreError::not_found(Office::NAME))?;
        self.events
            .publish(ContentEvent::updated(Office::COLLECTION, &record.id));
        Ok(record)
    }

    pub async fn delete(&self, id: &DocumentId) -> CoreResult<()> {
        if !self.offices.delete(id).await? {
            return Err(CoreError::not_found(Office::NAME));
        }
        self.events
            .publish(ContentEvent::deleted(Office::COLLECTION, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_store, object};
    use serde_json::json;

    fn service() -> OfficeService {
        OfficeService::new(memory_store(), EventBus::new(16))
    }

    async fn seed(offices: &OfficeService, country: &str, city: &str, active: bool) -> Record<Office> {
        offices
            .create(object(json!({
                "name": format!("{city} office"),
                "country": country,
                "city": city,
                "address": "1 Main St",
                "isActive": active,
            })))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn grouped_has_one_key_per_country_of_active_offices() {
        let offices = service();
        seed(&offices, "Canada", "Toronto", true).await;
        seed(&offices, "Canada", "Montreal", true).await;
        seed(&offices, "UAE", "Dubai", true).await;
        seed(&offices, "India", "Delhi", false).await;

        let groups = offices.grouped().await.unwrap();
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["Canada", "UAE"]);
        let cities: Vec<&str> = groups["Canada"].iter().map(|o| o.body.city.as_str()).collect();
        assert_eq!(cities, vec!["Montreal", "Toronto"]);
    }

    #[tokio::test]
    async fn list_filters_by_country() {
        let offices = service();
        seed(&offices, "Canada", "Toronto", true).await;
        seed(&offices, "UAE", "Dubai", false).await;

        assert_eq!(offices.list(Some("UAE".into()), None).await.unwrap().len(), 1);
        assert_eq!(offices.list(None, Some(true)).await.unwrap().len(), 1);
        assert_eq!(offices.list(None, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let err = service().create(object(json!({ "name": "HQ" }))).await.unwrap_err();
        match err {
            CoreError::Validation(err) => {
                assert_eq!(err.to_string(), "country, city, address required")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_merges_and_delete_is_physical() {
        let offices = service();
        let office = seed(&offices, "Canada", "Toronto", true).await;

        let updated = offices
            .update(&office.id, object(json!({ "isHeadquarters": true, "phone": "+1 555" })))
            .await
            .unwrap();
        assert!(updated.body.is_headquarters);
        assert_eq!(updated.body.city, "Toronto");

        offices.delete(&office.id).await.unwrap();
        assert!(matches!(offices.get(&office.id).await.unwrap_err(), CoreError::NotFound(_)));
    }
}
