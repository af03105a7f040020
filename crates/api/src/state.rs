use std::sync::Arc;

use visa_cms_core::blog::BlogService;
use visa_cms_core::collection::{ChildService, OrderedChild};
use visa_cms_core::events::EventBus;
use visa_cms_core::form::FormService;
use visa_cms_core::office::OfficeService;
use visa_cms_core::store::DocumentStore;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Arc<dyn DocumentStore>,
    config: AppConfig,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig, event_bus: EventBus) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                config,
                event_bus,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn forms(&self) -> FormService {
        FormService::new(
            self.store().clone(),
            self.event_bus().clone(),
            self.config().cascade_scope,
        )
    }

    pub fn children<T: OrderedChild>(&self) -> ChildService<T> {
        ChildService::new(self.store().clone(), self.event_bus().clone())
    }

    pub fn blogs(&self) -> BlogService {
        BlogService::new(self.store().clone(), self.event_bus().clone())
    }

    pub fn offices(&self) -> OfficeService {
        OfficeService::new(self.store().clone(), self.event_bus().clone())
    }
}
