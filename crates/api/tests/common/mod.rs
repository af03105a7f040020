#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use visa_cms_api::config::AppConfig;
use visa_cms_api::state::AppState;
use visa_cms_core::events::EventBus;
use visa_cms_core::store::{DocumentStore, MemoryStore};

/// An API server on an ephemeral port backed by a fresh in-memory store.
pub struct TestServer {
    pub base_url: String,
    pub events: EventBus,
    client: reqwest::Client,
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(AppConfig::default()).await
}

pub async fn spawn_with(config: AppConfig) -> Result<TestServer> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let events = EventBus::new(64);
    let app = visa_cms_api::build_app(AppState::new(store, config, events.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(TestServer {
        base_url: format!("http://{addr}"),
        events,
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
        let status = res.status();
        let body = res.json::<Value>().await.context("response was not JSON")?;
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        Self::read(self.client.get(self.url(path)).send().await?).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        Self::read(self.client.post(self.url(path)).json(body).send().await?).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        Self::read(self.client.put(self.url(path)).json(body).send().await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        Self::read(self.client.delete(self.url(path)).send().await?).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;
        Self::read(res).await
    }

    /// Create a form and return its id.
    pub async fn create_form(&self, name: &str, slug: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/forms", &serde_json::json!({ "name": name, "slug": slug }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "form create failed: {body}");
        body["_id"]
            .as_str()
            .map(String::from)
            .context("created form has no _id")
    }
}
