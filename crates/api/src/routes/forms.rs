use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use visa_cms_core::collection::Entity;
use visa_cms_core::document::Record;
use visa_cms_core::form::{Form, FormAggregate, FormWithFields};

use crate::error::ApiResult;
use crate::extract::{document_id, JsonObject, ValidQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/forms", get(list).post(create))
        .route("/api/forms/slug/{slug}", get(by_slug))
        .route("/api/forms/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub is_active: Option<bool>,
}

async fn list(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> ApiResult<Json<Vec<Record<Form>>>> {
    Ok(Json(state.forms().list(params.is_active).await?))
}

/// The landing-page aggregate: the form with all of its active children.
async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<FormAggregate>> {
    Ok(Json(state.forms().by_slug(&slug).await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FormWithFields>> {
    let id = document_id(&id, Form::NAME)?;
    Ok(Json(state.forms().get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> ApiResult<(StatusCode, Json<FormWithFields>)> {
    let created = state.forms().create(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> ApiResult<Json<FormWithFields>> {
    let id = document_id(&id, Form::NAME)?;
    Ok(Json(state.forms().update(&id, body).await?))
}

async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = document_id(&id, Form::NAME)?;
    let report = state.forms().delete(&id).await?;
    let removed: serde_json::Map<String, Value> = report
        .removed
        .into_iter()
        .map(|(collection, count)| (collection, Value::from(count)))
        .collect();
    Ok(Json(json!({
        "message": "Form deleted successfully",
        "removed": removed,
    })))
}
