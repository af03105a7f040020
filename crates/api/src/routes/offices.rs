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
use visa_cms_core::office::{Office, OfficesByCountry};

use crate::error::ApiResult;
use crate::extract::{document_id, JsonObject, ValidQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/offices", get(list).post(create))
        .route("/api/offices/grouped", get(grouped))
        .route("/api/offices/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub country: Option<String>,
    pub is_active: Option<bool>,
}

async fn list(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> ApiResult<Json<Vec<Record<Office>>>> {
    let country = params.country.filter(|c| !c.is_empty());
    Ok(Json(state.offices().list(country, params.is_active).await?))
}

async fn grouped(State(state): State<AppState>) -> ApiResult<Json<OfficesByCountry>> {
    Ok(Json(state.offices().grouped().await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<Office>>> {
    let id = document_id(&id, Office::NAME)?;
    Ok(Json(state.offices().get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> ApiResult<(StatusCode, Json<Record<Office>>)> {
    let created = state.offices().create(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> ApiResult<Json<Record<Office>>> {
    let id = document_id(&id, Office::NAME)?;
    Ok(Json(state.offices().update(&id, body).await?))
}

async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = document_id(&id, Office::NAME)?;
    state.offices().delete(&id).await?;
    Ok(Json(json!({ "message": "Office deleted successfully" })))
}
