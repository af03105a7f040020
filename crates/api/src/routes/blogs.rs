use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use visa_cms_core::blog::{Blog, BlogPage, BlogQuery};
use visa_cms_core::collection::{Entity, PageRequest};
use visa_cms_core::document::Record;

use crate::error::ApiResult;
use crate::extract::{document_id, JsonObject, ValidQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/blogs", get(list).post(create))
        .route("/api/blogs/slug/{slug}", get(by_slug))
        .route("/api/blogs/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub published: Option<bool>,
}

impl From<ListParams> for BlogQuery {
    fn from(params: ListParams) -> Self {
        BlogQuery {
            page: PageRequest::new(params.page, params.limit),
            category: params.category.filter(|c| !c.is_empty()),
            tag: params.tag.filter(|t| !t.is_empty()),
            published: params.published,
        }
    }
}

async fn list(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> ApiResult<Json<BlogPage>> {
    Ok(Json(state.blogs().list(&params.into()).await?))
}

async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Record<Blog>>> {
    Ok(Json(state.blogs().by_slug(&slug).await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<Blog>>> {
    let id = document_id(&id, Blog::NAME)?;
    Ok(Json(state.blogs().get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> ApiResult<(StatusCode, Json<Record<Blog>>)> {
    let created = state.blogs().create(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> ApiResult<Json<Record<Blog>>> {
    let id = document_id(&id, Blog::NAME)?;
    Ok(Json(state.blogs().update(&id, body).await?))
}

async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = document_id(&id, Blog::NAME)?;
    state.blogs().delete(&id).await?;
    Ok(Json(json!({ "message": "Blog deleted successfully" })))
}
