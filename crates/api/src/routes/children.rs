//! CRUD endpoints shared by every collection ordered under a form.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use visa_cms_core::collection::{ChildFilter, OrderedChild, Populated, PARENT_KEY};
use visa_cms_core::collection::payload;
use visa_cms_core::document::{DocumentId, ValidationError};
use visa_cms_core::form::{ContentSection, DocumentRequirement, Faq, FormField, PricingPlan};

use crate::error::ApiResult;
use crate::extract::{document_id, JsonObject, ValidQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(collection::<DocumentRequirement>("/api/documents"))
        .route("/api/documents/bulk", post(create_documents_bulk))
        .merge(collection::<Faq>("/api/faqs"))
        .merge(collection::<ContentSection>("/api/content-sections"))
        .merge(collection::<PricingPlan>("/api/pricing-plans"))
        .merge(collection::<FormField>("/api/form-fields"))
}

fn collection<T: OrderedChild>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list::<T>).post(create::<T>))
        .route(
            &format!("{base}/{{id}}"),
            get(get_one::<T>).put(update::<T>).delete(delete::<T>),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub form_id: Option<String>,
    pub is_active: Option<bool>,
}

impl ListParams {
    fn into_filter(self) -> ChildFilter {
        ChildFilter {
            form_id: self.form_id.as_deref().and_then(DocumentId::parse),
            active_only: self.is_active.unwrap_or(false),
        }
    }
}

async fn list<T: OrderedChild>(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> ApiResult<Json<Vec<Populated<T>>>> {
    let children = state.children::<T>().list(&params.into_filter()).await?;
    Ok(Json(children))
}

async fn get_one<T: OrderedChild>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Populated<T>>> {
    let id = document_id(&id, T::NAME)?;
    Ok(Json(state.children::<T>().get(&id).await?))
}

async fn create<T: OrderedChild>(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> ApiResult<(StatusCode, Json<Populated<T>>)> {
    let created = state.children::<T>().create(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update<T: OrderedChild>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> ApiResult<Json<Populated<T>>> {
    let id = document_id(&id, T::NAME)?;
    Ok(Json(state.children::<T>().update(&id, body).await?))
}

async fn delete<T: OrderedChild>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = document_id(&id, T::NAME)?;
    state.children::<T>().delete(&id).await?;
    Ok(Json(json!({ "message": format!("{} deleted successfully", T::NAME) })))
}

/// `POST /api/documents/bulk` with `{formId, documents: [...]}`.
async fn create_documents_bulk(
    State(state): State<AppState>,
    JsonObject(mut body): JsonObject,
) -> ApiResult<(StatusCode, Json<Vec<Populated<DocumentRequirement>>>)> {
    let form_id = payload::id_field(&body, PARENT_KEY)?
        .ok_or(ValidationError::Required(vec![PARENT_KEY]))?;
    let documents = payload::take_objects(&mut body, "documents")?
        .ok_or(ValidationError::Required(vec!["documents"]))?;

    let created = state
        .children::<DocumentRequirement>()
        .create_many(&form_id, documents)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
