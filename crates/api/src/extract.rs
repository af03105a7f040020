//! Request extractors shared by the route modules.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use visa_cms_core::collection::Payload;
use visa_cms_core::document::DocumentId;
use visa_cms_core::CoreError;

use crate::error::ApiError;

/// A JSON object request body. Malformed JSON and non-object bodies are
/// rejected as bad requests with the usual error envelope.
#[derive(Debug)]
pub struct JsonObject(pub Payload);

impl<S: Send + Sync> FromRequest<S> for JsonObject {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        match value {
            Value::Object(map) => Ok(JsonObject(map)),
            _ => Err(ApiError::BadRequest("request body must be a JSON object".to_string())),
        }
    }
}

/// Query string parameters. A query string that does not deserialize is a
/// bad request with the usual error envelope.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ValidQuery(params))
    }
}

/// Resolve a path identifier. An identifier that cannot name any document
/// is reported the same way as one that names a missing document.
pub fn document_id(raw: &str, entity: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).ok_or_else(|| CoreError::not_found(entity).into())
}
