use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use visa_cms_core::document::ValidationError;
use visa_cms_core::store::StoreError;
use visa_cms_core::CoreError;

/// API error type rendered as a JSON envelope carrying `message`, `type`
/// and `statusCode`. Server errors also carry the underlying `error`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(err) => ApiError::BadRequest(err.to_string()),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Store(StoreError::Duplicate { collection, constraint }) => {
                ApiError::Conflict(format!("duplicate value in {collection} ({constraint})"))
            }
            CoreError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                let body = json!({
                    "type": "internalError",
                    "message": "Server error",
                    "statusCode": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "error": detail,
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = json!({
            "type": error_type,
            "message": message,
            "statusCode": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_message() {
        let err = ApiError::from(CoreError::from(ValidationError::Required(vec!["title", "content"])));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "title, content required");
        assert_eq!(body["statusCode"], 400);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn not_found_and_conflict() {
        let (status, body) = render(CoreError::not_found("Form").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Form not found");

        let duplicate = CoreError::Store(StoreError::Duplicate {
            collection: "forms".into(),
            constraint: "forms_slug_key".into(),
        });
        let (status, _) = render(duplicate.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn store_failures_are_500_with_detail() {
        let err = CoreError::Store(StoreError::Unavailable("connection reset".into()));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
        assert_eq!(body["error"], "store unavailable: connection reset");
    }
}
