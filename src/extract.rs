use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// A JSON object body. Anything else (bad syntax, arrays, missing content
/// type) becomes a `body` validation error instead of axum's plain-text rejection.
pub struct JsonObject(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(Value::Object(map))) => Ok(JsonObject(map)),
            Ok(Json(_)) => Err(ApiError::field("body", "request body must be a JSON object")),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::MissingJsonContentType(_) => {
                        "expected request with `Content-Type: application/json`".to_string()
                    }
                    JsonRejection::JsonSyntaxError(e) => e.body_text(),
                    JsonRejection::JsonDataError(e) => e.body_text(),
                    other => {
                        warn!(error = %other, "unreadable request body");
                        other.body_text()
                    }
                };
                Err(ApiError::field("body", message))
            }
        }
    }
}

/// Query string parameters. A string that does not deserialize becomes a
/// `query` validation error.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(ApiError::field("query", rejection.body_text())),
        }
    }
}

/// Path ids that are not UUIDs cannot name an existing row.
pub fn parse_id(raw: &str, resource: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(resource))
}
