use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::jwt::TokenError;
use crate::validation::FieldErrors;

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    Token(TokenError),
    InvalidCredentials,
    UserNotFound,
}

impl AuthFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Token(TokenError::Malformed) => "malformed_token",
            Self::Token(TokenError::Expired) => "token_expired",
            Self::Token(TokenError::BadSignature) => "bad_signature",
            Self::InvalidCredentials => "invalid_credentials",
            Self::UserNotFound => "user_not_found",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "authentication required",
            Self::Token(TokenError::Malformed) => "malformed token",
            Self::Token(TokenError::Expired) => "token expired",
            Self::Token(TokenError::BadSignature) => "invalid token signature",
            Self::InvalidCredentials => "invalid email or password",
            Self::UserNotFound => "user no longer exists",
        }
    }
}

impl From<TokenError> for AuthFailure {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

/// Every failure a handler can surface to a client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("{}", .0.message())]
    Unauthorized(AuthFailure),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{1}")]
    Status(StatusCode, String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Status(..) => "API_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Status(status, _) => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        Self::Unauthorized(failure)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer already records 4xx; only 500s carry detail worth logging here.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = match &self {
            Self::Validation(errors) => serde_json::json!({
                "kind": self.kind(),
                "message": "validation failed",
                "errors": errors,
            }),
            Self::Unauthorized(failure) => serde_json::json!({
                "kind": self.kind(),
                "reason": failure.reason(),
                "message": failure.message(),
            }),
            _ => serde_json::json!({
                "kind": self.kind(),
                "message": self.to_string(),
            }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = error.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_carries_field_map() {
        let mut errors = FieldErrors::new();
        errors.add("title", "title is required");
        errors.add("date", "date must be in the future");
        let (status, json) = body_of(ApiError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "VALIDATION_ERROR");
        assert_eq!(json["errors"]["title"], "title is required");
        assert_eq!(json["errors"]["date"], "date must be in the future");
    }

    #[tokio::test]
    async fn token_failures_share_status_but_not_reason() {
        let (s1, expired) = body_of(AuthFailure::Token(TokenError::Expired).into()).await;
        let (s2, bad_sig) = body_of(AuthFailure::Token(TokenError::BadSignature).into()).await;
        let (s3, malformed) = body_of(AuthFailure::Token(TokenError::Malformed).into()).await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(s3, StatusCode::UNAUTHORIZED);
        assert_eq!(expired["reason"], "token_expired");
        assert_eq!(bad_sig["reason"], "bad_signature");
        assert_eq!(malformed["reason"], "malformed_token");
    }

    #[tokio::test]
    async fn forbidden_and_not_found() {
        let (status, json) = body_of(ApiError::Forbidden("not the event owner".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "not the event owner");

        let (status, json) = body_of(ApiError::NotFound("event")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "event not found");
    }

    #[tokio::test]
    async fn explicit_status_passes_through() {
        let (status, json) =
            body_of(ApiError::Status(StatusCode::CONFLICT, "already admin".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["kind"], "API_ERROR");
        assert_eq!(json["message"], "already admin");
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let (status, json) =
            body_of(ApiError::Internal(anyhow::anyhow!("relation \"events\" does not exist"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "INTERNAL");
        assert_eq!(json["message"], "internal server error");
    }
}
