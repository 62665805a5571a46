use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::policy::Subject;
use crate::error::{ApiError, AuthFailure};
use crate::state::AppState;
use crate::users::repo_types::User;

/// The authenticated caller, reloaded from the repository so the role is current.
///
/// Handlers that validate input before authenticating take
/// `Result<Identity, ApiError>` and apply `?` after validation.
#[derive(Debug, Clone)]
pub struct Identity(pub User);

impl Identity {
    pub fn subject(&self) -> Subject {
        Subject::from(&self.0)
    }
}

pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AuthFailure> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthFailure::MissingToken)?;

    let (scheme, token) = header.split_once(' ').ok_or(AuthFailure::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthFailure::MissingToken);
    }
    Ok(token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "rejected bearer token");
            AuthFailure::Token(e)
        })?;

        match state.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(Identity(user)),
            None => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Err(AuthFailure::UserNotFound.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/profile");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_token_case_insensitively() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))).unwrap(), "abc");
    }

    #[test]
    fn rejects_missing_or_foreign_scheme() {
        assert_eq!(
            bearer_token(&parts_with(None)).unwrap_err(),
            AuthFailure::MissingToken
        );
        assert_eq!(
            bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))).unwrap_err(),
            AuthFailure::MissingToken
        );
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer "))).unwrap_err(),
            AuthFailure::MissingToken
        );
    }
}
