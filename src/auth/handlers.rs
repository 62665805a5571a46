use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginResponse, RegisterResponse},
        jwt::JwtKeys,
        password::{into_stored_credential, verify_password},
    },
    error::{ApiError, AuthFailure},
    extract::JsonObject,
    state::AppState,
    users::{
        dto::PublicUser,
        repo::EMAIL_TAKEN,
        repo_types::{NewUser, Role},
        validators::{validate_login, validate_registration},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let registration = validate_registration(&body).map_err(|errors| {
        warn!(%errors, "registration rejected");
        ApiError::Validation(errors)
    })?;

    if state.users.find_by_email(&registration.email).await?.is_some() {
        warn!(email = %registration.email, "email already registered");
        return Err(ApiError::field("email", EMAIL_TAKEN));
    }

    let password_hash = into_stored_credential(&registration.password)?;
    let user = state
        .users
        .create(NewUser {
            email: registration.email,
            password_hash: Some(password_hash),
            name: registration.name,
            role: Role::User,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = validate_login(&body)?;

    // Unknown email and wrong password are indistinguishable to the client.
    let Some(user) = state.users.find_by_email(&credentials.email).await? else {
        warn!(email = %credentials.email, "login unknown email");
        return Err(AuthFailure::InvalidCredentials.into());
    };

    if !verify_password(&credentials.password, user.password_hash.as_deref()) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: PublicUser::from(user),
    }))
}
