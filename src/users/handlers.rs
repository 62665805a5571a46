use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::Identity,
        policy::{authorize, Action, Resource},
    },
    dto::{Data, List},
    error::ApiError,
    events::repo_types::Event,
    extract::{parse_id, JsonObject},
    state::AppState,
    users::{
        dto::{PublicUser, RoleChangedResponse},
        validators::{validate_profile_changes, validate_role_change},
    },
    validation::Choice,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/events", get(my_events))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/role", put(change_role))
}

#[instrument(skip(identity))]
pub async fn get_profile(identity: Identity) -> Json<Data<PublicUser>> {
    Json(Data {
        data: PublicUser::from(identity.0),
    })
}

#[instrument(skip(state, identity, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Result<Identity, ApiError>,
    JsonObject(body): JsonObject,
) -> Result<Json<Data<PublicUser>>, ApiError> {
    let changes = validate_profile_changes(&body, OffsetDateTime::now_utc().date())?;
    let Identity(user) = identity?;

    let updated = state
        .users
        .update_profile(user.id, &changes)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(Data {
        data: PublicUser::from(updated),
    }))
}

#[instrument(skip(state, identity))]
pub async fn my_events(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<List<Event>>, ApiError> {
    let events = state.events.list(None, Some(identity.0.id)).await?;
    Ok(Json(List::from(events)))
}

#[instrument(skip(state, identity))]
pub async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<List<PublicUser>>, ApiError> {
    authorize(&identity.subject(), Action::ReadUsers, Resource::None).into_result()?;
    let users = state.users.list().await?;
    Ok(Json(List::from(
        users.into_iter().map(PublicUser::from).collect::<Vec<_>>(),
    )))
}

#[instrument(skip(state, identity))]
pub async fn get_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Data<PublicUser>>, ApiError> {
    authorize(&identity.subject(), Action::ReadUsers, Resource::None).into_result()?;
    let id = parse_id(&id, "user")?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(Data {
        data: PublicUser::from(user),
    }))
}

#[instrument(skip(state, identity, body))]
pub async fn change_role(
    State(state): State<AppState>,
    identity: Result<Identity, ApiError>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<RoleChangedResponse>, ApiError> {
    let role = validate_role_change(&body)?;
    let identity = identity?;
    let subject = identity.subject();

    // Non-admins learn nothing about which user ids exist.
    authorize(&subject, Action::ReadUsers, Resource::None).into_result()?;

    let id = parse_id(&id, "user")?;
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if let Err(e) =
        authorize(&subject, Action::ChangeRole, Resource::User { id: target.id }).into_result()
    {
        warn!(target_id = %target.id, user_id = %subject.id, "role change denied");
        return Err(e);
    }

    if target.role == role {
        return Err(ApiError::Status(
            StatusCode::CONFLICT,
            format!("user already has role {}", role.as_str()),
        ));
    }

    let updated = state
        .users
        .set_role(target.id, role)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    info!(target_id = %updated.id, role = role.as_str(), by = %subject.id, "role changed");
    Ok(Json(RoleChangedResponse {
        message: format!("Role updated to {}", role.as_str()),
        data: PublicUser::from(updated),
    }))
}
