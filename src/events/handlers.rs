use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::Identity,
        policy::{authorize, Action, Resource},
    },
    dto::{Data, List},
    error::ApiError,
    events::{
        repo_types::Event,
        validators::{parse_category_filter, validate_event_changes, validate_new_event},
    },
    extract::{parse_id, JsonObject, QueryParams},
    state::AppState,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListEventsQuery>,
) -> Result<Json<List<Event>>, ApiError> {
    let category = match query.category.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_category_filter(raw)?),
    };
    let events = state.events.list(category, None).await?;
    Ok(Json(List::from(events)))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Data<Event>>, ApiError> {
    let id = parse_id(&id, "event")?;
    let event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(Data { data: event }))
}

#[instrument(skip(state, identity, body))]
pub async fn create_event(
    State(state): State<AppState>,
    identity: Result<Identity, ApiError>,
    JsonObject(body): JsonObject,
) -> Result<(StatusCode, Json<Data<Event>>), ApiError> {
    let input = validate_new_event(&body, OffsetDateTime::now_utc())?;
    let Identity(user) = identity?;

    let event = state.events.create(user.id, input).await?;

    info!(event_id = %event.id, user_id = %user.id, "event created");
    Ok((StatusCode::CREATED, Json(Data { data: event })))
}

#[instrument(skip(state, identity, body))]
pub async fn update_event(
    State(state): State<AppState>,
    identity: Result<Identity, ApiError>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<Json<Data<Event>>, ApiError> {
    let changes = validate_event_changes(&body, OffsetDateTime::now_utc())?;
    let identity = identity?;

    // Existence before ownership: a missing event is 404 for everyone.
    let id = parse_id(&id, "event")?;
    let existing = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;

    let decision = authorize(
        &identity.subject(),
        Action::UpdateEvent,
        Resource::Event {
            created_by: existing.created_by,
        },
    );
    if let Err(e) = decision.into_result() {
        warn!(event_id = %id, user_id = %identity.0.id, "event update denied");
        return Err(e);
    }

    let event = state
        .events
        .update(id, &changes)
        .await?
        .ok_or(ApiError::NotFound("event"))?;

    info!(event_id = %event.id, user_id = %identity.0.id, "event updated");
    Ok(Json(Data { data: event }))
}

#[instrument(skip(state, identity))]
pub async fn delete_event(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "event")?;
    let existing = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("event"))?;

    let decision = authorize(
        &identity.subject(),
        Action::DeleteEvent,
        Resource::Event {
            created_by: existing.created_by,
        },
    );
    if let Err(e) = decision.into_result() {
        warn!(event_id = %id, user_id = %identity.0.id, "event delete denied");
        return Err(e);
    }

    if !state.events.delete(id).await? {
        return Err(ApiError::NotFound("event"));
    }

    info!(event_id = %id, user_id = %identity.0.id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
