use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::routes::AppState;
use crate::services::events::{CreateEventRequest, UpdateEventRequest};
use crate::utils::auth::CurrentUser;
use crate::utils::error::AppError;
use crate::utils::response::{created, success, PageParams};

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(organizer_id): CurrentUser,
    Json(request): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    let event = state.events.create_event(organizer_id, request).await?;
    Ok(created(event, "Event created").into_response())
}

pub async fn list_events(
    State(state): State<AppState>,
    CurrentUser(organizer_id): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let page = state
        .events
        .list_events_for_organizer(organizer_id, &params)
        .await?;
    Ok(success(page, "Events retrieved").into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    CurrentUser(organizer_id): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = state
        .events
        .get_event_for_organizer(organizer_id, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id {} not found", event_id)))?;
    Ok(success(event, "Event retrieved").into_response())
}

pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(organizer_id): CurrentUser,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let event = state
        .events
        .update_event_for_organizer(organizer_id, event_id, request)
        .await?;
    Ok(success(event, "Event updated").into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(organizer_id): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state
        .events
        .delete_event_for_organizer(organizer_id, event_id)
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
