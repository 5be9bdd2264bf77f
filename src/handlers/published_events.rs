use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{success, PageParams};

#[derive(Debug, Deserialize)]
pub struct PublishedEventsQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_published_events(
    State(state): State<AppState>,
    Query(query): Query<PublishedEventsQuery>,
) -> Result<Response, AppError> {
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    let page = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.events.search_published_events(q, &params).await?,
        None => state.events.list_published_events(&params).await?,
    };

    Ok(success(page, "Published events retrieved").into_response())
}

pub async fn get_published_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = state
        .events
        .get_published_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id {} not found", event_id)))?;
    Ok(success(event, "Published event retrieved").into_response())
}
