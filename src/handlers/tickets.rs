use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::routes::AppState;
use crate::utils::auth::CurrentUser;
use crate::utils::error::AppError;
use crate::utils::response::{created, success, PageParams};

pub async fn purchase_ticket(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ticket_type_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let ticket = state
        .tickets
        .purchase_ticket(user_id, ticket_type_id)
        .await?;
    Ok(created(ticket, "Ticket purchased").into_response())
}

pub async fn list_tickets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let page = state.tickets.list_tickets_for_user(user_id, &params).await?;
    Ok(success(page, "Tickets retrieved").into_response())
}

pub async fn get_ticket(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let ticket = state
        .tickets
        .get_ticket_for_user(user_id, ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket with id {} not found", ticket_id)))?;
    Ok(success(ticket, "Ticket retrieved").into_response())
}

pub async fn get_ticket_qr_code(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let bytes = state.qr_codes.get_qr_code_image(user_id, ticket_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
