use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{TicketValidationMethod, TicketValidationStatus};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// For QR attempts `id` is the credential id scanned off the image; for
/// MANUAL attempts it is the ticket id itself.
#[derive(Debug, Deserialize)]
pub struct TicketValidationRequest {
    pub id: Uuid,
    pub method: TicketValidationMethod,
}

#[derive(Debug, Serialize)]
pub struct TicketValidationResponse {
    pub ticket_id: Uuid,
    pub status: TicketValidationStatus,
}

pub async fn validate_ticket(
    State(state): State<AppState>,
    Json(request): Json<TicketValidationRequest>,
) -> Result<Response, AppError> {
    let validation = state
        .validations
        .validate_ticket(request.id, request.method)
        .await?;

    let response = TicketValidationResponse {
        ticket_id: validation.ticket_id,
        status: validation.status,
    };
    Ok(success(response, "Ticket validation recorded").into_response())
}
