use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_validation_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketValidationStatus {
    Valid,
    AlreadyUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_validation_method", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketValidationMethod {
    Manual,
    Qr,
}

/// One row per validation attempt, successful or not. Never updated or
/// deleted after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketValidation {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub status: TicketValidationStatus,
    pub method: TicketValidationMethod,
    pub created_at: DateTime<Utc>,
}
