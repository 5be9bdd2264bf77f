use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::utils::response::error as error_response;

/// Every failure the core can surface, mapped to a stable code so clients can
/// branch on SOLD_OUT vs NOT_FOUND without string matching. A repeated
/// validation attempt is *not* an error; it comes back as a normal response
/// with status ALREADY_USED.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Sold out: {0}")]
    SoldOut(String),

    #[error("Ticket type in use: {0}")]
    TicketTypeInUse(String),

    #[error("QR code generation failed: {0}")]
    QrCodeGeneration(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SoldOut(_) => StatusCode::CONFLICT,
            AppError::TicketTypeInUse(_) => StatusCode::CONFLICT,
            AppError::QrCodeGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SoldOut(_) => "SOLD_OUT",
            AppError::TicketTypeInUse(_) => "TICKET_TYPE_IN_USE",
            AppError::QrCodeGeneration(_) => "QR_CODE_GENERATION_FAILED",
            AppError::Database(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::SoldOut(msg)
            | AppError::TicketTypeInUse(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::QrCodeGeneration(msg) => {
                error!(error = ?self, message = %msg, "QR code generation error");
            }
            AppError::Database(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::SoldOut(msg)
            | AppError::TicketTypeInUse(msg) => msg.clone(),
            AppError::QrCodeGeneration(_) => "Failed to generate QR code".to_string(),
            AppError::Database(_) => "A database error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
