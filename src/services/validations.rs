use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{QrCode, QrCodeStatus, TicketValidation, TicketValidationMethod, TicketValidationStatus};
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct ValidationService {
    pool: PgPool,
}

impl ValidationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs one validation attempt through the credential state machine.
    ///
    /// QR attempts carry the credential id; MANUAL attempts carry the ticket
    /// id. Either way the credential row is locked exclusively, so of any
    /// number of simultaneous attempts exactly one observes ACTIVE and flips
    /// it to USED; the rest come back ALREADY_USED. Every attempt appends one
    /// immutable audit row.
    pub async fn validate_ticket(
        &self,
        id: Uuid,
        method: TicketValidationMethod,
    ) -> Result<TicketValidation, AppError> {
        let mut tx = self.pool.begin().await?;

        let qr_code = match method {
            TicketValidationMethod::Qr => {
                sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            TicketValidationMethod::Manual => {
                sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE ticket_id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };

        let Some(qr_code) = qr_code else {
            return Err(AppError::NotFound(match method {
                TicketValidationMethod::Qr => format!("QR code with id {} not found", id),
                TicketValidationMethod::Manual => format!("Ticket with id {} not found", id),
            }));
        };

        let status = match qr_code.status {
            QrCodeStatus::Active => {
                sqlx::query("UPDATE qr_codes SET status = $1, updated_at = now() WHERE id = $2")
                    .bind(QrCodeStatus::Used)
                    .bind(qr_code.id)
                    .execute(&mut *tx)
                    .await?;
                TicketValidationStatus::Valid
            }
            // Not an error: the first validator won, everyone later is told so.
            QrCodeStatus::Used => TicketValidationStatus::AlreadyUsed,
        };

        let validation = sqlx::query_as::<_, TicketValidation>(
            r#"INSERT INTO ticket_validations (id, ticket_id, status, method)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(qr_code.ticket_id)
        .bind(status)
        .bind(method)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(validation)
    }
}
