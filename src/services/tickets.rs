use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Ticket, TicketStatus, TicketType, User};
use crate::services::qr_codes::QrCodeService;
use crate::utils::error::AppError;
use crate::utils::response::{Page, PageParams};

#[derive(Clone)]
pub struct TicketService {
    pool: PgPool,
    qr_codes: QrCodeService,
}

/// A purchased ticket together with the type and event it admits to.
#[derive(Debug, Serialize)]
pub struct TicketDetails {
    pub id: Uuid,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub ticket_type: TicketTypeSummary,
}

#[derive(Debug, Serialize)]
pub struct TicketTypeSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub event_id: Uuid,
    pub event_name: String,
    pub venue: String,
}

#[derive(Debug, FromRow)]
struct TicketDetailsRow {
    id: Uuid,
    status: TicketStatus,
    created_at: DateTime<Utc>,
    ticket_type_id: Uuid,
    ticket_type_name: String,
    price: Decimal,
    description: Option<String>,
    event_id: Uuid,
    event_name: String,
    venue: String,
}

impl TicketDetailsRow {
    fn into_details(self) -> TicketDetails {
        TicketDetails {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            ticket_type: TicketTypeSummary {
                id: self.ticket_type_id,
                name: self.ticket_type_name,
                price: self.price,
                description: self.description,
                event_id: self.event_id,
                event_name: self.event_name,
                venue: self.venue,
            },
        }
    }
}

const TICKET_DETAILS_SELECT: &str = r#"
    SELECT t.id, t.status, t.created_at,
           tt.id AS ticket_type_id, tt.name AS ticket_type_name, tt.price, tt.description,
           e.id AS event_id, e.name AS event_name, e.venue
    FROM tickets t
    JOIN ticket_types tt ON tt.id = t.ticket_type_id
    JOIN events e ON e.id = tt.event_id
"#;

impl TicketService {
    pub fn new(pool: PgPool, qr_codes: QrCodeService) -> Self {
        Self { pool, qr_codes }
    }

    /// Purchases one ticket of the given type. The capacity check, ticket
    /// insert and credential insert all happen inside a single transaction
    /// holding an exclusive lock on the ticket-type row, so concurrent
    /// purchases serialize and the Nth reservation is granted only while
    /// N <= total_available.
    pub async fn purchase_ticket(
        &self,
        user_id: Uuid,
        ticket_type_id: Uuid,
    ) -> Result<Ticket, AppError> {
        let mut tx = self.pool.begin().await?;

        let purchaser = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        // Concurrent purchases of the same type queue up here until this
        // transaction commits or rolls back.
        let ticket_type = sqlx::query_as::<_, TicketType>(
            "SELECT * FROM ticket_types WHERE id = $1 FOR UPDATE",
        )
        .bind(ticket_type_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Ticket type with id {} not found", ticket_type_id))
        })?;

        let purchased: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1")
                .bind(ticket_type_id)
                .fetch_one(&mut *tx)
                .await?;

        // NULL capacity means unbounded.
        if let Some(total_available) = ticket_type.total_available {
            if purchased + 1 > i64::from(total_available) {
                return Err(AppError::SoldOut(format!(
                    "Ticket type with id {} has been sold out",
                    ticket_type_id
                )));
            }
        }

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"INSERT INTO tickets (id, ticket_type_id, purchaser_id, status)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(ticket_type.id)
        .bind(purchaser.id)
        .bind(TicketStatus::Purchased)
        .fetch_one(&mut *tx)
        .await?;

        self.qr_codes.generate_qr_code(&mut tx, ticket.id).await?;

        tx.commit().await?;

        Ok(ticket)
    }

    pub async fn list_tickets_for_user(
        &self,
        user_id: Uuid,
        params: &PageParams,
    ) -> Result<Page<TicketDetails>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE purchaser_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "{} WHERE t.purchaser_id = $1 ORDER BY t.created_at DESC LIMIT $2 OFFSET $3",
            TICKET_DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, TicketDetailsRow>(&query)
            .bind(user_id)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(TicketDetailsRow::into_details).collect();
        Ok(Page::new(items, total, params))
    }

    pub async fn get_ticket_for_user(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<Option<TicketDetails>, AppError> {
        let query = format!(
            "{} WHERE t.purchaser_id = $1 AND t.id = $2",
            TICKET_DETAILS_SELECT
        );
        let row = sqlx::query_as::<_, TicketDetailsRow>(&query)
            .bind(user_id)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TicketDetailsRow::into_details))
    }
}
