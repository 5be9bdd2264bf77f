use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Event, EventStatus, TicketType, User};
use crate::utils::error::AppError;
use crate::utils::response::{Page, PageParams};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub venue: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub status: EventStatus,
    #[serde(default)]
    pub ticket_types: Vec<CreateTicketTypeRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketTypeRequest {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub total_available: Option<i32>,
}

/// Full-representation update: every scalar field is overwritten, and the
/// ticket-type list is reconciled against the persisted set.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEventRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub venue: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub status: EventStatus,
    #[serde(default)]
    pub ticket_types: Vec<TicketTypeEdit>,
}

/// One entry of the submitted ticket-type edit set. A missing id is a
/// create; a present id must match a persisted ticket type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TicketTypeEdit {
    pub id: Option<Uuid>,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub total_available: Option<i32>,
}

/// The event aggregate as returned to callers.
#[derive(Debug, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub ticket_types: Vec<TicketType>,
}

#[derive(Debug, Default, PartialEq)]
pub struct TicketTypeDiff {
    pub creates: Vec<TicketTypeEdit>,
    pub updates: Vec<TicketTypeEdit>,
    pub deletes: Vec<Uuid>,
}

/// Splits an incoming edit set against the persisted id set. Persisted types
/// absent from the edits are deleted; edits without an id are creates; edits
/// with a persisted id are updates; an edit with an unknown id is an error
/// carrying that id.
///
/// Pure on purpose: the transactional apply is driven entirely by the
/// returned plan.
pub fn diff_ticket_types(
    persisted: &[Uuid],
    edits: &[TicketTypeEdit],
) -> Result<TicketTypeDiff, Uuid> {
    let edited_ids: HashSet<Uuid> = edits.iter().filter_map(|edit| edit.id).collect();

    let mut diff = TicketTypeDiff {
        deletes: persisted
            .iter()
            .copied()
            .filter(|id| !edited_ids.contains(id))
            .collect(),
        ..TicketTypeDiff::default()
    };

    for edit in edits {
        match edit.id {
            None => diff.creates.push(edit.clone()),
            Some(id) if persisted.contains(&id) => diff.updates.push(edit.clone()),
            Some(id) => return Err(id),
        }
    }

    Ok(diff)
}

#[derive(Clone)]
pub struct EventService {
    pool: PgPool,
}

impl EventService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_event(
        &self,
        organizer_id: Uuid,
        request: CreateEventRequest,
    ) -> Result<EventDetails, AppError> {
        validate_event_fields(&request.name, &request.venue)?;
        validate_windows(
            request.start_time,
            request.end_time,
            request.sales_start,
            request.sales_end,
        )?;
        for ticket_type in &request.ticket_types {
            validate_ticket_type_fields(
                &ticket_type.name,
                ticket_type.price,
                ticket_type.total_available,
            )?;
        }

        let mut tx = self.pool.begin().await?;

        let organizer = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(organizer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User with id {} not found", organizer_id))
            })?;

        let event = sqlx::query_as::<_, Event>(
            r#"INSERT INTO events
                   (id, organizer_id, name, venue, start_time, end_time, sales_start, sales_end, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organizer.id)
        .bind(&request.name)
        .bind(&request.venue)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.sales_start)
        .bind(request.sales_end)
        .bind(request.status)
        .fetch_one(&mut *tx)
        .await?;

        for ticket_type in &request.ticket_types {
            insert_ticket_type(
                &mut *tx,
                event.id,
                &ticket_type.name,
                ticket_type.price,
                ticket_type.description.as_deref(),
                ticket_type.total_available,
            )
            .await?;
        }

        let ticket_types = list_ticket_types(&mut *tx, event.id).await?;
        tx.commit().await?;

        Ok(EventDetails {
            event,
            ticket_types,
        })
    }

    pub async fn list_events_for_organizer(
        &self,
        organizer_id: Uuid,
        params: &PageParams,
    ) -> Result<Page<Event>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE organizer_id = $1")
            .bind(organizer_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events
               WHERE organizer_id = $1
               ORDER BY created_at DESC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(organizer_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, params))
    }

    /// Identity-scoped: an event owned by someone else is indistinguishable
    /// from one that does not exist.
    pub async fn get_event_for_organizer(
        &self,
        organizer_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<EventDetails>, AppError> {
        let event =
            sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 AND organizer_id = $2")
                .bind(event_id)
                .bind(organizer_id)
                .fetch_optional(&self.pool)
                .await?;

        match event {
            None => Ok(None),
            Some(event) => {
                let ticket_types = list_ticket_types(&self.pool, event.id).await?;
                Ok(Some(EventDetails {
                    event,
                    ticket_types,
                }))
            }
        }
    }

    /// Reconciles the submitted aggregate against the persisted one in a
    /// single transaction: scalar fields are overwritten wholesale, and the
    /// ticket-type edit set is applied as a create/update/delete plan. Any
    /// failure leaves the event untouched.
    pub async fn update_event_for_organizer(
        &self,
        organizer_id: Uuid,
        event_id: Uuid,
        request: UpdateEventRequest,
    ) -> Result<EventDetails, AppError> {
        let body_id = request
            .id
            .ok_or_else(|| AppError::Validation("Event id is required".to_string()))?;
        if body_id != event_id {
            return Err(AppError::Validation(
                "Cannot update the id of an event".to_string(),
            ));
        }

        validate_event_fields(&request.name, &request.venue)?;
        validate_windows(
            request.start_time,
            request.end_time,
            request.sales_start,
            request.sales_end,
        )?;
        for edit in &request.ticket_types {
            validate_ticket_type_fields(&edit.name, edit.price, edit.total_available)?;
        }

        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(
            r#"UPDATE events
               SET name = $1, venue = $2, start_time = $3, end_time = $4,
                   sales_start = $5, sales_end = $6, status = $7, updated_at = now()
               WHERE id = $8 AND organizer_id = $9
               RETURNING *"#,
        )
        .bind(&request.name)
        .bind(&request.venue)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.sales_start)
        .bind(request.sales_end)
        .bind(request.status)
        .bind(event_id)
        .bind(organizer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id {} not found", event_id)))?;

        let persisted: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM ticket_types WHERE event_id = $1")
                .bind(event_id)
                .fetch_all(&mut *tx)
                .await?;

        let diff = diff_ticket_types(&persisted, &request.ticket_types).map_err(|unknown| {
            AppError::NotFound(format!("Ticket type with id {} not found", unknown))
        })?;

        for ticket_type_id in &diff.deletes {
            // Fails closed: a type that already admitted money does not
            // silently vanish along with its purchasers' tickets.
            let sold: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1")
                    .bind(ticket_type_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if sold > 0 {
                return Err(AppError::TicketTypeInUse(format!(
                    "Ticket type with id {} has sold tickets and cannot be removed",
                    ticket_type_id
                )));
            }

            sqlx::query("DELETE FROM ticket_types WHERE id = $1 AND event_id = $2")
                .bind(ticket_type_id)
                .bind(event_id)
                .execute(&mut *tx)
                .await?;
        }

        for edit in &diff.updates {
            sqlx::query(
                r#"UPDATE ticket_types
                   SET name = $1, price = $2, description = $3, total_available = $4,
                       updated_at = now()
                   WHERE id = $5 AND event_id = $6"#,
            )
            .bind(&edit.name)
            .bind(edit.price)
            .bind(&edit.description)
            .bind(edit.total_available)
            .bind(edit.id)
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        }

        for edit in &diff.creates {
            insert_ticket_type(
                &mut *tx,
                event_id,
                &edit.name,
                edit.price,
                edit.description.as_deref(),
                edit.total_available,
            )
            .await?;
        }

        let ticket_types = list_ticket_types(&mut *tx, event_id).await?;
        tx.commit().await?;

        Ok(EventDetails {
            event,
            ticket_types,
        })
    }

    /// Idempotent: deleting an absent (or unowned) event is a silent no-op.
    pub async fn delete_event_for_organizer(
        &self,
        organizer_id: Uuid,
        event_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM events WHERE id = $1 AND organizer_id = $2")
                .bind(event_id)
                .bind(organizer_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_none() {
            return Ok(());
        }

        let sold: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*)
               FROM tickets t
               JOIN ticket_types tt ON tt.id = t.ticket_type_id
               WHERE tt.event_id = $1"#,
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;
        if sold > 0 {
            return Err(AppError::TicketTypeInUse(format!(
                "Event with id {} has sold tickets and cannot be deleted",
                event_id
            )));
        }

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_published_events(
        &self,
        params: &PageParams,
    ) -> Result<Page<Event>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE status = $1")
            .bind(EventStatus::Published)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events
               WHERE status = $1
               ORDER BY start_time ASC NULLS LAST, created_at DESC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(EventStatus::Published)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, params))
    }

    pub async fn search_published_events(
        &self,
        query: &str,
        params: &PageParams,
    ) -> Result<Page<Event>, AppError> {
        let pattern = format!("%{}%", query);

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM events
               WHERE status = $1 AND (name ILIKE $2 OR venue ILIKE $2)"#,
        )
        .bind(EventStatus::Published)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events
               WHERE status = $1 AND (name ILIKE $2 OR venue ILIKE $2)
               ORDER BY start_time ASC NULLS LAST, created_at DESC
               LIMIT $3 OFFSET $4"#,
        )
        .bind(EventStatus::Published)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, params))
    }

    pub async fn get_published_event(
        &self,
        event_id: Uuid,
    ) -> Result<Option<EventDetails>, AppError> {
        let event =
            sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 AND status = $2")
                .bind(event_id)
                .bind(EventStatus::Published)
                .fetch_optional(&self.pool)
                .await?;

        match event {
            None => Ok(None),
            Some(event) => {
                let ticket_types = list_ticket_types(&self.pool, event.id).await?;
                Ok(Some(EventDetails {
                    event,
                    ticket_types,
                }))
            }
        }
    }
}

async fn insert_ticket_type<'a>(
    executor: impl sqlx::PgExecutor<'a>,
    event_id: Uuid,
    name: &str,
    price: Decimal,
    description: Option<&str>,
    total_available: Option<i32>,
) -> Result<TicketType, AppError> {
    let ticket_type = sqlx::query_as::<_, TicketType>(
        r#"INSERT INTO ticket_types (id, event_id, name, price, description, total_available)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(name)
    .bind(price)
    .bind(description)
    .bind(total_available)
    .fetch_one(executor)
    .await?;

    Ok(ticket_type)
}

async fn list_ticket_types<'a>(
    executor: impl sqlx::PgExecutor<'a>,
    event_id: Uuid,
) -> Result<Vec<TicketType>, AppError> {
    let ticket_types = sqlx::query_as::<_, TicketType>(
        "SELECT * FROM ticket_types WHERE event_id = $1 ORDER BY created_at, id",
    )
    .bind(event_id)
    .fetch_all(executor)
    .await?;

    Ok(ticket_types)
}

fn validate_event_fields(name: &str, venue: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".to_string()));
    }
    if venue.trim().is_empty() {
        return Err(AppError::Validation("Event venue is required".to_string()));
    }
    Ok(())
}

fn validate_windows(
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    sales_start: Option<DateTime<Utc>>,
    sales_end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            return Err(AppError::Validation(
                "Event end must not precede its start".to_string(),
            ));
        }
    }
    if let (Some(start), Some(end)) = (sales_start, sales_end) {
        if end < start {
            return Err(AppError::Validation(
                "Sales window end must not precede its start".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_ticket_type_fields(
    name: &str,
    price: Decimal,
    total_available: Option<i32>,
) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(
            "Ticket type name is required".to_string(),
        ));
    }
    if price < Decimal::ZERO {
        return Err(AppError::Validation(
            "Ticket type price must be zero or greater".to_string(),
        ));
    }
    if let Some(total) = total_available {
        if total < 0 {
            return Err(AppError::Validation(
                "Ticket type capacity must be zero or greater".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(id: Option<Uuid>, name: &str) -> TicketTypeEdit {
        TicketTypeEdit {
            id,
            name: name.to_string(),
            price: Decimal::from(25),
            description: None,
            total_available: Some(100),
        }
    }

    #[test]
    fn test_diff_splits_creates_updates_deletes() {
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();

        let diff = diff_ticket_types(
            &[kept, dropped],
            &[edit(None, "General"), edit(Some(kept), "VIP")],
        )
        .unwrap();

        assert_eq!(diff.creates, vec![edit(None, "General")]);
        assert_eq!(diff.updates, vec![edit(Some(kept), "VIP")]);
        assert_eq!(diff.deletes, vec![dropped]);
    }

    #[test]
    fn test_diff_rejects_unknown_id() {
        let unknown = Uuid::new_v4();
        let result = diff_ticket_types(&[Uuid::new_v4()], &[edit(Some(unknown), "Ghost")]);
        assert_eq!(result.unwrap_err(), unknown);
    }

    #[test]
    fn test_empty_edit_set_deletes_everything() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let diff = diff_ticket_types(&[a, b], &[]).unwrap();

        assert!(diff.creates.is_empty());
        assert!(diff.updates.is_empty());
        assert_eq!(diff.deletes, vec![a, b]);
    }

    #[test]
    fn test_resending_the_full_set_only_updates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let diff = diff_ticket_types(&[a, b], &[edit(Some(a), "A"), edit(Some(b), "B")]).unwrap();

        assert!(diff.creates.is_empty());
        assert!(diff.deletes.is_empty());
        assert_eq!(diff.updates.len(), 2);
    }

    #[test]
    fn test_diff_against_empty_persisted_set_is_all_creates() {
        let diff = diff_ticket_types(&[], &[edit(None, "Early bird")]).unwrap();

        assert_eq!(diff.creates.len(), 1);
        assert!(diff.updates.is_empty());
        assert!(diff.deletes.is_empty());
    }

    #[test]
    fn test_window_validation() {
        let earlier = "2026-06-01T18:00:00Z".parse().unwrap();
        let later = "2026-06-01T23:00:00Z".parse().unwrap();

        assert!(validate_windows(Some(earlier), Some(later), None, None).is_ok());
        assert!(validate_windows(Some(later), Some(earlier), None, None).is_err());
        assert!(validate_windows(None, None, Some(later), Some(earlier)).is_err());
        assert!(validate_windows(None, Some(later), Some(earlier), None).is_ok());
    }

    #[test]
    fn test_ticket_type_field_validation() {
        assert!(validate_ticket_type_fields("VIP", Decimal::from(10), Some(5)).is_ok());
        assert!(validate_ticket_type_fields("  ", Decimal::from(10), None).is_err());
        assert!(validate_ticket_type_fields("VIP", Decimal::from(-1), None).is_err());
        assert!(validate_ticket_type_fields("VIP", Decimal::ZERO, Some(-1)).is_err());
    }
}
