#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use boxoffice_server::models::EventStatus;
use boxoffice_server::routes::AppState;
use boxoffice_server::services::events::{
    CreateEventRequest, CreateTicketTypeRequest, EventDetails,
};

pub fn state(pool: &PgPool) -> AppState {
    AppState::new(pool.clone())
}

pub async fn create_user(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(format!("{}@example.com", id))
        .execute(pool)
        .await
        .expect("failed to insert user");
    id
}

pub fn ticket_type_request(name: &str, total_available: Option<i32>) -> CreateTicketTypeRequest {
    CreateTicketTypeRequest {
        name: name.to_string(),
        price: Decimal::from(25),
        description: None,
        total_available,
    }
}

pub fn event_request(ticket_types: Vec<CreateTicketTypeRequest>) -> CreateEventRequest {
    CreateEventRequest {
        name: "Launch Party".to_string(),
        venue: "Warehouse 9".to_string(),
        start_time: None,
        end_time: None,
        sales_start: None,
        sales_end: None,
        status: EventStatus::Published,
        ticket_types,
    }
}

pub async fn create_event_with_type(
    state: &AppState,
    organizer_id: Uuid,
    total_available: Option<i32>,
) -> EventDetails {
    state
        .events
        .create_event(
            organizer_id,
            event_request(vec![ticket_type_request("General", total_available)]),
        )
        .await
        .expect("failed to create event")
}
