use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::{self, events, published_events, tickets, validations};
use crate::services::events::EventService;
use crate::services::qr_codes::QrCodeService;
use crate::services::tickets::TicketService;
use crate::services::validations::ValidationService;

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub tickets: TicketService,
    pub qr_codes: QrCodeService,
    pub validations: ValidationService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let qr_codes = QrCodeService::new(pool.clone());
        Self {
            events: EventService::new(pool.clone()),
            tickets: TicketService::new(pool.clone(), qr_codes.clone()),
            validations: ValidationService::new(pool),
            qr_codes,
        }
    }
}

pub fn create_routes(pool: PgPool) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(AppState::new(pool))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer());

    apply_security_headers(router)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events",
            post(events::create_event).get(events::list_events),
        )
        .route(
            "/events/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/published-events",
            get(published_events::list_published_events),
        )
        .route(
            "/published-events/:event_id",
            get(published_events::get_published_event),
        )
        .route(
            "/ticket-types/:ticket_type_id/tickets",
            post(tickets::purchase_ticket),
        )
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/:ticket_id", get(tickets::get_ticket))
        .route("/tickets/:ticket_id/qr-codes", get(tickets::get_ticket_qr_code))
        .route("/ticket-validations", post(validations::validate_ticket))
}
