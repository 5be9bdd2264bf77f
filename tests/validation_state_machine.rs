mod common;

use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

use boxoffice_server::models::{TicketValidationMethod, TicketValidationStatus};
use boxoffice_server::routes::AppState;
use boxoffice_server::utils::error::AppError;

use common::{create_event_with_type, create_user, state};

async fn purchase_one(state: &AppState, pool: &PgPool) -> (Uuid, Uuid) {
    let organizer = create_user(pool, "organizer").await;
    let buyer = create_user(pool, "buyer").await;
    let event = create_event_with_type(state, organizer, Some(10)).await;
    let ticket = state
        .tickets
        .purchase_ticket(buyer, event.ticket_types[0].id)
        .await
        .unwrap();

    let qr_code_id: Uuid = sqlx::query_scalar("SELECT id FROM qr_codes WHERE ticket_id = $1")
        .bind(ticket.id)
        .fetch_one(pool)
        .await
        .unwrap();

    (ticket.id, qr_code_id)
}

#[sqlx::test]
async fn first_qr_validation_wins_and_repeat_is_reported(pool: PgPool) {
    let state = state(&pool);
    let (ticket_id, qr_code_id) = purchase_one(&state, &pool).await;

    let first = state
        .validations
        .validate_ticket(qr_code_id, TicketValidationMethod::Qr)
        .await
        .unwrap();
    assert_eq!(first.status, TicketValidationStatus::Valid);
    assert_eq!(first.ticket_id, ticket_id);

    let second = state
        .validations
        .validate_ticket(qr_code_id, TicketValidationMethod::Qr)
        .await
        .unwrap();
    assert_eq!(second.status, TicketValidationStatus::AlreadyUsed);
    assert_eq!(second.ticket_id, ticket_id);
}

#[sqlx::test]
async fn manual_validation_consumes_the_same_credential(pool: PgPool) {
    let state = state(&pool);
    let (ticket_id, qr_code_id) = purchase_one(&state, &pool).await;

    let manual = state
        .validations
        .validate_ticket(ticket_id, TicketValidationMethod::Manual)
        .await
        .unwrap();
    assert_eq!(manual.status, TicketValidationStatus::Valid);

    // The credential is consumed regardless of which entry mode consumed it.
    let by_qr = state
        .validations
        .validate_ticket(qr_code_id, TicketValidationMethod::Qr)
        .await
        .unwrap();
    assert_eq!(by_qr.status, TicketValidationStatus::AlreadyUsed);
}

#[sqlx::test]
async fn concurrent_validations_have_exactly_one_winner(pool: PgPool) {
    let state = state(&pool);
    let (_ticket_id, qr_code_id) = purchase_one(&state, &pool).await;

    let mut attempts = JoinSet::new();
    for _ in 0..10 {
        let validations = state.validations.clone();
        attempts.spawn(async move {
            validations
                .validate_ticket(qr_code_id, TicketValidationMethod::Qr)
                .await
        });
    }

    let mut valid = 0;
    let mut already_used = 0;
    while let Some(result) = attempts.join_next().await {
        match result.unwrap().unwrap().status {
            TicketValidationStatus::Valid => valid += 1,
            TicketValidationStatus::AlreadyUsed => already_used += 1,
        }
    }

    assert_eq!(valid, 1);
    assert_eq!(already_used, 9);
}

#[sqlx::test]
async fn every_attempt_appends_an_audit_record(pool: PgPool) {
    let state = state(&pool);
    let (ticket_id, qr_code_id) = purchase_one(&state, &pool).await;

    for _ in 0..4 {
        state
            .validations
            .validate_ticket(qr_code_id, TicketValidationMethod::Qr)
            .await
            .unwrap();
    }

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ticket_validations WHERE ticket_id = $1")
            .bind(ticket_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total, 4);

    let valid: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ticket_validations WHERE ticket_id = $1 AND status = 'valid'",
    )
    .bind(ticket_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(valid, 1);
}

#[sqlx::test]
async fn unknown_identifiers_are_not_found(pool: PgPool) {
    let state = state(&pool);

    let by_qr = state
        .validations
        .validate_ticket(Uuid::new_v4(), TicketValidationMethod::Qr)
        .await;
    assert!(matches!(by_qr, Err(AppError::NotFound(_))));

    let by_ticket = state
        .validations
        .validate_ticket(Uuid::new_v4(), TicketValidationMethod::Manual)
        .await;
    assert!(matches!(by_ticket, Err(AppError::NotFound(_))));
}
