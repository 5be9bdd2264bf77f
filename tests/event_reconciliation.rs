mod common;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use boxoffice_server::models::EventStatus;
use boxoffice_server::services::events::{EventDetails, TicketTypeEdit, UpdateEventRequest};
use boxoffice_server::utils::error::AppError;

use common::{create_event_with_type, create_user, event_request, state, ticket_type_request};

fn update_request(details: &EventDetails, ticket_types: Vec<TicketTypeEdit>) -> UpdateEventRequest {
    UpdateEventRequest {
        id: Some(details.event.id),
        name: details.event.name.clone(),
        venue: details.event.venue.clone(),
        start_time: details.event.start_time,
        end_time: details.event.end_time,
        sales_start: details.event.sales_start,
        sales_end: details.event.sales_end,
        status: details.event.status,
        ticket_types,
    }
}

fn edit_of(id: Option<Uuid>, name: &str, price: Decimal) -> TicketTypeEdit {
    TicketTypeEdit {
        id,
        name: name.to_string(),
        price,
        description: None,
        total_available: Some(50),
    }
}

#[sqlx::test]
async fn reconcile_applies_create_update_delete_in_one_pass(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;

    let details = state
        .events
        .create_event(
            organizer,
            event_request(vec![
                ticket_type_request("General", Some(100)),
                ticket_type_request("VIP", Some(10)),
                ticket_type_request("Backstage", Some(5)),
            ]),
        )
        .await
        .unwrap();

    let general = &details.ticket_types[0];
    let vip = &details.ticket_types[1];

    // Reprice General, keep VIP unchanged, add Balcony, omit Backstage.
    let updated = state
        .events
        .update_event_for_organizer(
            organizer,
            details.event.id,
            update_request(
                &details,
                vec![
                    edit_of(Some(general.id), "General", Decimal::from(40)),
                    edit_of(Some(vip.id), "VIP", vip.price),
                    edit_of(None, "Balcony", Decimal::from(15)),
                ],
            ),
        )
        .await
        .unwrap();

    assert_eq!(updated.ticket_types.len(), 3);

    let names: Vec<&str> = updated
        .ticket_types
        .iter()
        .map(|tt| tt.name.as_str())
        .collect();
    assert!(names.contains(&"General"));
    assert!(names.contains(&"VIP"));
    assert!(names.contains(&"Balcony"));
    assert!(!names.contains(&"Backstage"));

    let general_after = updated
        .ticket_types
        .iter()
        .find(|tt| tt.id == general.id)
        .unwrap();
    assert_eq!(general_after.price, Decimal::from(40));
}

#[sqlx::test]
async fn reconcile_with_unknown_id_changes_nothing(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;
    let details = create_event_with_type(&state, organizer, Some(100)).await;

    let result = state
        .events
        .update_event_for_organizer(
            organizer,
            details.event.id,
            update_request(
                &details,
                vec![
                    edit_of(None, "Balcony", Decimal::from(15)),
                    edit_of(Some(Uuid::new_v4()), "Ghost", Decimal::from(5)),
                ],
            ),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // The whole edit set must have been rolled back, including the create.
    let after = state
        .events
        .get_event_for_organizer(organizer, details.event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.ticket_types.len(), 1);
    assert_eq!(after.ticket_types[0].name, "General");
}

#[sqlx::test]
async fn reconcile_rejects_missing_or_mismatched_body_id(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;
    let details = create_event_with_type(&state, organizer, Some(100)).await;

    let mut missing_id = update_request(&details, vec![]);
    missing_id.id = None;
    missing_id.name = "Renamed".to_string();
    let result = state
        .events
        .update_event_for_organizer(organizer, details.event.id, missing_id)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let mut mismatched = update_request(&details, vec![]);
    mismatched.id = Some(Uuid::new_v4());
    mismatched.name = "Renamed".to_string();
    let result = state
        .events
        .update_event_for_organizer(organizer, details.event.id, mismatched)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let after = state
        .events
        .get_event_for_organizer(organizer, details.event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.event.name, details.event.name);
    assert_eq!(after.ticket_types.len(), 1);
}

#[sqlx::test]
async fn reconcile_refuses_to_delete_a_type_with_sold_tickets(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;
    let buyer = create_user(&pool, "buyer").await;
    let details = create_event_with_type(&state, organizer, Some(100)).await;

    state
        .tickets
        .purchase_ticket(buyer, details.ticket_types[0].id)
        .await
        .unwrap();

    let result = state
        .events
        .update_event_for_organizer(organizer, details.event.id, update_request(&details, vec![]))
        .await;
    assert!(matches!(result, Err(AppError::TicketTypeInUse(_))));

    let after = state
        .events
        .get_event_for_organizer(organizer, details.event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.ticket_types.len(), 1);
}

#[sqlx::test]
async fn events_are_scoped_to_their_organizer(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;
    let other = create_user(&pool, "other").await;
    let details = create_event_with_type(&state, organizer, Some(100)).await;

    let foreign_get = state
        .events
        .get_event_for_organizer(other, details.event.id)
        .await
        .unwrap();
    assert!(foreign_get.is_none());

    let foreign_update = state
        .events
        .update_event_for_organizer(other, details.event.id, update_request(&details, vec![]))
        .await;
    assert!(matches!(foreign_update, Err(AppError::NotFound(_))));

    // Foreign delete is a silent no-op, not an error, and removes nothing.
    state
        .events
        .delete_event_for_organizer(other, details.event.id)
        .await
        .unwrap();
    let still_there = state
        .events
        .get_event_for_organizer(organizer, details.event.id)
        .await
        .unwrap();
    assert!(still_there.is_some());
}

#[sqlx::test]
async fn delete_event_is_idempotent_but_fails_closed_on_sold_tickets(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;
    let buyer = create_user(&pool, "buyer").await;

    let sold = create_event_with_type(&state, organizer, Some(100)).await;
    state
        .tickets
        .purchase_ticket(buyer, sold.ticket_types[0].id)
        .await
        .unwrap();
    let result = state
        .events
        .delete_event_for_organizer(organizer, sold.event.id)
        .await;
    assert!(matches!(result, Err(AppError::TicketTypeInUse(_))));

    let unsold = create_event_with_type(&state, organizer, Some(100)).await;
    state
        .events
        .delete_event_for_organizer(organizer, unsold.event.id)
        .await
        .unwrap();
    // Second delete of the same event is a no-op.
    state
        .events
        .delete_event_for_organizer(organizer, unsold.event.id)
        .await
        .unwrap();
    let gone = state
        .events
        .get_event_for_organizer(organizer, unsold.event.id)
        .await
        .unwrap();
    assert!(gone.is_none());
}

#[sqlx::test]
async fn published_listing_filters_and_searches(pool: PgPool) {
    let state = state(&pool);
    let organizer = create_user(&pool, "organizer").await;

    let mut published = event_request(vec![]);
    published.name = "Jazz Evening".to_string();
    state.events.create_event(organizer, published).await.unwrap();

    let mut draft = event_request(vec![]);
    draft.name = "Secret Draft".to_string();
    draft.status = EventStatus::Draft;
    state.events.create_event(organizer, draft).await.unwrap();

    let listed = state
        .events
        .list_published_events(&Default::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].name, "Jazz Evening");

    let hits = state
        .events
        .search_published_events("jazz", &Default::default())
        .await
        .unwrap();
    assert_eq!(hits.total, 1);

    let misses = state
        .events
        .search_published_events("opera", &Default::default())
        .await
        .unwrap();
    assert_eq!(misses.total, 0);

    // Drafts are invisible through the published read path.
    let draft_events = state
        .events
        .list_events_for_organizer(organizer, &Default::default())
        .await
        .unwrap();
    assert_eq!(draft_events.total, 2);
}
