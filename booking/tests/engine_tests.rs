//! Booking engine behaviour against the in-memory store.
//!
//! The clock is pinned to 2025-06-10 (token `10.06.25`).

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages
#![allow(clippy::unwrap_used)]

use deskbook::{BookingEngine, BookingError, BookingPolicy, BookingRequest, ContactHandlePolicy, OwnBooking};
use deskbook_core::date::DateError;
use deskbook_core::store::StoreError;
use deskbook_core::{Identity, SeatCatalog, SeatPolicy};
use deskbook_testing::{FixedClock, InMemoryReservationStore, SequentialIdentityGenerator, day, seat, test_clock};
use std::sync::Arc;

type Engine = BookingEngine<InMemoryReservationStore, FixedClock, SequentialIdentityGenerator>;

fn engine_with(catalog: &[&str], policy: BookingPolicy) -> (Engine, InMemoryReservationStore) {
    let store = InMemoryReservationStore::new();
    let engine = BookingEngine::new(
        store.clone(),
        test_clock(),
        SequentialIdentityGenerator::new(),
        SeatCatalog::new(catalog),
        policy,
    );
    (engine, store)
}

fn engine() -> (Engine, InMemoryReservationStore) {
    engine_with(&["A1", "A2", "B1"], BookingPolicy::default())
}

fn ivan() -> Identity {
    Identity::from(210_993)
}

fn anna() -> Identity {
    Identity::from(42)
}

fn book(actor: Identity, date: &str, seat: &str) -> BookingRequest {
    BookingRequest::new(actor, date, seat, "@someone")
}

#[tokio::test]
async fn test_books_a_free_seat() {
    let (engine, store) = engine();

    let confirmation = engine
        .create_booking(book(ivan(), "12.06.25", "a1").with_actor_names("ivan", "Ivan"))
        .await
        .expect("booking should succeed");

    assert_eq!(confirmation.date, day(2025, 6, 12));
    assert_eq!(confirmation.seat, seat("A1"));
    assert_eq!(confirmation.holder, ivan());
    assert!(!confirmation.is_proxy);
    assert_eq!(confirmation.week_number, 24);

    let stored = store.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].holder_display_name, "Ivan");
    assert_eq!(stored[0].holder_username, "ivan");
    assert_eq!(stored[0].contact_handle, "@someone");
}

#[tokio::test]
async fn test_second_booking_of_same_seat_and_date_is_seat_taken() {
    let (engine, store) = engine();
    engine.create_booking(book(ivan(), "12.06.25", "A1")).await.unwrap();

    let second = engine.create_booking(book(anna(), "12.06.25", "a1")).await;

    assert_eq!(
        second,
        Err(BookingError::SeatTaken {
            date: day(2025, 6, 12),
            seat: seat("A1"),
        })
    );
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_one_seat_per_person_per_date() {
    let (engine, _store) = engine();
    engine.create_booking(book(ivan(), "12.06.25", "A1")).await.unwrap();

    let other_seat = engine.create_booking(book(ivan(), "12.06.25", "A2")).await;
    assert_eq!(
        other_seat,
        Err(BookingError::DuplicateBookingForDate {
            date: day(2025, 6, 12),
            existing_seat: seat("A1"),
        })
    );

    // Another date is fine.
    engine.create_booking(book(ivan(), "13.06.25", "A2")).await.unwrap();
}

#[tokio::test]
async fn test_past_dates_are_rejected_and_today_is_accepted() {
    let (engine, store) = engine();

    let yesterday = engine.create_booking(book(ivan(), "09.06.25", "A1")).await;
    assert_eq!(yesterday, Err(BookingError::Date(DateError::PastDate)));

    engine.create_booking(book(ivan(), "10.06.25", "A1")).await.expect("today is bookable");

    let cancel_yesterday = engine.cancel_booking(&ivan(), "09.06.25", "A1").await;
    assert_eq!(cancel_yesterday, Err(BookingError::Date(DateError::PastDate)));

    engine.cancel_booking(&ivan(), "10.06.25", "A1").await.expect("today is cancellable");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_bad_date_tokens() {
    let (engine, store) = engine();

    assert_eq!(
        engine.create_booking(book(ivan(), "31.13.99", "A1")).await,
        Err(BookingError::Date(DateError::InvalidCalendarDate))
    );
    assert_eq!(
        engine.create_booking(book(ivan(), "1-2-03", "A1")).await,
        Err(BookingError::Date(DateError::MalformedDate))
    );
    assert_eq!(
        engine.create_booking(book(ivan(), "31.02.26", "A1")).await,
        Err(BookingError::Date(DateError::InvalidCalendarDate))
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_contact_handle_policy() {
    let (strict, _) = engine();
    assert_eq!(
        strict.create_booking(BookingRequest::new(ivan(), "12.06.25", "A1", "ivan")).await,
        Err(BookingError::InvalidContactHandle {
            handle: "ivan".to_string()
        })
    );

    let (relaxed, store) = engine_with(
        &["A1"],
        BookingPolicy {
            contact_handles: ContactHandlePolicy::Optional,
            ..BookingPolicy::default()
        },
    );
    relaxed
        .create_booking(BookingRequest::new(ivan(), "12.06.25", "A1", ""))
        .await
        .expect("handle is optional");
    assert_eq!(store.all()[0].contact_handle, "");
}

#[tokio::test]
async fn test_seat_policy() {
    let (open, _) = engine();
    let confirmation = open
        .create_booking(book(ivan(), "12.06.25", "z9"))
        .await
        .expect("unrestricted policy accepts unknown seats");
    assert_eq!(confirmation.seat, seat("Z9"));

    let (strict, store) = engine_with(
        &["A1"],
        BookingPolicy {
            seats: SeatPolicy::CatalogOnly,
            ..BookingPolicy::default()
        },
    );
    assert_eq!(
        strict.create_booking(book(ivan(), "12.06.25", "z9")).await,
        Err(BookingError::UnknownSeat {
            seat: "Z9".to_string()
        })
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_own_bookings_round_trip() {
    let (engine, _store) = engine();
    engine.create_booking(book(ivan(), "20.06.25", "B1")).await.unwrap();
    engine.create_booking(book(ivan(), "12.06.25", "A1")).await.unwrap();
    engine.create_booking(book(anna(), "12.06.25", "A2")).await.unwrap();

    let mine = engine.list_own_bookings(&ivan()).await.unwrap();
    assert_eq!(
        mine,
        [
            OwnBooking {
                date: day(2025, 6, 12),
                seat: seat("A1"),
            },
            OwnBooking {
                date: day(2025, 6, 20),
                seat: seat("B1"),
            },
        ]
    );

    engine.cancel_booking(&ivan(), "12.06.25", "a1").await.unwrap();
    let mine = engine.list_own_bookings(&ivan()).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].seat, seat("B1"));
}

#[tokio::test]
async fn test_cancel_missing_booking_leaves_store_unchanged() {
    let (engine, store) = engine();
    engine.create_booking(book(anna(), "12.06.25", "A1")).await.unwrap();
    let before = store.all();

    // Anna's booking is not Ivan's to cancel.
    let result = engine.cancel_booking(&ivan(), "12.06.25", "A1").await;
    assert_eq!(
        result,
        Err(BookingError::NoSuchBooking {
            date: day(2025, 6, 12),
            seat: seat("A1"),
        })
    );
    assert_eq!(store.all(), before);
}

#[tokio::test]
async fn test_proxy_booking_gets_fresh_surrogate_identity() {
    let (engine, store) = engine();

    let first = engine
        .create_booking(
            BookingRequest::new(ivan(), "12.06.25", "A2", "@anna").on_behalf_of("Anna"),
        )
        .await
        .unwrap();
    let second = engine
        .create_booking(BookingRequest::new(anna(), "12.06.25", "B1", "@petr").on_behalf_of("Petr"))
        .await
        .unwrap();

    assert!(first.is_proxy);
    assert_eq!(first.holder, Identity::new("guest-1"));
    assert_eq!(second.holder, Identity::new("guest-2"));

    let stored = store.all();
    assert_eq!(stored[0].holder_display_name, "Anna");
    assert_eq!(stored[0].contact_handle, "@anna");
    assert!(stored[0].is_proxy);

    // The actor's own identity was not used, so they can still book that day.
    engine.create_booking(book(ivan(), "12.06.25", "A1")).await.unwrap();
}

#[tokio::test]
async fn test_proxy_booking_is_blocked_when_actor_already_booked_that_date() {
    let (engine, store) = engine();
    engine.create_booking(book(ivan(), "12.06.25", "A1")).await.unwrap();

    let proxy = engine
        .create_booking(BookingRequest::new(ivan(), "12.06.25", "A2", "@anna").on_behalf_of("Anna"))
        .await;

    assert!(matches!(proxy, Err(BookingError::DuplicateBookingForDate { .. })));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_proxy_bookings_need_the_administrative_cancel() {
    let (engine, store) = engine();
    engine
        .create_booking(BookingRequest::new(ivan(), "12.06.25", "A2", "@anna").on_behalf_of("Anna"))
        .await
        .unwrap();

    let own_path = engine.cancel_booking(&ivan(), "12.06.25", "A2").await;
    assert!(matches!(own_path, Err(BookingError::NoSuchBooking { .. })));

    let cancelled = engine.cancel_any_booking("12.06.25", "a2").await.unwrap();
    assert!(cancelled.was_proxy);
    assert_eq!(cancelled.holder, Identity::new("guest-1"));
    assert!(store.is_empty());

    let again = engine.cancel_any_booking("12.06.25", "A2").await;
    assert!(matches!(again, Err(BookingError::NoSuchBooking { .. })));
}

#[tokio::test]
async fn test_bookings_on_date_allows_past_dates() {
    let (engine, store) = engine();
    engine.create_booking(book(ivan(), "12.06.25", "A2")).await.unwrap();
    engine
        .create_booking(BookingRequest::new(anna(), "12.06.25", "A1", "@anna").with_actor_names("anna", "Anna"))
        .await
        .unwrap();

    let occupancy = engine.list_bookings_on_date("12.06.25").await.unwrap();
    let seats: Vec<_> = occupancy.iter().map(|o| (o.seat.as_str(), o.contact_handle.as_str())).collect();
    assert_eq!(seats, [("A1", "@anna"), ("A2", "@someone")]);

    assert!(store.len() == 2);
    assert_eq!(engine.list_bookings_on_date("01.01.24").await, Ok(Vec::new()));
    assert_eq!(
        engine.list_bookings_on_date("2025-06-12").await,
        Err(BookingError::Date(DateError::MalformedDate))
    );
}

#[tokio::test]
async fn test_empty_store_is_free_today() {
    let (engine, _store) = engine();

    let availability = engine
        .find_nearest_availability(day(2025, 6, 10), 30)
        .await
        .unwrap()
        .expect("everything is free");

    assert_eq!(availability.date, day(2025, 6, 10));
    assert_eq!(availability.free_seats, [seat("A1"), seat("A2"), seat("B1")]);
}

#[tokio::test]
async fn test_nearest_availability_skips_full_dates() {
    let (engine, _store) = engine_with(&["A1", "A2"], BookingPolicy::default());
    engine.create_booking(book(ivan(), "10.06.25", "A1")).await.unwrap();
    engine.create_booking(book(anna(), "10.06.25", "A2")).await.unwrap();

    let availability = engine.nearest_availability().await.unwrap().expect("tomorrow is free");

    assert_eq!(availability.date, day(2025, 6, 11));
    assert_eq!(availability.free_seats, [seat("A1"), seat("A2")]);
}

#[tokio::test]
async fn test_free_seats_follow_catalog_order_and_ignore_unknown_seats() {
    let (engine, _store) = engine_with(&["B2", "A1", "C3"], BookingPolicy::default());
    engine.create_booking(book(ivan(), "10.06.25", "A1")).await.unwrap();
    engine.create_booking(book(anna(), "10.06.25", "Z9")).await.unwrap();

    let availability = engine.nearest_availability().await.unwrap().unwrap();
    assert_eq!(availability.date, day(2025, 6, 10));
    assert_eq!(availability.free_seats, [seat("B2"), seat("C3")]);
}

#[tokio::test]
async fn test_exhausted_horizon_is_none() {
    let (engine, _store) = engine_with(
        &["A1"],
        BookingPolicy {
            horizon_days: 3,
            ..BookingPolicy::default()
        },
    );
    for (n, token) in ["10.06.25", "11.06.25", "12.06.25"].into_iter().enumerate() {
        let actor = Identity::from(i64::try_from(n).unwrap());
        engine.create_booking(book(actor, token, "A1")).await.unwrap();
    }

    assert_eq!(engine.nearest_availability().await, Ok(None));

    // One more day of horizon reaches the first free date.
    let found = engine.find_nearest_availability(day(2025, 6, 10), 4).await.unwrap();
    assert_eq!(found.map(|a| a.date), Some(day(2025, 6, 13)));
}

#[tokio::test]
async fn test_empty_catalog_never_has_availability() {
    let (engine, _store) = engine_with(&[], BookingPolicy::default());
    assert_eq!(engine.nearest_availability().await, Ok(None));
}

#[tokio::test]
async fn test_lost_insert_race_surfaces_as_seat_taken() {
    let (engine, store) = engine();
    store.fail_next_insert(StoreError::Conflict {
        date: day(2025, 6, 12),
        seat: seat("A1"),
    });

    let result = engine.create_booking(book(ivan(), "12.06.25", "A1")).await;

    assert_eq!(
        result,
        Err(BookingError::SeatTaken {
            date: day(2025, 6, 12),
            seat: seat("A1"),
        })
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_reported_not_fatal() {
    let (engine, store) = engine();
    store.fail_next_insert(StoreError::Database("disk I/O error".to_string()));

    let failed = engine.create_booking(book(ivan(), "12.06.25", "A1")).await;
    assert!(matches!(failed, Err(BookingError::Storage(_))));

    // The engine keeps working afterwards.
    engine.create_booking(book(ivan(), "12.06.25", "A1")).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_for_one_seat() {
    let (engine, store) = engine();
    let engine = Arc::new(engine);

    let attempts = (0..25_i64).map(|i| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .create_booking(book(Identity::from(i), "12.06.25", "A1"))
                .await
        })
    });
    let results = futures::future::join_all(attempts).await;

    let booked = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    let taken = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(BookingError::SeatTaken { .. }))))
        .count();
    assert_eq!(booked, 1);
    assert_eq!(taken, 24);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_by_one_person_for_one_date() {
    let (engine, store) = engine();
    let engine = Arc::new(engine);

    let attempts = ["A1", "A2", "B1"].into_iter().map(|place| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.create_booking(book(ivan(), "12.06.25", place)).await })
    });
    let results = futures::future::join_all(attempts).await;

    let booked = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    assert_eq!(booked, 1);
    assert_eq!(store.len(), 1);
}
