use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use skyfare_core::cancellation::{CancelReservation, CancellationService};
use skyfare_core::clock::FixedClock;
use skyfare_core::memory::MemoryStore;
use skyfare_core::model::{Reservation, SeatClass, SeatInventory, SeatKey};
use skyfare_core::repository::{NotificationSender, SeatLedger};
use skyfare_core::reservation::{CreateReservation, ReservationService};
use skyfare_core::{BookingError, BookingResult};

struct Quiet;

#[async_trait]
impl NotificationSender for Quiet {
    async fn reservation_confirmed(&self, _: &Reservation) -> BookingResult<()> {
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
}

fn departure() -> DateTime<Utc> {
    now() + Duration::days(20)
}

fn seat_key() -> SeatKey {
    SeatKey {
        flight_no: "KE001".into(),
        departure_time: departure(),
        seat_class: SeatClass::Economy,
    }
}

fn seeded_store(seats: i32) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_seat(SeatInventory {
        flight_no: "KE001".into(),
        departure_time: departure(),
        seat_class: SeatClass::Economy,
        price: 300_000,
        seats_remaining: seats,
    });
    store
}

fn reservation_service(store: Arc<MemoryStore>) -> ReservationService {
    ReservationService::new(
        store.clone(),
        store,
        Arc::new(FixedClock(now())),
        Arc::new(Quiet),
    )
}

fn cancellation_service(store: Arc<MemoryStore>) -> CancellationService {
    let utc = FixedOffset::east_opt(0).unwrap();
    CancellationService::new(store, Arc::new(FixedClock(now())), utc)
}

fn create_request(cno: &str) -> CreateReservation {
    CreateReservation {
        flight_no: "KE001".into(),
        departure_time: departure(),
        seat_class: "Economy".into(),
        cno: cno.into(),
        payment: 300_000,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_bookings_never_oversell() {
    let store = seeded_store(3);
    let svc = Arc::new(reservation_service(store.clone()));

    let mut handles = Vec::new();
    for i in 0..10 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.create(create_request(&format!("c{i}"))).await
        }));
    }

    let mut succeeded = 0;
    let mut unavailable = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(BookingError::SeatsUnavailable) => unavailable += 1,
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(unavailable, 7);
    assert_eq!(store.seats_remaining(&seat_key()).await.unwrap(), 0);
}

#[tokio::test]
async fn reserve_then_cancel_restores_inventory() {
    let store = seeded_store(5);
    let reservations = reservation_service(store.clone());
    let cancellations = cancellation_service(store.clone());

    reservations.create(create_request("c1")).await.unwrap();
    assert_eq!(store.seats_remaining(&seat_key()).await.unwrap(), 4);

    let cancellation = cancellations
        .cancel(CancelReservation {
            flight_no: "KE001".into(),
            departure_time: departure(),
            seat_class: "economy".into(),
            cno: "c1".into(),
        })
        .await
        .unwrap();
    assert_eq!(cancellation.refund, 150_000);
    assert_eq!(store.seats_remaining(&seat_key()).await.unwrap(), 5);

    // The key is free again for a fresh reservation.
    reservations.create(create_request("c1")).await.unwrap();
    assert_eq!(store.seats_remaining(&seat_key()).await.unwrap(), 4);
}

#[tokio::test]
async fn mixed_casing_maps_to_one_inventory_row() {
    let store = seeded_store(5);
    let svc = reservation_service(store.clone());

    for (i, spelling) in ["business", "Business", "BUSINESS"].iter().enumerate() {
        let mut req = create_request(&format!("c{i}"));
        req.seat_class = (*spelling).into();
        // No Business inventory exists, so every spelling resolves to the
        // same missing row.
        let err = svc.create(req).await.unwrap_err();
        assert!(matches!(err, BookingError::FlightOrClassNotFound));
    }

    for spelling in ["economy", "ECONOMY", "Economy"] {
        let mut req = create_request("same-customer");
        req.seat_class = spelling.into();
        let result = svc.create(req).await;
        if spelling == "economy" {
            result.unwrap();
        } else {
            assert!(matches!(result.unwrap_err(), BookingError::AlreadyReserved));
        }
    }
    assert_eq!(store.seats_remaining(&seat_key()).await.unwrap(), 4);
}
