use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod cancellations;
pub mod error;
pub mod flights;
pub mod notify;
pub mod reservations;
pub mod seats;
pub mod state;
pub mod stats;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(reservations::routes())
        .merge(cancellations::routes())
        .merge(seats::routes())
        .merge(flights::routes())
        .merge(stats::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    use skyfare_core::cancellation::CancellationService;
    use skyfare_core::clock::FixedClock;
    use skyfare_core::memory::MemoryStore;
    use skyfare_core::model::{FlightInstance, SeatClass, SeatInventory};
    use skyfare_core::reservation::ReservationService;

    use crate::notify::ConsoleMailer;
    use crate::state::AppState;

    pub fn departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    /// One KE001 flight out of ICN with both cabin classes; the clock is
    /// pinned a month before departure.
    pub fn seeded_state(business_seats: i32) -> (Arc<MemoryStore>, AppState) {
        let store = Arc::new(MemoryStore::new());
        store.add_flight(FlightInstance {
            airline: "Korean Air".into(),
            flight_no: "KE001".into(),
            departure_time: departure(),
            arrival_time: departure() + Duration::hours(2),
            departure_airport: "ICN".into(),
            arrival_airport: "NRT".into(),
        });
        store.add_seat(SeatInventory {
            flight_no: "KE001".into(),
            departure_time: departure(),
            seat_class: SeatClass::Business,
            price: 300_000,
            seats_remaining: business_seats,
        });
        store.add_seat(SeatInventory {
            flight_no: "KE001".into(),
            departure_time: departure(),
            seat_class: SeatClass::Economy,
            price: 150_000,
            seats_remaining: 5,
        });

        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        ));
        let state = AppState {
            reservations: Arc::new(ReservationService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
                Arc::new(ConsoleMailer),
            )),
            cancellations: Arc::new(CancellationService::new(
                store.clone(),
                clock,
                FixedOffset::east_opt(0).unwrap(),
            )),
            ledger: store.clone(),
            flights: store.clone(),
            stats: store.clone(),
        };
        (store, state)
    }
}
