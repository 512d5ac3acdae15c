use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{
    AirlineRevenue, AirportAirlineRevenue, BookingKey, Cancellation, FlightInstance, Reservation,
    SeatInventory, SeatKey,
};
use crate::BookingResult;

/// Persistence for reservations and cancellations.
///
/// `commit_reservation` and `commit_cancellation` are single units of work:
/// implementations must re-run every check and apply every mutation inside
/// one transaction, so a failure anywhere leaves no partial state behind.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_reservation(&self, key: &BookingKey) -> BookingResult<Option<Reservation>>;

    async fn reservations_for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Reservation>>;

    async fn reservations_for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<Reservation>>;

    async fn find_cancellation(&self, key: &BookingKey) -> BookingResult<Option<Cancellation>>;

    async fn cancellations_for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Cancellation>>;

    /// Re-checks for a duplicate, verifies a seat remains, inserts the
    /// reservation and decrements the seat row, atomically.
    async fn commit_reservation(&self, reservation: &Reservation) -> BookingResult<()>;

    /// Re-checks the reservation and the cancellation record, inserts the
    /// cancellation, deletes the reservation and restores the seat,
    /// atomically.
    async fn commit_cancellation(&self, cancellation: &Cancellation) -> BookingResult<()>;
}

/// Remaining-seat ledger, one row per (flight, departure, class).
#[async_trait]
pub trait SeatLedger: Send + Sync {
    async fn find_seat(&self, key: &SeatKey) -> BookingResult<Option<SeatInventory>>;

    async fn seats_for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<SeatInventory>>;

    /// Fails with `FlightOrClassNotFound` when no row matches the key.
    async fn seats_remaining(&self, key: &SeatKey) -> BookingResult<i32>;

    /// Conditional decrement: applies only when at least `count` seats
    /// remain, otherwise fails with `SeatsUnavailable` and mutates nothing.
    async fn decrement_seats(&self, key: &SeatKey, count: i32) -> BookingResult<()>;

    /// Restores seats on cancellation. No upper bound is enforced; total
    /// capacity is not tracked separately.
    async fn increment_seats(&self, key: &SeatKey, count: i32) -> BookingResult<()>;
}

/// Read-only flight schedule lookups.
#[async_trait]
pub trait FlightStore: Send + Sync {
    async fn find_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Option<FlightInstance>>;

    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<FlightInstance>>;
}

/// Revenue aggregates for the admin statistics endpoints.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn airline_revenue_ranking(&self) -> BookingResult<Vec<AirlineRevenue>>;

    async fn airport_airline_revenue_ranking(&self)
        -> BookingResult<Vec<AirportAirlineRevenue>>;
}

/// Post-reservation notification. Best effort: the caller logs a failure and
/// never rolls back the reservation because of one.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn reservation_confirmed(&self, reservation: &Reservation) -> BookingResult<()>;
}
