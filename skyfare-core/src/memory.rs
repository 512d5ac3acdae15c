//! In-memory store backend.
//!
//! Backs the test suite and local development; the Postgres backend in
//! `skyfare-store` is the production path. One mutex guards the whole state,
//! so the composite commit operations are atomic with respect to each other
//! and to concurrent ledger calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{
    AirlineRevenue, AirportAirlineRevenue, BookingKey, Cancellation, FlightInstance, Reservation,
    SeatInventory, SeatKey,
};
use crate::repository::{BookingStore, FlightStore, SeatLedger, StatsStore};
use crate::{BookingError, BookingResult};

#[derive(Default)]
struct State {
    flights: HashMap<(String, DateTime<Utc>), FlightInstance>,
    seats: HashMap<SeatKey, SeatInventory>,
    reservations: HashMap<BookingKey, Reservation>,
    cancellations: HashMap<BookingKey, Cancellation>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_decrements: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_flight(&self, flight: FlightInstance) {
        self.lock()
            .flights
            .insert((flight.flight_no.clone(), flight.departure_time), flight);
    }

    pub fn add_seat(&self, seat: SeatInventory) {
        self.lock().seats.insert(seat.key(), seat);
    }

    /// Inserts a reservation without touching the ledger. Test seeding only.
    pub fn seed_reservation(&self, reservation: Reservation) {
        self.lock()
            .reservations
            .insert(reservation.key(), reservation);
    }

    /// Makes every subsequent seat decrement fail with an infrastructure
    /// error, for atomicity tests.
    pub fn fail_decrements(&self, fail: bool) {
        self.fail_decrements.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn decrement_fault(&self) -> BookingResult<()> {
        if self.fail_decrements.load(Ordering::SeqCst) {
            return Err(BookingError::Infrastructure(
                "injected decrement failure".into(),
            ));
        }
        Ok(())
    }
}

fn within(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_reservation(&self, key: &BookingKey) -> BookingResult<Option<Reservation>> {
        Ok(self.lock().reservations.get(key).cloned())
    }

    async fn reservations_for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = self
            .lock()
            .reservations
            .values()
            .filter(|r| r.cno == cno && within(r.reserved_at.date_naive(), from, to))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.departure_time.cmp(&b.departure_time));
        Ok(out)
    }

    async fn reservations_for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<Reservation>> {
        let mut out: Vec<Reservation> = self
            .lock()
            .reservations
            .values()
            .filter(|r| r.flight_no == flight_no && r.departure_time == departure_time)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.cno.cmp(&b.cno));
        Ok(out)
    }

    async fn find_cancellation(&self, key: &BookingKey) -> BookingResult<Option<Cancellation>> {
        Ok(self.lock().cancellations.get(key).cloned())
    }

    async fn cancellations_for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Cancellation>> {
        let mut out: Vec<Cancellation> = self
            .lock()
            .cancellations
            .values()
            .filter(|c| c.cno == cno && within(c.cancelled_at.date_naive(), from, to))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.cancelled_at.cmp(&a.cancelled_at));
        Ok(out)
    }

    async fn commit_reservation(&self, reservation: &Reservation) -> BookingResult<()> {
        let key = reservation.key();
        let mut state = self.lock();
        if state.reservations.contains_key(&key) {
            return Err(BookingError::AlreadyReserved);
        }
        let seat = state
            .seats
            .get_mut(&key.seat_key())
            .ok_or(BookingError::FlightOrClassNotFound)?;
        self.decrement_fault()?;
        if seat.seats_remaining < 1 {
            return Err(BookingError::SeatsUnavailable);
        }
        seat.seats_remaining -= 1;
        state.reservations.insert(key, reservation.clone());
        Ok(())
    }

    async fn commit_cancellation(&self, cancellation: &Cancellation) -> BookingResult<()> {
        let key = cancellation.key();
        let mut state = self.lock();
        if !state.reservations.contains_key(&key) {
            return Err(BookingError::ReservationNotFound);
        }
        if state.cancellations.contains_key(&key) {
            return Err(BookingError::AlreadyCancelled);
        }
        let seat = state
            .seats
            .get_mut(&key.seat_key())
            .ok_or(BookingError::FlightOrClassNotFound)?;
        seat.seats_remaining += 1;
        state.reservations.remove(&key);
        state.cancellations.insert(key, cancellation.clone());
        Ok(())
    }
}

#[async_trait]
impl SeatLedger for MemoryStore {
    async fn find_seat(&self, key: &SeatKey) -> BookingResult<Option<SeatInventory>> {
        Ok(self.lock().seats.get(key).cloned())
    }

    async fn seats_for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<SeatInventory>> {
        let mut out: Vec<SeatInventory> = self
            .lock()
            .seats
            .values()
            .filter(|s| s.flight_no == flight_no && s.departure_time == departure_time)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.seat_class.as_str());
        Ok(out)
    }

    async fn seats_remaining(&self, key: &SeatKey) -> BookingResult<i32> {
        self.lock()
            .seats
            .get(key)
            .map(|s| s.seats_remaining)
            .ok_or(BookingError::FlightOrClassNotFound)
    }

    async fn decrement_seats(&self, key: &SeatKey, count: i32) -> BookingResult<()> {
        if count <= 0 {
            return Err(BookingError::Validation("count must be positive".into()));
        }
        let mut state = self.lock();
        let seat = state
            .seats
            .get_mut(key)
            .ok_or(BookingError::FlightOrClassNotFound)?;
        self.decrement_fault()?;
        if seat.seats_remaining < count {
            return Err(BookingError::SeatsUnavailable);
        }
        seat.seats_remaining -= count;
        Ok(())
    }

    async fn increment_seats(&self, key: &SeatKey, count: i32) -> BookingResult<()> {
        if count <= 0 {
            return Err(BookingError::Validation("count must be positive".into()));
        }
        let mut state = self.lock();
        let seat = state
            .seats
            .get_mut(key)
            .ok_or(BookingError::FlightOrClassNotFound)?;
        seat.seats_remaining += count;
        Ok(())
    }
}

#[async_trait]
impl FlightStore for MemoryStore {
    async fn find_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Option<FlightInstance>> {
        Ok(self
            .lock()
            .flights
            .get(&(flight_no.to_string(), departure_time))
            .cloned())
    }

    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<FlightInstance>> {
        let mut out: Vec<FlightInstance> = self
            .lock()
            .flights
            .values()
            .filter(|f| {
                f.departure_airport.eq_ignore_ascii_case(origin)
                    && f.arrival_airport.eq_ignore_ascii_case(destination)
                    && f.departure_time.date_naive() == date
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.departure_time.cmp(&b.departure_time));
        Ok(out)
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn airline_revenue_ranking(&self) -> BookingResult<Vec<AirlineRevenue>> {
        let state = self.lock();
        let mut by_airline: HashMap<String, (i64, i64)> = HashMap::new();
        for flight in state.flights.values() {
            by_airline.entry(flight.airline.clone()).or_default();
        }
        for r in state.reservations.values() {
            if let Some(flight) = state.flights.get(&(r.flight_no.clone(), r.departure_time)) {
                let entry = by_airline.entry(flight.airline.clone()).or_default();
                entry.0 += r.payment;
                entry.1 += 1;
            }
        }
        let mut out: Vec<AirlineRevenue> = by_airline
            .into_iter()
            .map(|(airline, (total_revenue, reservation_count))| AirlineRevenue {
                airline,
                total_revenue,
                reservation_count,
            })
            .collect();
        out.sort_by(|a, b| {
            b.total_revenue
                .cmp(&a.total_revenue)
                .then_with(|| a.airline.cmp(&b.airline))
        });
        Ok(out)
    }

    async fn airport_airline_revenue_ranking(
        &self,
    ) -> BookingResult<Vec<AirportAirlineRevenue>> {
        let state = self.lock();
        let mut by_pair: HashMap<(String, String), i64> = HashMap::new();
        for flight in state.flights.values() {
            by_pair
                .entry((flight.departure_airport.clone(), flight.airline.clone()))
                .or_default();
        }
        for r in state.reservations.values() {
            if let Some(flight) = state.flights.get(&(r.flight_no.clone(), r.departure_time)) {
                *by_pair
                    .entry((flight.departure_airport.clone(), flight.airline.clone()))
                    .or_default() += r.payment;
            }
        }
        let mut rows: Vec<(String, String, i64)> = by_pair
            .into_iter()
            .map(|((airport, airline), total)| (airport, airline, total))
            .collect();
        rows.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.1.cmp(&b.1))
        });

        // Rank within each airport; equal revenues share a rank.
        let mut out: Vec<AirportAirlineRevenue> = Vec::with_capacity(rows.len());
        let mut pos = 0i64;
        let mut rank = 0i64;
        let mut prev: Option<(String, i64)> = None;
        for (airport, airline, total) in rows {
            match &prev {
                Some((prev_airport, prev_total)) if *prev_airport == airport => {
                    pos += 1;
                    if *prev_total != total {
                        rank = pos;
                    }
                }
                _ => {
                    pos = 1;
                    rank = 1;
                }
            }
            prev = Some((airport.clone(), total));
            out.push(AirportAirlineRevenue {
                departure_airport: airport,
                airline,
                total_revenue: total,
                revenue_rank: rank,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SeatClass;
    use chrono::TimeZone;

    fn departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    fn seat(flight_no: &str, class: SeatClass, remaining: i32) -> SeatInventory {
        SeatInventory {
            flight_no: flight_no.into(),
            departure_time: departure(),
            seat_class: class,
            price: 100_000,
            seats_remaining: remaining,
        }
    }

    fn flight(flight_no: &str, airline: &str, origin: &str) -> FlightInstance {
        FlightInstance {
            airline: airline.into(),
            flight_no: flight_no.into(),
            departure_time: departure(),
            arrival_time: departure() + chrono::Duration::hours(2),
            departure_airport: origin.into(),
            arrival_airport: "NRT".into(),
        }
    }

    fn reservation(flight_no: &str, cno: &str, payment: i64) -> Reservation {
        Reservation {
            flight_no: flight_no.into(),
            departure_time: departure(),
            seat_class: SeatClass::Economy,
            payment,
            reserved_at: departure() - chrono::Duration::days(10),
            cno: cno.into(),
        }
    }

    #[tokio::test]
    async fn ledger_lifecycle() {
        let store = MemoryStore::new();
        store.add_seat(seat("KE001", SeatClass::Economy, 10));
        let key = seat("KE001", SeatClass::Economy, 10).key();

        assert_eq!(store.seats_remaining(&key).await.unwrap(), 10);
        store.decrement_seats(&key, 4).await.unwrap();
        assert_eq!(store.seats_remaining(&key).await.unwrap(), 6);
        store.increment_seats(&key, 2).await.unwrap();
        assert_eq!(store.seats_remaining(&key).await.unwrap(), 8);

        let err = store.decrement_seats(&key, 9).await.unwrap_err();
        assert!(matches!(err, BookingError::SeatsUnavailable));
        // The failed decrement mutated nothing.
        assert_eq!(store.seats_remaining(&key).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn ledger_rejects_non_positive_counts() {
        let store = MemoryStore::new();
        store.add_seat(seat("KE001", SeatClass::Economy, 10));
        let key = seat("KE001", SeatClass::Economy, 10).key();

        assert!(matches!(
            store.decrement_seats(&key, 0).await.unwrap_err(),
            BookingError::Validation(_)
        ));
        assert!(matches!(
            store.increment_seats(&key, -1).await.unwrap_err(),
            BookingError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn ledger_unknown_key() {
        let store = MemoryStore::new();
        let key = seat("XX999", SeatClass::Business, 0).key();
        assert!(matches!(
            store.seats_remaining(&key).await.unwrap_err(),
            BookingError::FlightOrClassNotFound
        ));
    }

    #[tokio::test]
    async fn airline_revenue_is_summed_and_ordered() {
        let store = MemoryStore::new();
        store.add_flight(flight("KE001", "Korean Air", "ICN"));
        store.add_flight(flight("OZ100", "Asiana", "ICN"));
        store.seed_reservation(reservation("KE001", "c1", 200_000));
        store.seed_reservation(reservation("KE001", "c2", 100_000));
        store.seed_reservation(reservation("OZ100", "c3", 400_000));

        let ranking = store.airline_revenue_ranking().await.unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].airline, "Asiana");
        assert_eq!(ranking[0].total_revenue, 400_000);
        assert_eq!(ranking[0].reservation_count, 1);
        assert_eq!(ranking[1].airline, "Korean Air");
        assert_eq!(ranking[1].total_revenue, 300_000);
        assert_eq!(ranking[1].reservation_count, 2);
    }

    #[tokio::test]
    async fn airport_ranking_restarts_per_airport() {
        let store = MemoryStore::new();
        store.add_flight(flight("KE001", "Korean Air", "ICN"));
        store.add_flight(flight("OZ100", "Asiana", "ICN"));
        store.add_flight(flight("KE051", "Korean Air", "GMP"));
        store.seed_reservation(reservation("KE001", "c1", 100_000));
        store.seed_reservation(reservation("OZ100", "c2", 300_000));
        store.seed_reservation(reservation("KE051", "c3", 50_000));

        let ranking = store.airport_airline_revenue_ranking().await.unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(
            (ranking[0].departure_airport.as_str(), ranking[0].revenue_rank),
            ("GMP", 1)
        );
        assert_eq!(
            (ranking[1].airline.as_str(), ranking[1].revenue_rank),
            ("Asiana", 1)
        );
        assert_eq!(
            (ranking[2].airline.as_str(), ranking[2].revenue_rank),
            ("Korean Air", 2)
        );
    }

    #[tokio::test]
    async fn flight_search_filters_by_route_and_day() {
        let store = MemoryStore::new();
        store.add_flight(flight("KE001", "Korean Air", "ICN"));
        store.add_flight(flight("KE051", "Korean Air", "GMP"));

        let found = store
            .search_flights("icn", "nrt", departure().date_naive())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].flight_no, "KE001");

        let none = store
            .search_flights("ICN", "NRT", departure().date_naive() + chrono::Duration::days(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
