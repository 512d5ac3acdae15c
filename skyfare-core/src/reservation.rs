use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::model::{BookingKey, Reservation, SeatClass};
use crate::repository::{BookingStore, NotificationSender, SeatLedger};
use crate::{BookingError, BookingResult};

/// Input for one reservation attempt. `seat_class` arrives as free text and
/// is normalized before any lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservation {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: String,
    pub cno: String,
    pub payment: i64,
}

/// Orchestrates the booking sequence: duplicate check, inventory check,
/// persistence and the seat decrement.
pub struct ReservationService {
    store: Arc<dyn BookingStore>,
    ledger: Arc<dyn SeatLedger>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSender>,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        ledger: Arc<dyn SeatLedger>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            notifier,
        }
    }

    pub async fn create(&self, req: CreateReservation) -> BookingResult<Reservation> {
        let seat_class = SeatClass::parse(&req.seat_class)?;
        if req.flight_no.trim().is_empty() {
            return Err(BookingError::Validation("flight_no is required".into()));
        }
        if req.cno.trim().is_empty() {
            return Err(BookingError::Validation("cno is required".into()));
        }
        if req.payment < 0 {
            return Err(BookingError::Validation(
                "payment must be non-negative".into(),
            ));
        }

        let key = BookingKey {
            flight_no: req.flight_no.clone(),
            departure_time: req.departure_time,
            seat_class,
            cno: req.cno.clone(),
        };
        if self.store.find_reservation(&key).await?.is_some() {
            return Err(BookingError::AlreadyReserved);
        }
        let remaining = self.ledger.seats_remaining(&key.seat_key()).await?;
        if remaining <= 0 {
            return Err(BookingError::SeatsUnavailable);
        }

        let reservation = Reservation {
            flight_no: req.flight_no,
            departure_time: req.departure_time,
            seat_class,
            payment: req.payment,
            reserved_at: self.clock.now(),
            cno: req.cno,
        };
        // The store re-runs both checks inside one transaction; the
        // pre-checks above only classify the failure before any work starts.
        self.store.commit_reservation(&reservation).await?;
        info!(
            flight_no = %reservation.flight_no,
            cno = %reservation.cno,
            class = %reservation.seat_class,
            "reservation created"
        );

        if let Err(err) = self.notifier.reservation_confirmed(&reservation).await {
            warn!(error = %err, cno = %reservation.cno, "confirmation notice failed");
        }
        Ok(reservation)
    }

    pub async fn find(&self, key: &BookingKey) -> BookingResult<Option<Reservation>> {
        self.store.find_reservation(key).await
    }

    pub async fn for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Reservation>> {
        self.store.reservations_for_customer(cno, from, to).await
    }

    pub async fn for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<Reservation>> {
        self.store
            .reservations_for_flight(flight_no, departure_time)
            .await
    }
}
