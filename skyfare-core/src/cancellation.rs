use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::clock::Clock;
use crate::model::{BookingKey, Cancellation, SeatClass};
use crate::penalty;
use crate::repository::BookingStore;
use crate::{BookingError, BookingResult};

/// Input for one cancellation attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelReservation {
    pub flight_no: String,
    pub departure_time: DateTime<Utc>,
    pub seat_class: String,
    pub cno: String,
}

/// Orchestrates the cancellation sequence: existence check, penalty
/// computation, audit record, reservation removal and seat restoration.
pub struct CancellationService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    reference_tz: FixedOffset,
}

impl CancellationService {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, reference_tz: FixedOffset) -> Self {
        Self {
            store,
            clock,
            reference_tz,
        }
    }

    pub async fn cancel(&self, req: CancelReservation) -> BookingResult<Cancellation> {
        let seat_class = SeatClass::parse(&req.seat_class)?;
        let key = BookingKey {
            flight_no: req.flight_no,
            departure_time: req.departure_time,
            seat_class,
            cno: req.cno,
        };

        let reservation = self
            .store
            .find_reservation(&key)
            .await?
            .ok_or(BookingError::ReservationNotFound)?;
        if self.store.find_cancellation(&key).await?.is_some() {
            return Err(BookingError::AlreadyCancelled);
        }

        let now = self.clock.now();
        let days = penalty::days_until_departure(now, key.departure_time, self.reference_tz);
        let refund = penalty::refund_for(reservation.payment, days);

        let cancellation = Cancellation {
            flight_no: key.flight_no.clone(),
            departure_time: key.departure_time,
            seat_class,
            refund,
            cancelled_at: now,
            cno: key.cno.clone(),
        };
        self.store.commit_cancellation(&cancellation).await?;
        info!(
            flight_no = %cancellation.flight_no,
            cno = %cancellation.cno,
            refund = cancellation.refund,
            "reservation cancelled"
        );
        Ok(cancellation)
    }

    pub async fn find(&self, key: &BookingKey) -> BookingResult<Option<Cancellation>> {
        self.store.find_cancellation(key).await
    }

    pub async fn for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Cancellation>> {
        self.store.cancellations_for_customer(cno, from, to).await
    }
}
