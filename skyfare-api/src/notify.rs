//! Console notification sender.
//!
//! Logs the confirmation instead of mailing it; stands in for the mail
//! gateway in development. The workflow treats any sender as best effort.

use async_trait::async_trait;
use tracing::info;

use skyfare_core::model::Reservation;
use skyfare_core::repository::NotificationSender;
use skyfare_core::BookingResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl NotificationSender for ConsoleMailer {
    async fn reservation_confirmed(&self, reservation: &Reservation) -> BookingResult<()> {
        info!(
            cno = %reservation.cno,
            flight_no = %reservation.flight_no,
            departure = %reservation.departure_time,
            class = %reservation.seat_class,
            payment = reservation.payment,
            "reservation confirmation notice"
        );
        Ok(())
    }
}
