use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use skyfare_core::model::{
    BookingKey, Cancellation, Reservation, SeatClass, SeatInventory, SeatKey,
};
use skyfare_core::repository::{BookingStore, SeatLedger};
use skyfare_core::{BookingError, BookingResult};

use crate::infra;

/// Postgres backend for reservations, cancellations and the seat ledger.
///
/// The composite commit operations run inside one transaction each; the seat
/// mutation is always a conditional `UPDATE` whose affected-row count is
/// checked, never a read-then-write at the application layer.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    flight_no: String,
    departure_time: DateTime<Utc>,
    seat_class: String,
    payment: i64,
    reserved_at: DateTime<Utc>,
    cno: String,
}

impl ReservationRow {
    fn into_domain(self) -> BookingResult<Reservation> {
        Ok(Reservation {
            seat_class: parse_stored_class(&self.seat_class)?,
            flight_no: self.flight_no,
            departure_time: self.departure_time,
            payment: self.payment,
            reserved_at: self.reserved_at,
            cno: self.cno,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CancellationRow {
    flight_no: String,
    departure_time: DateTime<Utc>,
    seat_class: String,
    refund: i64,
    cancelled_at: DateTime<Utc>,
    cno: String,
}

impl CancellationRow {
    fn into_domain(self) -> BookingResult<Cancellation> {
        Ok(Cancellation {
            seat_class: parse_stored_class(&self.seat_class)?,
            flight_no: self.flight_no,
            departure_time: self.departure_time,
            refund: self.refund,
            cancelled_at: self.cancelled_at,
            cno: self.cno,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    flight_no: String,
    departure_time: DateTime<Utc>,
    seat_class: String,
    price: i64,
    no_of_seats: i32,
}

impl SeatRow {
    fn into_domain(self) -> BookingResult<SeatInventory> {
        Ok(SeatInventory {
            seat_class: parse_stored_class(&self.seat_class)?,
            flight_no: self.flight_no,
            departure_time: self.departure_time,
            price: self.price,
            seats_remaining: self.no_of_seats,
        })
    }
}

/// Stored rows predate the enum and may carry any casing; a value outside
/// the two classes is corrupt data, not bad input.
fn parse_stored_class(raw: &str) -> BookingResult<SeatClass> {
    SeatClass::parse(raw)
        .map_err(|_| BookingError::Infrastructure(format!("invalid stored seat class: {raw}")))
}

fn reserve_conflict(err: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return BookingError::AlreadyReserved;
        }
    }
    infra(err)
}

fn cancel_conflict(err: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return BookingError::AlreadyCancelled;
        }
    }
    infra(err)
}

const RESERVATION_COLUMNS: &str =
    "flight_no, departure_time, seat_class, payment, reserved_at, cno";
const CANCELLATION_COLUMNS: &str =
    "flight_no, departure_time, seat_class, refund, cancelled_at, cno";
const SEAT_COLUMNS: &str = "flight_no, departure_time, seat_class, price, no_of_seats";

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_reservation(&self, key: &BookingKey) -> BookingResult<Option<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reserve \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND cno = $4"
        );
        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(&key.flight_no)
            .bind(key.departure_time)
            .bind(key.seat_class.as_str())
            .bind(&key.cno)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        row.map(ReservationRow::into_domain).transpose()
    }

    async fn reservations_for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Reservation>> {
        let mut sql = format!("SELECT {RESERVATION_COLUMNS} FROM reserve WHERE cno = $1");
        let mut idx = 2;
        if from.is_some() {
            sql.push_str(&format!(" AND reserved_at::date >= ${idx}"));
            idx += 1;
        }
        if to.is_some() {
            sql.push_str(&format!(" AND reserved_at::date <= ${idx}"));
        }
        sql.push_str(" ORDER BY departure_time ASC");

        let mut query = sqlx::query_as::<_, ReservationRow>(&sql).bind(cno);
        if let Some(from) = from {
            query = query.bind(from);
        }
        if let Some(to) = to {
            query = query.bind(to);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(infra)?;
        rows.into_iter().map(ReservationRow::into_domain).collect()
    }

    async fn reservations_for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reserve \
             WHERE flight_no = $1 AND departure_time = $2 ORDER BY cno"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(flight_no)
            .bind(departure_time)
            .fetch_all(&self.pool)
            .await
            .map_err(infra)?;
        rows.into_iter().map(ReservationRow::into_domain).collect()
    }

    async fn find_cancellation(&self, key: &BookingKey) -> BookingResult<Option<Cancellation>> {
        let sql = format!(
            "SELECT {CANCELLATION_COLUMNS} FROM cancel \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND cno = $4"
        );
        let row = sqlx::query_as::<_, CancellationRow>(&sql)
            .bind(&key.flight_no)
            .bind(key.departure_time)
            .bind(key.seat_class.as_str())
            .bind(&key.cno)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        row.map(CancellationRow::into_domain).transpose()
    }

    async fn cancellations_for_customer(
        &self,
        cno: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BookingResult<Vec<Cancellation>> {
        let mut sql = format!("SELECT {CANCELLATION_COLUMNS} FROM cancel WHERE cno = $1");
        let mut idx = 2;
        if from.is_some() {
            sql.push_str(&format!(" AND cancelled_at::date >= ${idx}"));
            idx += 1;
        }
        if to.is_some() {
            sql.push_str(&format!(" AND cancelled_at::date <= ${idx}"));
        }
        sql.push_str(" ORDER BY cancelled_at DESC");

        let mut query = sqlx::query_as::<_, CancellationRow>(&sql).bind(cno);
        if let Some(from) = from {
            query = query.bind(from);
        }
        if let Some(to) = to {
            query = query.bind(to);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(infra)?;
        rows.into_iter().map(CancellationRow::into_domain).collect()
    }

    async fn commit_reservation(&self, reservation: &Reservation) -> BookingResult<()> {
        let key = reservation.key();
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let duplicates = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM reserve \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND cno = $4",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .bind(&key.cno)
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;
        if duplicates > 0 {
            return Err(BookingError::AlreadyReserved);
        }

        sqlx::query(
            "INSERT INTO reserve (flight_no, departure_time, seat_class, payment, reserved_at, cno) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&reservation.flight_no)
        .bind(reservation.departure_time)
        .bind(reservation.seat_class.as_str())
        .bind(reservation.payment)
        .bind(reservation.reserved_at)
        .bind(&reservation.cno)
        .execute(&mut *tx)
        .await
        .map_err(reserve_conflict)?;

        // Conditional decrement closes the oversell race: the row count tells
        // us whether a seat was actually taken.
        let updated = sqlx::query(
            "UPDATE seats SET no_of_seats = no_of_seats - 1 \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND no_of_seats >= 1",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls the insert back; classify the
            // miss as an exhausted row or a missing one.
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT count(*) FROM seats \
                 WHERE flight_no = $1 AND departure_time = $2 \
                   AND upper(seat_class) = upper($3)",
            )
            .bind(&key.flight_no)
            .bind(key.departure_time)
            .bind(key.seat_class.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(infra)?;
            return Err(if exists > 0 {
                BookingError::SeatsUnavailable
            } else {
                BookingError::FlightOrClassNotFound
            });
        }

        tx.commit().await.map_err(infra)?;
        Ok(())
    }

    async fn commit_cancellation(&self, cancellation: &Cancellation) -> BookingResult<()> {
        let key = cancellation.key();
        let mut tx = self.pool.begin().await.map_err(infra)?;

        // Lock the reservation row for the whole unit of work.
        let held = sqlx::query_scalar::<_, String>(
            "SELECT cno FROM reserve \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND cno = $4 \
             FOR UPDATE",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .bind(&key.cno)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infra)?;
        if held.is_none() {
            return Err(BookingError::ReservationNotFound);
        }

        let cancelled = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM cancel \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND cno = $4",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .bind(&key.cno)
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;
        if cancelled > 0 {
            return Err(BookingError::AlreadyCancelled);
        }

        sqlx::query(
            "INSERT INTO cancel (flight_no, departure_time, seat_class, refund, cancelled_at, cno) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&cancellation.flight_no)
        .bind(cancellation.departure_time)
        .bind(cancellation.seat_class.as_str())
        .bind(cancellation.refund)
        .bind(cancellation.cancelled_at)
        .bind(&cancellation.cno)
        .execute(&mut *tx)
        .await
        .map_err(cancel_conflict)?;

        let deleted = sqlx::query(
            "DELETE FROM reserve \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND cno = $4",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .bind(&key.cno)
        .execute(&mut *tx)
        .await
        .map_err(infra)?;
        if deleted.rows_affected() == 0 {
            return Err(BookingError::ReservationNotFound);
        }

        let restored = sqlx::query(
            "UPDATE seats SET no_of_seats = no_of_seats + 1 \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3)",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .execute(&mut *tx)
        .await
        .map_err(infra)?;
        if restored.rows_affected() == 0 {
            return Err(BookingError::FlightOrClassNotFound);
        }

        tx.commit().await.map_err(infra)?;
        Ok(())
    }
}

#[async_trait]
impl SeatLedger for PgBookingStore {
    async fn find_seat(&self, key: &SeatKey) -> BookingResult<Option<SeatInventory>> {
        let sql = format!(
            "SELECT {SEAT_COLUMNS} FROM seats \
             WHERE flight_no = $1 AND departure_time = $2 AND upper(seat_class) = upper($3)"
        );
        let row = sqlx::query_as::<_, SeatRow>(&sql)
            .bind(&key.flight_no)
            .bind(key.departure_time)
            .bind(key.seat_class.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        row.map(SeatRow::into_domain).transpose()
    }

    async fn seats_for_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Vec<SeatInventory>> {
        let sql = format!(
            "SELECT {SEAT_COLUMNS} FROM seats \
             WHERE flight_no = $1 AND departure_time = $2 ORDER BY seat_class"
        );
        let rows = sqlx::query_as::<_, SeatRow>(&sql)
            .bind(flight_no)
            .bind(departure_time)
            .fetch_all(&self.pool)
            .await
            .map_err(infra)?;
        rows.into_iter().map(SeatRow::into_domain).collect()
    }

    async fn seats_remaining(&self, key: &SeatKey) -> BookingResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "SELECT no_of_seats FROM seats \
             WHERE flight_no = $1 AND departure_time = $2 AND upper(seat_class) = upper($3)",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?
        .ok_or(BookingError::FlightOrClassNotFound)
    }

    async fn decrement_seats(&self, key: &SeatKey, count: i32) -> BookingResult<()> {
        if count <= 0 {
            return Err(BookingError::Validation("count must be positive".into()));
        }
        let updated = sqlx::query(
            "UPDATE seats SET no_of_seats = no_of_seats - $4 \
             WHERE flight_no = $1 AND departure_time = $2 \
               AND upper(seat_class) = upper($3) AND no_of_seats >= $4",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(infra)?;

        if updated.rows_affected() == 0 {
            return match self.find_seat(key).await? {
                Some(_) => Err(BookingError::SeatsUnavailable),
                None => Err(BookingError::FlightOrClassNotFound),
            };
        }
        Ok(())
    }

    async fn increment_seats(&self, key: &SeatKey, count: i32) -> BookingResult<()> {
        if count <= 0 {
            return Err(BookingError::Validation("count must be positive".into()));
        }
        let updated = sqlx::query(
            "UPDATE seats SET no_of_seats = no_of_seats + $4 \
             WHERE flight_no = $1 AND departure_time = $2 AND upper(seat_class) = upper($3)",
        )
        .bind(&key.flight_no)
        .bind(key.departure_time)
        .bind(key.seat_class.as_str())
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(infra)?;

        if updated.rows_affected() == 0 {
            return Err(BookingError::FlightOrClassNotFound);
        }
        Ok(())
    }
}
