use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use skyfare_core::model::FlightInstance;
use skyfare_core::repository::FlightStore;
use skyfare_core::BookingResult;

use crate::infra;

pub struct PgFlightStore {
    pool: PgPool,
}

impl PgFlightStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    airline: String,
    flight_no: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    departure_airport: String,
    arrival_airport: String,
}

impl From<FlightRow> for FlightInstance {
    fn from(row: FlightRow) -> Self {
        FlightInstance {
            airline: row.airline,
            flight_no: row.flight_no,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
        }
    }
}

const FLIGHT_COLUMNS: &str =
    "airline, flight_no, departure_time, arrival_time, departure_airport, arrival_airport";

#[async_trait]
impl FlightStore for PgFlightStore {
    async fn find_flight(
        &self,
        flight_no: &str,
        departure_time: DateTime<Utc>,
    ) -> BookingResult<Option<FlightInstance>> {
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM airplane \
             WHERE flight_no = $1 AND departure_time = $2"
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(flight_no)
            .bind(departure_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        Ok(row.map(FlightInstance::from))
    }

    async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> BookingResult<Vec<FlightInstance>> {
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM airplane \
             WHERE upper(departure_airport) = upper($1) \
               AND upper(arrival_airport) = upper($2) \
               AND DATE(departure_time) = $3 \
             ORDER BY departure_time"
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(origin)
            .bind(destination)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(infra)?;
        Ok(rows.into_iter().map(FlightInstance::from).collect())
    }
}
