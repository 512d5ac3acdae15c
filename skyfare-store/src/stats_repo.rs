use async_trait::async_trait;
use sqlx::PgPool;

use skyfare_core::model::{AirlineRevenue, AirportAirlineRevenue};
use skyfare_core::repository::StatsStore;
use skyfare_core::BookingResult;

use crate::infra;

/// Revenue aggregation over the schedule and reservation tables. Ports the
/// admin statistics queries; airlines without reservations still appear with
/// zero revenue.
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AirlineRevenueRow {
    airline: String,
    total_revenue: i64,
    reservation_count: i64,
}

#[derive(sqlx::FromRow)]
struct AirportAirlineRevenueRow {
    departure_airport: String,
    airline: String,
    total_revenue: i64,
    revenue_rank: i64,
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn airline_revenue_ranking(&self) -> BookingResult<Vec<AirlineRevenue>> {
        let rows = sqlx::query_as::<_, AirlineRevenueRow>(
            "SELECT a.airline, \
                    COALESCE(SUM(r.payment), 0)::bigint AS total_revenue, \
                    COUNT(r.flight_no)::bigint AS reservation_count \
             FROM airplane a \
             LEFT JOIN reserve r \
               ON r.flight_no = a.flight_no AND r.departure_time = a.departure_time \
             GROUP BY a.airline \
             ORDER BY total_revenue DESC, a.airline",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        Ok(rows
            .into_iter()
            .map(|row| AirlineRevenue {
                airline: row.airline,
                total_revenue: row.total_revenue,
                reservation_count: row.reservation_count,
            })
            .collect())
    }

    async fn airport_airline_revenue_ranking(
        &self,
    ) -> BookingResult<Vec<AirportAirlineRevenue>> {
        let rows = sqlx::query_as::<_, AirportAirlineRevenueRow>(
            "SELECT departure_airport, airline, total_revenue, revenue_rank \
             FROM ( \
                 SELECT a.departure_airport, a.airline, \
                        COALESCE(SUM(r.payment), 0)::bigint AS total_revenue, \
                        RANK() OVER ( \
                            PARTITION BY a.departure_airport \
                            ORDER BY COALESCE(SUM(r.payment), 0) DESC \
                        )::bigint AS revenue_rank \
                 FROM airplane a \
                 LEFT JOIN reserve r \
                   ON r.flight_no = a.flight_no AND r.departure_time = a.departure_time \
                 GROUP BY a.departure_airport, a.airline \
             ) ranked \
             ORDER BY departure_airport, revenue_rank, airline",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        Ok(rows
            .into_iter()
            .map(|row| AirportAirlineRevenue {
                departure_airport: row.departure_airport,
                airline: row.airline,
                total_revenue: row.total_revenue,
                revenue_rank: row.revenue_rank,
            })
            .collect())
    }
}
