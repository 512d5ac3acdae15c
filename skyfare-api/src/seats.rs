use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skyfare_core::model::{SeatClass, SeatInventory, SeatKey};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/seats", get(seats_for_flight))
        .route("/v1/seats/remaining", get(seats_remaining))
}

#[derive(Debug, Deserialize)]
struct FlightQuery {
    flight_no: String,
    departure_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SeatQuery {
    flight_no: String,
    departure_time: DateTime<Utc>,
    seat_class: String,
}

#[derive(Debug, Serialize)]
struct SeatsRemaining {
    flight_no: String,
    departure_time: DateTime<Utc>,
    seat_class: SeatClass,
    seats_remaining: i32,
}

async fn seats_for_flight(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<SeatInventory>>, ApiError> {
    let seats = state
        .ledger
        .seats_for_flight(&query.flight_no, query.departure_time)
        .await?;
    Ok(Json(seats))
}

async fn seats_remaining(
    State(state): State<AppState>,
    Query(query): Query<SeatQuery>,
) -> Result<Json<SeatsRemaining>, ApiError> {
    let seat_class = SeatClass::parse(&query.seat_class)?;
    let key = SeatKey {
        flight_no: query.flight_no,
        departure_time: query.departure_time,
        seat_class,
    };
    let remaining = state.ledger.seats_remaining(&key).await?;
    Ok(Json(SeatsRemaining {
        flight_no: key.flight_no,
        departure_time: key.departure_time,
        seat_class,
        seats_remaining: remaining,
    }))
}
