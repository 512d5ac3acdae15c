use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use skyfare_core::model::Reservation;
use skyfare_core::reservation::CreateReservation;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations", post(create_reservation))
        .route(
            "/v1/reservations/customer/{cno}",
            get(reservations_for_customer),
        )
        .route(
            "/v1/reservations/flight/{flight_no}",
            get(reservations_for_flight),
        )
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct DepartureQuery {
    departure_time: DateTime<Utc>,
}

async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<CreateReservation>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let reservation = state.reservations.create(req).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn reservations_for_customer(
    State(state): State<AppState>,
    Path(cno): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    let reservations = state
        .reservations
        .for_customer(&cno, range.from_date, range.to_date)
        .await?;
    Ok(Json(reservations))
}

async fn reservations_for_flight(
    State(state): State<AppState>,
    Path(flight_no): Path<String>,
    Query(query): Query<DepartureQuery>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    let reservations = state
        .reservations
        .for_flight(&flight_no, query.departure_time)
        .await?;
    Ok(Json(reservations))
}
