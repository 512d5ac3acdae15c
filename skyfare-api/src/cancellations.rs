use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use skyfare_core::cancellation::CancelReservation;
use skyfare_core::model::Cancellation;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cancellations", post(cancel_reservation))
        .route(
            "/v1/cancellations/customer/{cno}",
            get(cancellations_for_customer),
        )
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
}

async fn cancel_reservation(
    State(state): State<AppState>,
    Json(req): Json<CancelReservation>,
) -> Result<(StatusCode, Json<Cancellation>), ApiError> {
    let cancellation = state.cancellations.cancel(req).await?;
    Ok((StatusCode::CREATED, Json(cancellation)))
}

async fn cancellations_for_customer(
    State(state): State<AppState>,
    Path(cno): Path<String>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<Cancellation>>, ApiError> {
    let cancellations = state
        .cancellations
        .for_customer(&cno, range.from_date, range.to_date)
        .await?;
    Ok(Json(cancellations))
}
