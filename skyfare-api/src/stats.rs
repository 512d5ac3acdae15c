use axum::{extract::State, routing::get, Json, Router};

use skyfare_core::model::{AirlineRevenue, AirportAirlineRevenue};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/stats/airline-revenue", get(airline_revenue))
        .route(
            "/v1/stats/airport-airline-revenue",
            get(airport_airline_revenue),
        )
}

async fn airline_revenue(
    State(state): State<AppState>,
) -> Result<Json<Vec<AirlineRevenue>>, ApiError> {
    Ok(Json(state.stats.airline_revenue_ranking().await?))
}

async fn airport_airline_revenue(
    State(state): State<AppState>,
) -> Result<Json<Vec<AirportAirlineRevenue>>, ApiError> {
    Ok(Json(state.stats.airport_airline_revenue_ranking().await?))
}
