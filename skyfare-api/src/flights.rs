use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use skyfare_core::model::FlightInstance;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/flights", get(search_flights))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    origin: String,
    destination: String,
    date: NaiveDate,
}

async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FlightInstance>>, ApiError> {
    let flights = state
        .flights
        .search_flights(&query.origin, &query.destination, query.date)
        .await?;
    Ok(Json(flights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{departure, seeded_state};

    #[tokio::test]
    async fn search_matches_route_case_insensitively() {
        let (_, state) = seeded_state(3);
        let Json(flights) = search_flights(
            State(state),
            Query(SearchQuery {
                origin: "icn".into(),
                destination: "nrt".into(),
                date: departure().date_naive(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].flight_no, "KE001");
    }

    #[tokio::test]
    async fn search_on_another_day_is_empty() {
        let (_, state) = seeded_state(3);
        let Json(flights) = search_flights(
            State(state),
            Query(SearchQuery {
                origin: "ICN".into(),
                destination: "NRT".into(),
                date: departure().date_naive().succ_opt().unwrap(),
            }),
        )
        .await
        .unwrap();
        assert!(flights.is_empty());
    }
}
