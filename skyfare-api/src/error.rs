use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skyfare_core::BookingError;

/// HTTP rendering of core failures. Conflicts and not-found map to distinct
/// statuses so clients can render "no such resource" and "conflicting state"
/// differently; infrastructure detail stays in the logs.
#[derive(Debug)]
pub struct ApiError(pub BookingError);

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BookingError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BookingError::ReservationNotFound | BookingError::FlightOrClassNotFound => {
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            BookingError::AlreadyReserved
            | BookingError::AlreadyCancelled
            | BookingError::SeatsUnavailable => (StatusCode::CONFLICT, self.0.to_string()),
            BookingError::Infrastructure(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (BookingError::AlreadyReserved, StatusCode::CONFLICT),
            (BookingError::AlreadyCancelled, StatusCode::CONFLICT),
            (BookingError::SeatsUnavailable, StatusCode::CONFLICT),
            (BookingError::ReservationNotFound, StatusCode::NOT_FOUND),
            (BookingError::FlightOrClassNotFound, StatusCode::NOT_FOUND),
            (
                BookingError::Infrastructure("db down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }
}
