pub mod cancellation;
pub mod clock;
pub mod memory;
pub mod model;
pub mod penalty;
pub mod repository;
pub mod reservation;

/// Failure kinds of the booking core.
///
/// Conflicts, not-found and validation are expected business outcomes and map
/// to 4xx responses at the HTTP boundary. `Infrastructure` covers everything
/// the store could not complete; the store guarantees a full rollback before
/// surfacing it.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("an identical reservation already exists")]
    AlreadyReserved,
    #[error("no seats remaining in the requested class")]
    SeatsUnavailable,
    #[error("flight or seat class not found")]
    FlightOrClassNotFound,
    #[error("reservation not found")]
    ReservationNotFound,
    #[error("reservation was already cancelled")]
    AlreadyCancelled,
    #[error("storage failure: {0}")]
    Infrastructure(String),
}

pub type BookingResult<T> = Result<T, BookingError>;
