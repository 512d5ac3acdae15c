pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod flight_repo;
pub mod stats_repo;

pub use booking_repo::PgBookingStore;
pub use database::DbClient;
pub use flight_repo::PgFlightStore;
pub use stats_repo::PgStatsStore;

use skyfare_core::BookingError;

/// Classifies a driver error as an infrastructure failure, logging the
/// detail before the generic kind is surfaced.
pub(crate) fn infra(err: sqlx::Error) -> BookingError {
    tracing::error!(error = %err, "database failure");
    BookingError::Infrastructure(err.to_string())
}
