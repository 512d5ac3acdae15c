use std::sync::Arc;

use skyfare_core::cancellation::CancellationService;
use skyfare_core::repository::{FlightStore, SeatLedger, StatsStore};
use skyfare_core::reservation::ReservationService;

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationService>,
    pub cancellations: Arc<CancellationService>,
    pub ledger: Arc<dyn SeatLedger>,
    pub flights: Arc<dyn FlightStore>,
    pub stats: Arc<dyn StatsStore>,
}
