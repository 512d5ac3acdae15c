use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyfare_api::notify::ConsoleMailer;
use skyfare_api::{app, AppState};
use skyfare_core::cancellation::CancellationService;
use skyfare_core::clock::SystemClock;
use skyfare_core::reservation::ReservationService;
use skyfare_store::{DbClient, PgBookingStore, PgFlightStore, PgStatsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skyfare_api=debug,skyfare_store=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skyfare_store::app_config::Config::load()?;
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    let db = DbClient::new(&config.database).await?;
    db.migrate().await?;

    let booking = Arc::new(PgBookingStore::new(db.pool.clone()));
    let clock = Arc::new(SystemClock);
    let reference_tz = config.business_rules.reference_offset()?;

    let state = AppState {
        reservations: Arc::new(ReservationService::new(
            booking.clone(),
            booking.clone(),
            clock.clone(),
            Arc::new(ConsoleMailer),
        )),
        cancellations: Arc::new(CancellationService::new(booking.clone(), clock, reference_tz)),
        ledger: booking,
        flights: Arc::new(PgFlightStore::new(db.pool.clone())),
        stats: Arc::new(PgStatsStore::new(db.pool.clone())),
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
