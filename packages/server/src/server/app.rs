//! Application setup: dependencies and background services.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::common::utils::{NominatimGeocoder, YandexGeocoder};
use crate::config::Config;
use crate::kernel::{
    start_background_workers, CoordinateResolver, PostgresEventStore, PostgresPaymentStore,
    RunningServices, ServerDeps, ShutdownMode,
};

/// Everything the process runs
pub struct App {
    pub deps: Arc<ServerDeps>,
    pub shutdown: CancellationToken,
}

/// Build the dependency container over a connected pool.
pub fn build_app(pool: PgPool, config: &Config) -> Result<App> {
    let primary = NominatimGeocoder::new(&config.nominatim_base_url)
        .context("Failed to create Nominatim geocoder")?;
    let secondary =
        YandexGeocoder::new(&config.yandex_geocoder_url, config.yandex_api_key.clone())
            .context("Failed to create Yandex geocoder")?;

    if config.yandex_api_key.is_none() {
        tracing::warn!("YANDEX_API_KEY not set, fallback geocoder disabled");
    }

    let deps = ServerDeps::new(
        Arc::new(PostgresEventStore::new(pool.clone())),
        Arc::new(PostgresPaymentStore::new(pool)),
        CoordinateResolver::new(Arc::new(primary), Arc::new(secondary)),
        config.settlement_delay,
    );

    Ok(App {
        deps: Arc::new(deps),
        shutdown: CancellationToken::new(),
    })
}

impl App {
    /// Start the coordinate sweep and consumer.
    pub fn start(&self, config: &Config) -> RunningServices {
        start_background_workers(
            self.deps.coordinate_queue.clone(),
            &self.deps,
            self.shutdown.clone(),
            config.refresh_settings(),
        )
    }

    /// Stop the workers, then let scheduled settlements finish.
    pub async fn shutdown(&self, running: RunningServices, mode: ShutdownMode) {
        info!("Shutting down background services");
        self.shutdown.cancel();
        running.join().await;
        self.deps.settlement.shutdown(mode).await;
        info!("Shutdown complete");
    }
}
