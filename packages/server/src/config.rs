use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::common::utils::{DEFAULT_NOMINATIM_URL, DEFAULT_YANDEX_GEOCODER_URL};
use crate::kernel::RefreshSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub nominatim_base_url: String,
    pub yandex_geocoder_url: String,
    pub yandex_api_key: Option<String>,
    pub coordinates_sweep_period: Duration,
    pub coordinates_consumer_interval: Duration,
    pub settlement_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            nominatim_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string()),
            yandex_geocoder_url: env::var("YANDEX_GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_YANDEX_GEOCODER_URL.to_string()),
            yandex_api_key: env::var("YANDEX_API_KEY").ok().filter(|key| !key.is_empty()),
            coordinates_sweep_period: Duration::from_secs(parse_var(
                "COORDINATES_SWEEP_PERIOD_SECS",
                60,
            )?),
            coordinates_consumer_interval: Duration::from_millis(parse_var(
                "COORDINATES_CONSUMER_INTERVAL_MS",
                1500,
            )?),
            settlement_delay: Duration::from_secs(parse_var("SETTLEMENT_DELAY_SECS", 30)?),
        })
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            sweep_period: self.coordinates_sweep_period,
            consumer_interval: self.coordinates_consumer_interval,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}
