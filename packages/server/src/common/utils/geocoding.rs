use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::address::normalize_address_for_osm;
use crate::kernel::BaseGeocoder;

/// Upper bound for a single provider request.
pub const GEOCODING_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_YANDEX_GEOCODER_URL: &str = "https://geocode-maps.yandex.ru/1.x";

/// A resolved point on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the WGS84 range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            bail!("latitude out of range: {}", latitude);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            bail!("longitude out of range: {}", longitude);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse provider string values ("55.75", "37.61")
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat: f64 = latitude
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid latitude {:?}: {}", latitude, e))?;
        let lng: f64 = longitude
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid longitude {:?}: {}", longitude, e))?;
        Self::new(lat, lng)
    }
}

/// Identifies who is asking, so providers can classify our traffic.
///
/// Nominatim's usage policy rate-limits per User-Agent; background refreshes
/// and interactive lookups are sent under different agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerTag {
    /// Background coordinate refresh
    Refresh,
    /// Interactive search from the app
    Find,
}

impl CallerTag {
    pub fn user_agent(self) -> &'static str {
        match self {
            CallerTag::Refresh => "SportifyApp/1.0",
            CallerTag::Find => "Move-life-App/1.0",
        }
    }
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(GEOCODING_TIMEOUT)
        .build()
        .context("Failed to build geocoding HTTP client")
}

// =============================================================================
// Nominatim (OpenStreetMap) - primary provider
// =============================================================================

/// Nominatim API response item for geocoding
#[derive(Debug, Deserialize)]
struct NominatimResponse {
    lat: String,
    lon: String,
}

/// Parse a Nominatim `jsonv2` search response.
///
/// Exactly one result is required; anything else is treated as ambiguous.
pub fn parse_nominatim_response(body: &str) -> Result<Coordinates> {
    let results: Vec<NominatimResponse> =
        serde_json::from_str(body).context("Failed to parse Nominatim response")?;

    match results.as_slice() {
        [only] => Coordinates::parse(&only.lat, &only.lon),
        other => bail!("Invalid coordinates count: {}", other.len()),
    }
}

/// Geocoder backed by the public Nominatim search API
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, address: &str) -> String {
        format!(
            "{}/search?q={}&limit=1&accept-language=ru-RU&countrycodes=RU&format=jsonv2",
            self.base_url,
            urlencoding::encode(address)
        )
    }
}

#[async_trait]
impl BaseGeocoder for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "open map"
    }

    #[instrument(skip(self))]
    async fn geocode(&self, address: &str, caller: CallerTag) -> Result<Coordinates> {
        let query = normalize_address_for_osm(address);
        let url = self.search_url(&query);
        debug!(url = %url, "Geocoding via Nominatim");

        let body = self
            .client
            .get(&url)
            .header("User-Agent", caller.user_agent())
            .send()
            .await
            .context("Nominatim request failed")?
            .error_for_status()
            .context("Nominatim returned an error status")?
            .text()
            .await
            .context("Failed to read Nominatim response")?;

        parse_nominatim_response(&body).map_err(|e| {
            warn!(address = %query, error = %e, "Nominatim could not resolve address");
            e
        })
    }
}

// =============================================================================
// Yandex - secondary provider
// =============================================================================

#[derive(Debug, Deserialize)]
struct YandexResponse {
    response: YandexBody,
}

#[derive(Debug, Deserialize)]
struct YandexBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: YandexCollection,
}

#[derive(Debug, Deserialize)]
struct YandexCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<YandexMember>,
}

#[derive(Debug, Deserialize)]
struct YandexMember {
    #[serde(rename = "GeoObject")]
    geo_object: YandexGeoObject,
}

#[derive(Debug, Deserialize)]
struct YandexGeoObject {
    #[serde(rename = "Point")]
    point: YandexPoint,
}

#[derive(Debug, Deserialize)]
struct YandexPoint {
    pos: String,
}

/// Parse a Yandex geocoder JSON response.
///
/// The best match comes first; its `pos` is "longitude latitude".
pub fn parse_yandex_response(body: &str) -> Result<Coordinates> {
    let response: YandexResponse =
        serde_json::from_str(body).context("Failed to parse Yandex response")?;

    let first = response
        .response
        .collection
        .members
        .first()
        .ok_or_else(|| anyhow!("Yandex returned no results"))?;

    let pos = first.geo_object.point.pos.as_str();
    match pos.split_whitespace().collect::<Vec<_>>().as_slice() {
        [lon, lat] => Coordinates::parse(lat, lon),
        _ => bail!("Malformed Yandex coordinates: {:?}", pos),
    }
}

/// Geocoder backed by the Yandex HTTP geocoder API
pub struct YandexGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl YandexGeocoder {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl BaseGeocoder for YandexGeocoder {
    fn name(&self) -> &'static str {
        "yandex"
    }

    #[instrument(skip(self))]
    async fn geocode(&self, address: &str, caller: CallerTag) -> Result<Coordinates> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Yandex API key is not configured"))?;

        // Bias results towards Moscow like the app's map view does
        let url = format!(
            "{}?apikey={}&geocode={}&lang=ru_RU&format=json&rspn=1&ll=37.623150,55.752508&spn=6,6",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(address)
        );

        let body = self
            .client
            .get(&url)
            .header("User-Agent", caller.user_agent())
            .send()
            .await
            .context("Yandex request failed")?
            .error_for_status()
            .context("Yandex returned an error status")?
            .text()
            .await
            .context("Failed to read Yandex response")?;

        parse_yandex_response(&body)
    }
}
