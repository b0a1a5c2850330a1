//! Address to coordinates with provider fallback.
//!
//! The resolver holds no state between calls: each `resolve` tries the
//! primary provider, and only on failure the secondary one.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::common::utils::{CallerTag, Coordinates};
use crate::kernel::BaseGeocoder;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{primary}: {primary_error}, {secondary}: {secondary_error}")]
    Exhausted {
        primary: &'static str,
        primary_error: anyhow::Error,
        secondary: &'static str,
        secondary_error: anyhow::Error,
    },
}

#[derive(Clone)]
pub struct CoordinateResolver {
    primary: Arc<dyn BaseGeocoder>,
    secondary: Arc<dyn BaseGeocoder>,
}

impl CoordinateResolver {
    pub fn new(primary: Arc<dyn BaseGeocoder>, secondary: Arc<dyn BaseGeocoder>) -> Self {
        Self { primary, secondary }
    }

    pub async fn resolve(
        &self,
        address: &str,
        caller: CallerTag,
    ) -> Result<Coordinates, ResolveError> {
        let primary_error = match self.primary.geocode(address, caller).await {
            Ok(coordinates) => return Ok(coordinates),
            Err(e) => e,
        };

        debug!(
            provider = self.primary.name(),
            error = %primary_error,
            "primary geocoder failed, falling back"
        );

        match self.secondary.geocode(address, caller).await {
            Ok(coordinates) => Ok(coordinates),
            Err(secondary_error) => {
                warn!(address = %address, "all geocoders failed");
                Err(ResolveError::Exhausted {
                    primary: self.primary.name(),
                    primary_error,
                    secondary: self.secondary.name(),
                    secondary_error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockGeocoder;

    fn moscow() -> Coordinates {
        Coordinates {
            latitude: 55.75,
            longitude: 37.61,
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = Arc::new(MockGeocoder::new("open map").with_result(Ok(moscow())));
        let secondary = Arc::new(MockGeocoder::new("yandex"));
        let resolver = CoordinateResolver::new(primary.clone(), secondary.clone());

        let coords = resolver.resolve("Москва", CallerTag::Find).await.unwrap();

        assert_eq!(coords, moscow());
        assert_eq!(primary.calls(), vec![("Москва".to_string(), CallerTag::Find)]);
        assert!(secondary.calls().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_secondary() {
        let primary = Arc::new(MockGeocoder::new("open map").with_failure("count: 0"));
        let secondary = Arc::new(MockGeocoder::new("yandex").with_result(Ok(moscow())));
        let resolver = CoordinateResolver::new(primary, secondary.clone());

        let coords = resolver.resolve("Москва", CallerTag::Refresh).await.unwrap();

        assert_eq!(coords, moscow());
        assert_eq!(secondary.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_both_failures_are_reported() {
        let primary = Arc::new(MockGeocoder::new("open map").with_failure("timeout"));
        let secondary = Arc::new(MockGeocoder::new("yandex").with_failure("bad key"));
        let resolver = CoordinateResolver::new(primary, secondary);

        let err = resolver.resolve("nowhere", CallerTag::Refresh).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("open map: timeout"), "{}", message);
        assert!(message.contains("yandex: bad key"), "{}", message);
    }
}
