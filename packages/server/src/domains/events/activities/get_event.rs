//! Event location reads

use anyhow::{Context, Result};
use tracing::debug;

use crate::common::utils::{CallerTag, Coordinates};
use crate::common::EventId;
use crate::domains::events::models::EventLocation;
use crate::kernel::ServerDeps;

/// Load an event's location, queueing a coordinate lookup if it has none yet.
pub async fn get_event_location(
    event_id: EventId,
    deps: &ServerDeps,
) -> Result<Option<EventLocation>> {
    let Some(location) = deps.events.find_location(event_id).await? else {
        return Ok(None);
    };

    if deps.coordinate_queue.observe(&location).await {
        debug!(event_id = %event_id, "event read without coordinates, lookup queued");
    }

    Ok(Some(location))
}

/// Resolve an address typed by a user, e.g. to search events nearby.
pub async fn lookup_address(address: &str, deps: &ServerDeps) -> Result<Coordinates> {
    deps.resolver
        .resolve(address, CallerTag::Find)
        .await
        .with_context(|| format!("Failed to find coordinates for {:?}", address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::TestDependencies;

    #[tokio::test]
    async fn test_read_without_coordinates_queues_lookup() {
        let test_deps = TestDependencies::new();
        let event_id = test_deps.events.insert_event("Addr1", None);
        let deps = test_deps.server_deps();

        let location = get_event_location(event_id, &deps).await.unwrap().unwrap();
        get_event_location(event_id, &deps).await.unwrap();

        assert_eq!(location.address, "Addr1");
        assert_eq!(deps.coordinate_queue.counts().await.queued, 1);
    }

    #[tokio::test]
    async fn test_read_with_coordinates_queues_nothing() {
        let test_deps = TestDependencies::new();
        let event_id = test_deps.events.insert_event(
            "Addr1",
            Some(Coordinates {
                latitude: 55.0,
                longitude: 37.0,
            }),
        );
        let deps = test_deps.server_deps();

        get_event_location(event_id, &deps).await.unwrap();

        assert!(!deps.coordinate_queue.is_tracked(event_id).await);
    }

    #[tokio::test]
    async fn test_lookup_uses_interactive_agent() {
        let test_deps = TestDependencies::new();
        test_deps.primary_geocoder.push_result(Ok(Coordinates {
            latitude: 59.93,
            longitude: 30.31,
        }));
        let deps = test_deps.server_deps();

        lookup_address("Санкт-Петербург", &deps).await.unwrap();

        assert_eq!(
            test_deps.primary_geocoder.calls(),
            vec![("Санкт-Петербург".to_string(), CallerTag::Find)]
        );
    }

    #[tokio::test]
    async fn test_deleted_event_is_not_found() {
        let test_deps = TestDependencies::new();
        let event_id = test_deps.events.insert_event("Addr1", None);
        test_deps.events.delete_event(event_id);
        let deps = test_deps.server_deps();

        assert!(get_event_location(event_id, &deps).await.unwrap().is_none());
        assert_eq!(deps.coordinate_queue.counts().await.tracked, 0);
    }
}
