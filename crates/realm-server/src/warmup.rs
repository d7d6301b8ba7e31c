//! Boot-time creation of configured regions.
//!
//! Regions listed under `server.warm_regions` are created before the server
//! reports ready, so the first player to arrive does not pay for terrain
//! generation and population. Warmed regions follow the normal idle TTL.

use std::sync::Arc;

use realm_core::{Region, RegionStore, StoreError};
use tracing::info;

/// Create every listed region, in order.
///
/// Ids are parsed strictly; a malformed or invalid entry is a configuration
/// mistake and aborts the warm-up.
pub async fn warm_regions(
    store: &RegionStore,
    ids: &[String],
) -> Result<Vec<Arc<Region>>, StoreError> {
    let mut warmed = Vec::with_capacity(ids.len());
    for id in ids {
        let region = store.lookup(id).await?;
        info!(
            region = %region.id(),
            tileset = region.tileset(),
            occupants = region.occupant_count(),
            "region warmed"
        );
        warmed.push(region);
    }
    Ok(warmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use realm_core::RealmConfig;
    use realm_world::{FlatTerrainProvider, VirtualEntityFactory};

    use super::*;

    fn store(config: &RealmConfig) -> RegionStore {
        RegionStore::spawn(
            config,
            Arc::new(FlatTerrainProvider::new(24, 24).unwrap()),
            Arc::new(VirtualEntityFactory::new(8)),
        )
    }

    #[tokio::test]
    async fn default_config_warms_the_spawn_town() {
        let config = RealmConfig::default();
        let store = store(&config);
        let warmed = warm_regions(&store, &config.server.warm_regions).await.unwrap();
        assert_eq!(warmed.len(), 1);
        assert!(warmed.first().unwrap().is_town());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_entries_share_one_region() {
        let config = RealmConfig::default();
        let store = store(&config);
        let ids = vec![
            String::from("overworld,field:0:0"),
            String::from("ether,field:2:2"),
            String::from("overworld,field:0:0"),
        ];
        let warmed = warm_regions(&store, &ids).await.unwrap();
        assert_eq!(warmed.len(), 3);
        assert!(Arc::ptr_eq(warmed.first().unwrap(), warmed.last().unwrap()));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn bad_entries_abort() {
        let config = RealmConfig::default();
        let store = store(&config);
        let ids = vec![String::from("overworld,field:0:0"), String::from("limbo,field:0:0")];
        let result = warm_regions(&store, &ids).await;
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }
}
