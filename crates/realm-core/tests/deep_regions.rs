//! Lookups of very deeply nested dungeon chains.
//!
//! Chain depth is unbounded, so every identifier operation on the lookup
//! path must run without recursion.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use realm_core::{RealmConfig, RegionStore};
use realm_types::{RegionType, RootWorld};
use realm_world::{FlatTerrainProvider, VirtualEntityFactory};

const LEVELS: usize = 100_000;

fn deep_dungeon() -> String {
    let mut id = String::from("overworld,field:1:0");
    for _ in 0..LEVELS {
        id.push_str(",dungeon:0:0");
    }
    id
}

#[tokio::test]
async fn deep_dungeon_lookup_is_cached() {
    let config = RealmConfig::default();
    let store = RegionStore::spawn(
        &config,
        Arc::new(FlatTerrainProvider::new(32, 32).unwrap()),
        Arc::new(VirtualEntityFactory::new(config.regions.inbox_capacity)),
    );
    let text = deep_dungeon();

    let region = store.lookup(&text).await.unwrap();
    assert_eq!(region.id().depth(), LEVELS + 1);
    assert_eq!(region.id().region_type(), &RegionType::Dungeon);
    assert_eq!(region.root(), RootWorld::Overworld);
    assert_eq!(region.id().to_string(), text);

    let again = store.lookup(&text).await.unwrap();
    assert!(Arc::ptr_eq(&region, &again));
    assert_eq!(store.len(), 1);
}
