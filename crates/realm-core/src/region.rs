//! A live region: terrain plus the set of entities inside it.
//!
//! Membership changes and broadcasts are serialized by one lock around the
//! occupant list. Delivery never waits: events go out with `try_send` and an
//! occupant whose inbox is full or closed simply misses the event. Nothing
//! is awaited while the lock is held.
//!
//! # Lifecycle
//!
//! A region is built by the store, published, and then kept alive by
//! [`Region::keep_alive`]. Once a full TTL passes without a keep-alive the
//! store evicts it and every occupant's eviction signal flips to
//! [`RegionState::Evicted`]. Eviction is terminal; a later lookup of the same
//! id builds a fresh region.

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use realm_types::{EntityId, Event, EventKind, RegionId, RootWorld};
use realm_world::{
    Entity, EntityFactory, EntityPopulator, PopulationConfig, RegionState, Terrain,
    TerrainProvider, WorldError,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, watch};
use tracing::{debug, error, warn};

use crate::error::RegionError;

/// A live region.
#[derive(Debug)]
pub struct Region {
    id: RegionId,
    terrain: Terrain,
    tileset: String,
    occupants: Mutex<Vec<Arc<dyn Entity>>>,
    keep_alive: Notify,
    state: watch::Sender<RegionState>,
}

impl Region {
    /// Create an empty, active region.
    pub fn new(id: RegionId, terrain: Terrain, tileset: impl Into<String>) -> Self {
        let (state, _) = watch::channel(RegionState::Active);
        Self {
            id,
            terrain,
            tileset: tileset.into(),
            occupants: Mutex::new(Vec::new()),
            keep_alive: Notify::new(),
            state,
        }
    }

    /// Generate, decorate, and populate a region.
    ///
    /// The region is not shared with anything yet, so the initial occupants
    /// join without contention.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if terrain generation fails or an entity kind
    /// cannot be created.
    pub fn build(
        id: &RegionId,
        provider: &dyn TerrainProvider,
        factory: &dyn EntityFactory,
        population: &PopulationConfig,
    ) -> Result<Self, WorldError> {
        let terrain = realm_world::generate(provider, id)?;
        let tileset = provider.tileset(id.root(), id.region_type());
        let region = Self::new(id.clone(), terrain, tileset);

        let spawned = EntityPopulator::new(population, factory).populate(id, &region.terrain)?;
        for entity in spawned {
            if let Err(error) = region.add_entity(entity) {
                warn!(region = %id, %error, "dropping initial occupant");
            }
        }
        Ok(region)
    }

    /// The region's identity.
    pub const fn id(&self) -> &RegionId {
        &self.id
    }

    /// The root world the region ultimately belongs to.
    pub const fn root(&self) -> RootWorld {
        self.id.root()
    }

    /// Whether this is the overworld spawn town.
    pub fn is_town(&self) -> bool {
        self.id.is_town()
    }

    /// The region's terrain. Immutable after creation.
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Client tileset name.
    pub fn tileset(&self) -> &str {
        &self.tileset
    }

    /// Build an event scoped to this region.
    pub fn event(
        &self,
        kind: EventKind,
        body: impl Into<String>,
        origin: Option<EntityId>,
    ) -> Event {
        Event::new(self.id.clone(), kind, origin, body.into())
    }

    /// Add an entity to the region.
    ///
    /// Current occupants receive an entrance event carrying the newcomer's
    /// introduction, and the newcomer receives one entrance event per
    /// current occupant. The newcomer is attached to the region's eviction
    /// signal.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::AlreadyPresent`] if the entity is already an
    /// occupant, or [`RegionError::Evicted`] if the region has been evicted.
    pub fn add_entity(&self, entity: Arc<dyn Entity>) -> Result<(), RegionError> {
        let mut occupants = self.lock_occupants();

        if self.is_evicted() {
            return Err(RegionError::Evicted {
                region: self.id.clone(),
            });
        }
        let id = entity.id();
        if occupants.iter().any(|occupant| occupant.id() == id) {
            return Err(RegionError::AlreadyPresent {
                entity: id,
                region: self.id.clone(),
            });
        }

        entity.attach_eviction(self.state.subscribe());

        let entrance = self.event(EventKind::Entrance, entity.introduction(), Some(id));
        self.deliver_all(&occupants, &entrance);

        for occupant in occupants.iter() {
            let introduction = self.event(
                EventKind::Entrance,
                occupant.introduction(),
                Some(occupant.id()),
            );
            self.deliver(entity.as_ref(), introduction);
        }

        occupants.push(entity);
        debug!(region = %self.id, entity = %id, occupants = occupants.len(), "entity joined");
        Ok(())
    }

    /// Remove an entity from the region.
    ///
    /// The remaining occupants receive an exit event whose body is the
    /// entity's id. Returns `false` and logs if the entity is not an
    /// occupant; nothing is broadcast in that case.
    pub fn remove_entity(&self, entity: &dyn Entity) -> bool {
        let id = entity.id();
        let mut occupants = self.lock_occupants();

        let Some(index) = occupants.iter().position(|occupant| occupant.id() == id) else {
            error!(region = %self.id, entity = %id, "could not find entity to remove");
            return false;
        };

        let exit = self.event(EventKind::Exit, id.to_string(), Some(id));
        self.deliver_all(&occupants, &exit);
        occupants.remove(index);
        debug!(region = %self.id, entity = %id, occupants = occupants.len(), "entity left");
        true
    }

    /// Deliver an event to every occupant except its origin.
    pub fn broadcast(&self, event: &Event) {
        let occupants = self.lock_occupants();
        self.deliver_all(&occupants, event);
    }

    /// Look up an occupant by id.
    pub fn entity(&self, id: EntityId) -> Option<Arc<dyn Entity>> {
        self.lock_occupants()
            .iter()
            .find(|occupant| occupant.id() == id)
            .map(Arc::clone)
    }

    /// Ids of the current occupants, in join order.
    pub fn occupant_ids(&self) -> Vec<EntityId> {
        self.lock_occupants().iter().map(|occupant| occupant.id()).collect()
    }

    /// Number of current occupants.
    pub fn occupant_count(&self) -> usize {
        self.lock_occupants().len()
    }

    /// Reset the idle timer.
    pub fn keep_alive(&self) {
        self.keep_alive.notify_one();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegionState {
        *self.state.borrow()
    }

    /// Whether the region has been evicted.
    pub fn is_evicted(&self) -> bool {
        self.state() == RegionState::Evicted
    }

    /// Wait until `ttl` passes without a keep-alive.
    pub(crate) async fn idle(&self, ttl: Duration) {
        loop {
            tokio::select! {
                () = self.keep_alive.notified() => {
                    debug!(region = %self.id, "region kept alive");
                }
                () = tokio::time::sleep(ttl) => return,
            }
        }
    }

    /// Flip the eviction signal. Taken under the occupant lock so no entity
    /// can join after the flip.
    pub(crate) fn mark_evicted(&self) {
        let occupants = self.lock_occupants();
        self.state.send_replace(RegionState::Evicted);
        debug!(region = %self.id, occupants = occupants.len(), "eviction signalled");
    }

    fn lock_occupants(&self) -> MutexGuard<'_, Vec<Arc<dyn Entity>>> {
        self.occupants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver_all(&self, occupants: &[Arc<dyn Entity>], event: &Event) {
        for occupant in occupants {
            if !event.is_from(occupant.id()) {
                self.deliver(occupant.as_ref(), event.clone());
            }
        }
    }

    fn deliver(&self, recipient: &dyn Entity, event: Event) {
        match recipient.inbox().try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(
                    region = %self.id,
                    entity = %recipient.id(),
                    kind = %event.kind,
                    "inbox full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                debug!(
                    region = %self.id,
                    entity = %recipient.id(),
                    kind = %event.kind,
                    "inbox closed, dropping event"
                );
            }
        }
    }
}

/// Region payload as sent to clients: the terrain fields followed by the
/// tileset and slide flag, without enclosing braces.
impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, \"tileset\": \"{}\", \"can_slide\": true",
            self.terrain, self.tileset
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use realm_world::{FlatTerrainProvider, VirtualEntity, VirtualEntityFactory};
    use tokio::sync::mpsc;

    use super::*;

    fn empty_region() -> Region {
        let terrain = Terrain::walled(10, 10).unwrap();
        Region::new(RegionId::spawn(), terrain, "tileset_default")
    }

    fn joiner(kind: &str) -> (Arc<VirtualEntity>, mpsc::Receiver<Event>) {
        let entity = Arc::new(VirtualEntity::new(kind, 16));
        let receiver = entity.take_receiver().unwrap();
        (entity, receiver)
    }

    fn drain(receiver: &mut mpsc::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn joining_exchanges_introductions() {
        let region = empty_region();
        let (a, mut a_rx) = joiner("wolf");
        let (b, mut b_rx) = joiner("sheep");

        region.add_entity(a.clone()).unwrap();
        assert!(drain(&mut a_rx).is_empty());

        region.add_entity(b.clone()).unwrap();
        let to_a = drain(&mut a_rx);
        assert_eq!(to_a.len(), 1);
        let entrance = to_a.first().unwrap();
        assert_eq!(entrance.kind, EventKind::Entrance);
        assert_eq!(entrance.body, b.introduction());
        assert!(entrance.is_from(b.id()));

        let to_b = drain(&mut b_rx);
        assert_eq!(to_b.len(), 1);
        let introduction = to_b.first().unwrap();
        assert_eq!(introduction.body, a.introduction());
        assert!(introduction.is_from(a.id()));
        assert_eq!(region.occupant_ids(), vec![a.id(), b.id()]);
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let region = empty_region();
        let (a, _rx) = joiner("wolf");
        region.add_entity(a.clone()).unwrap();
        let result = region.add_entity(a.clone());
        assert!(matches!(result, Err(RegionError::AlreadyPresent { .. })));
        assert_eq!(region.occupant_count(), 1);
    }

    #[test]
    fn leaving_announces_exit_to_the_rest() {
        let region = empty_region();
        let (a, mut a_rx) = joiner("wolf");
        let (b, mut b_rx) = joiner("sheep");
        let (c, mut c_rx) = joiner("homely");
        for entity in [a.clone(), b.clone(), c.clone()] {
            region.add_entity(entity).unwrap();
        }
        drain(&mut a_rx);
        drain(&mut b_rx);
        drain(&mut c_rx);

        assert!(region.remove_entity(b.as_ref()));
        for rx in [&mut a_rx, &mut c_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            let exit = events.first().unwrap();
            assert_eq!(exit.kind, EventKind::Exit);
            assert_eq!(exit.body, b.id().to_string());
        }
        assert!(drain(&mut b_rx).is_empty());
        assert!(region.entity(b.id()).is_none());
        assert_eq!(region.occupant_count(), 2);
    }

    #[test]
    fn removing_a_stranger_is_a_no_op() {
        let region = empty_region();
        let (a, mut a_rx) = joiner("wolf");
        let (stranger, _rx) = joiner("sheep");
        region.add_entity(a).unwrap();

        assert!(!region.remove_entity(stranger.as_ref()));
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(region.occupant_count(), 1);
    }

    #[test]
    fn broadcast_skips_origin_and_survives_full_inboxes() {
        let region = empty_region();
        let (a, mut a_rx) = joiner("wolf");
        let tiny = Arc::new(VirtualEntity::new("sheep", 1));
        let mut tiny_rx = tiny.take_receiver().unwrap();
        region.add_entity(a.clone()).unwrap();
        region.add_entity(tiny.clone()).unwrap();
        drain(&mut a_rx);

        // tiny's single slot already holds a's introduction.
        let event = region.event(EventKind::EntityUpdate, "{}", Some(a.id()));
        region.broadcast(&event);
        assert!(drain(&mut a_rx).is_empty());
        let received = drain(&mut tiny_rx);
        assert_eq!(received.len(), 1);
        assert_eq!(received.first().unwrap().kind, EventKind::Entrance);

        region.broadcast(&event);
        assert_eq!(drain(&mut tiny_rx), vec![event]);
    }

    #[test]
    fn closed_inboxes_are_skipped() {
        let region = empty_region();
        let (a, a_rx) = joiner("wolf");
        let (b, mut b_rx) = joiner("sheep");
        region.add_entity(a).unwrap();
        drop(a_rx);
        region.add_entity(b.clone()).unwrap();
        region.broadcast(&region.event(EventKind::Give, "gift", None));
        let events = drain(&mut b_rx);
        assert_eq!(events.len(), 2);
        let gift = events.last().unwrap();
        assert_eq!(gift.kind, EventKind::Give);
        assert_eq!(gift.origin, None);
    }

    #[test]
    fn eviction_is_signalled_and_blocks_joins() {
        let region = empty_region();
        let (a, _rx) = joiner("wolf");
        region.add_entity(a.clone()).unwrap();
        assert_eq!(a.region_state(), Some(RegionState::Active));

        region.mark_evicted();
        assert!(region.is_evicted());
        assert_eq!(a.region_state(), Some(RegionState::Evicted));

        let (b, _rx) = joiner("sheep");
        assert!(matches!(
            region.add_entity(b),
            Err(RegionError::Evicted { .. })
        ));
    }

    #[test]
    fn wire_payload_appends_tileset() {
        let region = empty_region();
        let wire = region.to_string();
        assert!(wire.starts_with(&region.terrain().to_string()));
        assert!(wire.ends_with(", \"tileset\": \"tileset_default\", \"can_slide\": true"));
        let value: serde_json::Value = serde_json::from_str(&format!("{{{wire}}}")).unwrap();
        assert_eq!(value["tileset"], "tileset_default");
        assert_eq!(value["can_slide"], true);
        assert_eq!(value["width"], 10);
    }

    #[test]
    fn built_shop_has_its_residents() {
        let provider = FlatTerrainProvider::new(40, 40).unwrap();
        let factory = VirtualEntityFactory::new(16);
        let id: RegionId = "overworld,field:2:2,shop:0:0".parse().unwrap();
        let region = Region::build(&id, &provider, &factory, &PopulationConfig::default()).unwrap();
        assert_eq!(region.occupant_count(), 3);
        assert_eq!(region.tileset(), "tileset_interior");
        assert_eq!(region.root(), RootWorld::Overworld);
        assert!(!region.is_town());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_resolves_after_quiet_ttl() {
        let region = Arc::new(empty_region());
        let ttl = Duration::from_secs(10);
        let waiter = {
            let region = Arc::clone(&region);
            tokio::spawn(async move { region.idle(ttl).await })
        };

        tokio::time::sleep(Duration::from_secs(8)).await;
        region.keep_alive();
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(!waiter.is_finished());

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert!(waiter.is_finished());
    }
}
