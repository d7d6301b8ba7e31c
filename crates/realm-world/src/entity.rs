//! Entity contract and the built-in virtual entity.
//!
//! Regions only ever see entities through the [`Entity`] trait: an id, a
//! bounded inbound event channel, an eviction hook, and a serialized
//! introduction. Behaviour (scripted monsters, player sessions) lives behind
//! the trait in other crates.
//!
//! [`VirtualEntity`] is the server-driven implementation created by
//! [`VirtualEntityFactory`] when regions are populated.

use core::fmt;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use realm_types::{EntityId, Event, RegionId};
use serde_json::json;
use tokio::sync::{mpsc, watch};

use crate::error::WorldError;

/// Lifecycle of the region an entity is attached to, as seen by the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// The region is live.
    Active,
    /// The region timed out and was removed from the store. Terminal.
    Evicted,
}

/// Something that can occupy a region.
pub trait Entity: Send + Sync + fmt::Debug {
    /// Stable identifier.
    fn id(&self) -> EntityId;

    /// The entity's inbound event channel. Regions only ever `try_send` on it.
    fn inbox(&self) -> &mpsc::Sender<Event>;

    /// Register the eviction signal of the region the entity is joining.
    fn attach_eviction(&self, signal: watch::Receiver<RegionState>);

    /// Serialized self-description sent to others in entrance events.
    fn introduction(&self) -> String;

    /// Record the region the entity now lives in.
    fn set_location(&self, region: &RegionId);

    /// Move the entity to a tile position.
    fn set_position(&self, x: f64, y: f64);

    /// Footprint in tiles as `(width, height)`.
    fn footprint(&self) -> (usize, usize) {
        (1, 1)
    }
}

/// Creates entities by kind name.
pub trait EntityFactory: Send + Sync {
    /// Create a new entity of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityUnavailable`] if the kind is unknown or
    /// its definition cannot be loaded.
    fn spawn(&self, kind: &str) -> Result<Arc<dyn Entity>, WorldError>;
}

#[derive(Debug, Default)]
struct Placement {
    region: Option<RegionId>,
    x: f64,
    y: f64,
}

/// A server-driven entity (monster or NPC).
///
/// The inbound receiver is held until a behaviour driver claims it with
/// [`take_receiver`](Self::take_receiver); until then events queue up to the
/// channel capacity and further deliveries are dropped by the sender.
#[derive(Debug)]
pub struct VirtualEntity {
    id: EntityId,
    kind: String,
    inbox: mpsc::Sender<Event>,
    receiver: Mutex<Option<mpsc::Receiver<Event>>>,
    placement: Mutex<Placement>,
    eviction: Mutex<Option<watch::Receiver<RegionState>>>,
}

impl VirtualEntity {
    /// Create an entity of `kind` with an inbox holding `inbox_capacity`
    /// events (at least one).
    pub fn new(kind: impl Into<String>, inbox_capacity: usize) -> Self {
        let (inbox, receiver) = mpsc::channel(inbox_capacity.max(1));
        Self {
            id: EntityId::new(),
            kind: kind.into(),
            inbox,
            receiver: Mutex::new(Some(receiver)),
            placement: Mutex::new(Placement::default()),
            eviction: Mutex::new(None),
        }
    }

    /// The entity kind, e.g. `wolf`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Claim the inbound receiver. Returns `None` once claimed.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<Event>> {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// The region the entity was last placed in.
    pub fn location(&self) -> Option<RegionId> {
        self.placement
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .region
            .clone()
    }

    /// The current tile position.
    pub fn position(&self) -> (f64, f64) {
        let placement = self.placement.lock().unwrap_or_else(PoisonError::into_inner);
        (placement.x, placement.y)
    }

    /// State of the attached region, or `None` if never attached.
    pub fn region_state(&self) -> Option<RegionState> {
        self.eviction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|signal| *signal.borrow())
    }

    /// Wait until the attached region is evicted.
    ///
    /// Returns immediately if nothing is attached or the region's store has
    /// already dropped the signal.
    pub async fn evicted(&self) {
        let signal = self
            .eviction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(mut signal) = signal {
            let _ = signal.wait_for(|state| *state == RegionState::Evicted).await;
        }
    }
}

impl Entity for VirtualEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn inbox(&self) -> &mpsc::Sender<Event> {
        &self.inbox
    }

    fn attach_eviction(&self, signal: watch::Receiver<RegionState>) {
        *self.eviction.lock().unwrap_or_else(PoisonError::into_inner) = Some(signal);
    }

    fn introduction(&self) -> String {
        let (x, y) = self.position();
        let (width, height) = self.footprint();
        json!({
            "eid": self.id,
            "type": self.kind(),
            "x": x,
            "y": y,
            "width": width,
            "height": height,
        })
        .to_string()
    }

    fn set_location(&self, region: &RegionId) {
        self.placement
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .region = Some(region.clone());
    }

    fn set_position(&self, x: f64, y: f64) {
        let mut placement = self.placement.lock().unwrap_or_else(PoisonError::into_inner);
        placement.x = x;
        placement.y = y;
    }
}

/// Factory for [`VirtualEntity`] values.
#[derive(Debug, Clone)]
pub struct VirtualEntityFactory {
    inbox_capacity: usize,
    kinds: Option<BTreeSet<String>>,
}

impl VirtualEntityFactory {
    /// A factory that accepts any kind name.
    pub const fn new(inbox_capacity: usize) -> Self {
        Self {
            inbox_capacity,
            kinds: None,
        }
    }

    /// A factory that only knows the listed kinds.
    pub fn with_kinds<I, S>(inbox_capacity: usize, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inbox_capacity,
            kinds: Some(kinds.into_iter().map(Into::into).collect()),
        }
    }
}

impl EntityFactory for VirtualEntityFactory {
    fn spawn(&self, kind: &str) -> Result<Arc<dyn Entity>, WorldError> {
        if let Some(kinds) = &self.kinds
            && !kinds.contains(kind)
        {
            return Err(WorldError::EntityUnavailable {
                kind: kind.to_owned(),
                reason: String::from("no definition registered"),
            });
        }
        Ok(Arc::new(VirtualEntity::new(kind, self.inbox_capacity)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use realm_types::EventKind;

    use super::*;

    #[test]
    fn introduction_describes_the_entity() {
        let entity = VirtualEntity::new("wolf", 4);
        entity.set_position(3.0, 7.0);
        let value: serde_json::Value = serde_json::from_str(&entity.introduction()).unwrap();
        assert_eq!(value["eid"], entity.id().to_string());
        assert_eq!(value["type"], "wolf");
        assert_eq!(value["x"], 3.0);
        assert_eq!(value["y"], 7.0);
        assert_eq!(value["width"], 1);
    }

    #[test]
    fn location_is_recorded() {
        let entity = VirtualEntity::new("sheep", 4);
        assert_eq!(entity.location(), None);
        entity.set_location(&RegionId::spawn());
        assert_eq!(entity.location(), Some(RegionId::spawn()));
    }

    #[test]
    fn receiver_can_be_claimed_once() {
        let entity = VirtualEntity::new("homely", 2);
        let mut receiver = entity.take_receiver().unwrap();
        assert!(entity.take_receiver().is_none());

        let event = Event::new(RegionId::spawn(), EventKind::Give, None, String::from("x"));
        entity.inbox().try_send(event.clone()).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), event);
    }

    #[test]
    fn zero_capacity_inbox_still_holds_one_event() {
        let entity = VirtualEntity::new("homely", 0);
        let event = Event::new(RegionId::spawn(), EventKind::Give, None, String::new());
        assert!(entity.inbox().try_send(event.clone()).is_ok());
        assert!(entity.inbox().try_send(event).is_err());
    }

    #[tokio::test]
    async fn eviction_signal_is_observed() {
        let entity = VirtualEntity::new("wolf", 1);
        assert_eq!(entity.region_state(), None);

        let (tx, rx) = watch::channel(RegionState::Active);
        entity.attach_eviction(rx);
        assert_eq!(entity.region_state(), Some(RegionState::Active));

        tx.send_replace(RegionState::Evicted);
        entity.evicted().await;
        assert_eq!(entity.region_state(), Some(RegionState::Evicted));
    }

    #[test]
    fn restricted_factory_rejects_unknown_kinds() {
        let factory = VirtualEntityFactory::with_kinds(4, ["wolf", "sheep"]);
        assert!(factory.spawn("wolf").is_ok());
        assert!(matches!(
            factory.spawn("dragon"),
            Err(WorldError::EntityUnavailable { .. })
        ));
        assert!(VirtualEntityFactory::new(4).spawn("dragon").is_ok());
    }
}
