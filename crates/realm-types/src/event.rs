//! Region events delivered to occupants.

use serde::{Deserialize, Serialize};

use crate::enums::EventKind;
use crate::ids::EntityId;
use crate::region_id::RegionId;

/// An immutable, fire-and-forget message produced inside a region.
///
/// `origin` is `None` when the region itself produced the event. Broadcasts
/// never deliver an event back to its origin entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The region the event happened in.
    pub region: RegionId,
    /// What happened.
    pub kind: EventKind,
    /// The entity that caused the event, if any.
    pub origin: Option<EntityId>,
    /// Opaque payload; its meaning depends on `kind`.
    pub body: String,
}

impl Event {
    /// Build a new event.
    pub const fn new(
        region: RegionId,
        kind: EventKind,
        origin: Option<EntityId>,
        body: String,
    ) -> Self {
        Self {
            region,
            kind,
            origin,
            body,
        }
    }

    /// Whether `entity` produced this event.
    pub fn is_from(&self, entity: EntityId) -> bool {
        self.origin == Some(entity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_wire_codes() {
        let origin = EntityId::new();
        let event = Event::new(
            RegionId::spawn(),
            EventKind::Exit,
            Some(origin),
            origin.to_string(),
        );
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["region"], "overworld,field:0:0");
        assert_eq!(value["kind"], "del");
        assert!(event.is_from(origin));
        assert!(!event.is_from(EntityId::new()));
    }

    #[test]
    fn region_events_have_no_origin() {
        let event = Event::new(RegionId::spawn(), EventKind::Give, None, String::new());
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert!(value["origin"].is_null());
    }
}
