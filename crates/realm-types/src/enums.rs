//! Enumeration types for the Realm world-state server.
//!
//! Every enumeration here has a fixed ASCII token form that appears on the
//! wire, either inside a canonical region identifier or as an event code.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Root worlds
// ---------------------------------------------------------------------------

/// A root world: the top of every region identifier chain.
///
/// Root worlds are bare tokens with no type or coordinate suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootWorld {
    /// The ordinary surface world where players spawn.
    Overworld,
    /// The mirrored spirit world.
    Ether,
}

impl RootWorld {
    /// All recognized root worlds.
    pub const ALL: [Self; 2] = [Self::Overworld, Self::Ether];

    /// Return the wire token for this world.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Ether => "ether",
        }
    }

    /// Resolve a wire token to a root world, if it names one.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|world| world.as_str() == token)
    }
}

impl fmt::Display for RootWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Region types
// ---------------------------------------------------------------------------

/// The kind of area a region represents.
///
/// The four well-known kinds drive nesting rules, terrain decoration and
/// population. Any other token (for example `house0` or `cave`) is carried
/// verbatim in [`RegionType::Other`] and is permitted under any valid parent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionType {
    /// Open outdoor terrain tiled directly under a root world.
    Field,
    /// Underground level, nested under an entrance field or another dungeon.
    Dungeon,
    /// Shop interior.
    Shop,
    /// House interior.
    House,
    /// Any other region kind, kept as its raw token.
    Other(String),
}

impl RegionType {
    /// Return the wire token for this region type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Field => "field",
            Self::Dungeon => "dungeon",
            Self::Shop => "shop",
            Self::House => "house",
            Self::Other(token) => token,
        }
    }

    /// Whether this is an interior (shop or house).
    pub const fn is_interior(&self) -> bool {
        matches!(self, Self::Shop | Self::House)
    }
}

impl FromStr for RegionType {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "field" => Self::Field,
            "dungeon" => Self::Dungeon,
            "shop" => Self::Shop,
            "house" => Self::House,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// The kind of a region event, serialized as the client message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// An entity joined the region. Body is the entity's introduction.
    #[serde(rename = "add")]
    Entrance,
    /// An entity left the region. Body is the entity's id.
    #[serde(rename = "del")]
    Exit,
    /// An entity changed one or more of its properties.
    #[serde(rename = "epu")]
    EntityUpdate,
    /// An item was handed to an entity.
    #[serde(rename = "giv")]
    Give,
}

impl EventKind {
    /// Return the three-letter client message code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Entrance => "add",
            Self::Exit => "del",
            Self::EntityUpdate => "epu",
            Self::Give => "giv",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn root_world_tokens_resolve() {
        assert_eq!(RootWorld::from_token("overworld"), Some(RootWorld::Overworld));
        assert_eq!(RootWorld::from_token("ether"), Some(RootWorld::Ether));
        assert_eq!(RootWorld::from_token("mirror"), None);
    }

    #[test]
    fn unknown_region_type_keeps_its_token() {
        let parsed: RegionType = "house0".parse().unwrap();
        assert_eq!(parsed, RegionType::Other(String::from("house0")));
        assert_eq!(parsed.as_str(), "house0");
        assert!(!parsed.is_interior());
    }

    #[test]
    fn known_region_types_parse() {
        for token in ["field", "dungeon", "shop", "house"] {
            let parsed: RegionType = token.parse().unwrap();
            assert_eq!(parsed.to_string(), token);
            assert!(!matches!(parsed, RegionType::Other(_)));
        }
    }

    #[test]
    fn event_kinds_serialize_as_codes() {
        let json = serde_json::to_string(&EventKind::Entrance).unwrap();
        assert_eq!(json, "\"add\"");
        let back: EventKind = serde_json::from_str("\"del\"").unwrap();
        assert_eq!(back, EventKind::Exit);
    }
}
