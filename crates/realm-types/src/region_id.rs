//! Hierarchical region identifiers.
//!
//! A region identifier is a chain of nesting levels rooted at a
//! [`RootWorld`]. Its canonical wire form is
//!
//! ```text
//! <root>,<type>:<x>:<y>[,<type>:<x>:<y>]...
//! ```
//!
//! for example `overworld,field:1:0,dungeon:0:0,dungeon:2:3`. Commas separate
//! nesting levels and colons separate the type and coordinates within a level.
//! Coordinates are signed and local to the parent.
//!
//! Parsing ([`RegionId::from_str`]) checks structure only. Whether a chain
//! obeys the nesting rules is a separate question answered by
//! [`RegionId::is_valid`].
//!
//! Chains have no depth limit. Levels are stored flat, so hashing,
//! comparison, cloning, formatting and dropping all run in a loop.

use core::fmt;
use core::iter;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enums::{RegionType, RootWorld};
use crate::error::IdentityError;

/// Grid position of the spawn town in every root world.
pub const TOWN_POSITION: (i32, i32) = (0, 0);

/// Grid position of the field that holds the dungeon entrance.
pub const DUNGEON_ENTRANCE_POSITION: (i32, i32) = (1, 0);

/// Whether a root-level field at `(x, y)` is a town.
pub const fn is_town_pos(x: i32, y: i32) -> bool {
    x == TOWN_POSITION.0 && y == TOWN_POSITION.1
}

/// Whether a root-level field at `(x, y)` holds a dungeon entrance.
pub const fn is_dungeon_pos(x: i32, y: i32) -> bool {
    x == DUNGEON_ENTRANCE_POSITION.0 && y == DUNGEON_ENTRANCE_POSITION.1
}

/// One nesting level: a region kind and its position inside the parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Kind of area at this level.
    pub region_type: RegionType,
    /// X coordinate, local to the parent.
    pub x: i32,
    /// Y coordinate, local to the parent.
    pub y: i32,
}

impl Segment {
    /// Build a level.
    pub const fn new(region_type: RegionType, x: i32, y: i32) -> Self {
        Self { region_type, x, y }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.region_type, self.x, self.y)
    }
}

/// Canonical identity of a region.
///
/// Immutable once built. Equality and hashing are structural, which is the
/// same as comparing canonical strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionId {
    root: RootWorld,
    /// Levels above the leaf, outermost first.
    ancestors: Vec<Segment>,
    leaf: Segment,
}

impl RegionId {
    /// A field directly under a root world.
    pub const fn field(world: RootWorld, x: i32, y: i32) -> Self {
        Self {
            root: world,
            ancestors: Vec::new(),
            leaf: Segment::new(RegionType::Field, x, y),
        }
    }

    /// The overworld spawn town. Also the fallback of [`parse_lenient`].
    ///
    /// [`parse_lenient`]: Self::parse_lenient
    pub const fn spawn() -> Self {
        Self::field(RootWorld::Overworld, TOWN_POSITION.0, TOWN_POSITION.1)
    }

    /// Nest a new region inside this one.
    pub fn child(&self, region_type: RegionType, x: i32, y: i32) -> Self {
        let mut ancestors = Vec::with_capacity(self.depth());
        ancestors.extend_from_slice(&self.ancestors);
        ancestors.push(self.leaf.clone());
        Self {
            root: self.root,
            ancestors,
            leaf: Segment::new(region_type, x, y),
        }
    }

    /// Parse an identifier, falling back to the overworld spawn field on
    /// structural failure.
    ///
    /// This reproduces the legacy client contract where a garbled id lands
    /// the player in the spawn town. Every fallback is logged; prefer
    /// [`str::parse`] and handle the [`IdentityError`] where possible.
    pub fn parse_lenient(id: &str) -> Self {
        match id.parse() {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(id, %error, "malformed region id, falling back to spawn field");
                Self::spawn()
            }
        }
    }

    /// The parent region, or `None` for a region directly under a root world.
    pub fn parent_region(&self) -> Option<Self> {
        let mut ancestors = self.ancestors.clone();
        let leaf = ancestors.pop()?;
        Some(Self {
            root: self.root,
            ancestors,
            leaf,
        })
    }

    /// The canonical string of the parent (a root token or a region id).
    pub fn parent_id(&self) -> String {
        let mut parent = String::from(self.root.as_str());
        for level in &self.ancestors {
            parent.push(',');
            parent.push_str(&level.to_string());
        }
        parent
    }

    /// All levels, outermost first. The first is always a root-level region.
    pub fn levels(&self) -> impl Iterator<Item = &Segment> {
        self.ancestors.iter().chain(iter::once(&self.leaf))
    }

    /// The kind of area this region is.
    pub const fn region_type(&self) -> &RegionType {
        &self.leaf.region_type
    }

    /// X coordinate, local to the parent.
    pub const fn x(&self) -> i32 {
        self.leaf.x
    }

    /// Y coordinate, local to the parent.
    pub const fn y(&self) -> i32 {
        self.leaf.y
    }

    /// The root world at the top of the chain.
    pub const fn root(&self) -> RootWorld {
        self.root
    }

    /// Number of nesting levels below the root world (a field is depth 1).
    pub const fn depth(&self) -> usize {
        self.ancestors.len().saturating_add(1)
    }

    /// Whether this region is directly under a root world.
    pub const fn is_root_level(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Whether this region is a town field.
    pub fn is_town(&self) -> bool {
        self.is_root_level()
            && self.leaf.region_type == RegionType::Field
            && is_town_pos(self.leaf.x, self.leaf.y)
    }

    /// Whether this region is the field holding a dungeon entrance.
    pub fn is_dungeon_entrance(&self) -> bool {
        self.is_root_level()
            && self.leaf.region_type == RegionType::Field
            && is_dungeon_pos(self.leaf.x, self.leaf.y)
    }

    /// Check the nesting rules along the whole chain.
    ///
    /// - A region directly under a root world must be a field.
    /// - A field may only sit directly under a root world.
    /// - A dungeon must sit under a dungeon or under a dungeon-entrance field.
    /// - Any other type may sit under any valid parent.
    pub fn is_valid(&self) -> bool {
        let mut levels = self.levels();
        let Some(top) = levels.next() else {
            return false;
        };
        if top.region_type != RegionType::Field {
            return false;
        }

        let mut parent = top;
        let mut parent_is_entrance = is_dungeon_pos(top.x, top.y);
        for level in levels {
            let allowed = match level.region_type {
                RegionType::Field => false,
                RegionType::Dungeon => {
                    parent.region_type == RegionType::Dungeon || parent_is_entrance
                }
                RegionType::Shop | RegionType::House | RegionType::Other(_) => true,
            };
            if !allowed {
                return false;
            }
            parent = level;
            parent_is_entrance = false;
        }
        true
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)?;
        for level in self.levels() {
            write!(f, ",{level}")?;
        }
        Ok(())
    }
}

impl FromStr for RegionId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }

        let mut parts = s.split(',');
        let token = parts.next().unwrap_or_default();
        let root = RootWorld::from_token(token).ok_or_else(|| IdentityError::UnknownWorld {
            token: token.to_owned(),
        })?;

        let mut ancestors = parts.map(parse_segment).collect::<Result<Vec<_>, _>>()?;
        let leaf = ancestors
            .pop()
            .ok_or_else(|| IdentityError::MissingSegment { id: s.to_owned() })?;

        Ok(Self {
            root,
            ancestors,
            leaf,
        })
    }
}

impl TryFrom<String> for RegionId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionId> for String {
    fn from(id: RegionId) -> Self {
        id.to_string()
    }
}

/// Split one `type:x:y` nesting level.
fn parse_segment(segment: &str) -> Result<Segment, IdentityError> {
    let bad_segment = || IdentityError::BadSegment {
        segment: segment.to_owned(),
    };

    let mut parts = segment.split(':');
    let (Some(kind), Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad_segment());
    };
    if kind.is_empty() {
        return Err(bad_segment());
    }

    let coordinate = |value: &str| {
        value.parse::<i32>().ok().ok_or_else(|| IdentityError::BadCoordinate {
            segment: segment.to_owned(),
            value: value.to_owned(),
        })
    };

    let region_type = match kind.parse::<RegionType>() {
        Ok(region_type) => region_type,
        Err(never) => match never {},
    };
    Ok(Segment::new(region_type, coordinate(x)?, coordinate(y)?))
}
