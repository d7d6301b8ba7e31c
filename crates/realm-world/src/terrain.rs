//! Terrain grids and the terrain provider contract.
//!
//! Terrain generation itself belongs to a [`TerrainProvider`]. This module
//! owns the grid representation every provider produces, the decoration
//! dispatch applied once when a region is created, and
//! [`FlatTerrainProvider`], a small built-in provider used by the server
//! binary and tests.
//!
//! Grids are indexed `[y][x]`. In the hitmap `true` means blocked.

use core::fmt;

use realm_types::{RegionId, RegionType, RootWorld};

use crate::error::WorldError;

/// Smallest width or height a walled region can have.
pub const MIN_DIMENSION: usize = 8;

/// Open ground.
pub const GROUND_TILE: u16 = 0;
/// Solid wall or boundary.
pub const WALL_TILE: u16 = 1;
/// Interior or dungeon floor.
pub const FLOOR_TILE: u16 = 2;
/// Walkable portal to a nested region.
pub const PORTAL_TILE: u16 = 3;
/// Decorative obstacle (fountain, pillar, counter).
pub const FEATURE_TILE: u16 = 4;

/// A rectangular tile grid with a passability map.
///
/// Owned exclusively by its region and read-only once the region is
/// published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terrain {
    width: usize,
    height: usize,
    tiles: Vec<Vec<u16>>,
    hitmap: Vec<Vec<bool>>,
}

impl Terrain {
    /// Create terrain filled with `tile`, with the hitmap set to `blocked`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either side is smaller
    /// than [`MIN_DIMENSION`].
    pub fn filled(width: usize, height: usize, tile: u16, blocked: bool) -> Result<Self, WorldError> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            tiles: vec![vec![tile; width]; height],
            hitmap: vec![vec![blocked; width]; height],
        })
    }

    /// Create open ground surrounded by a one-tile wall.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either side is smaller
    /// than [`MIN_DIMENSION`].
    pub fn walled(width: usize, height: usize) -> Result<Self, WorldError> {
        let mut terrain = Self::filled(width, height, GROUND_TILE, false)?;
        let right = width.saturating_sub(1);
        let bottom = height.saturating_sub(1);
        for x in 0..width {
            terrain.set(x, 0, WALL_TILE, true);
            terrain.set(x, bottom, WALL_TILE, true);
        }
        for y in 0..height {
            terrain.set(0, y, WALL_TILE, true);
            terrain.set(right, y, WALL_TILE, true);
        }
        Ok(terrain)
    }

    /// Width in tiles.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// The tile at `(x, y)`, or `None` outside the grid.
    pub fn tile(&self, x: usize, y: usize) -> Option<u16> {
        self.tiles.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Whether `(x, y)` is blocked. Cells outside the grid are blocked.
    pub fn is_blocked(&self, x: usize, y: usize) -> bool {
        self.hitmap
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(true)
    }

    /// Whether every cell in the inclusive rectangle is passable.
    pub fn is_area_passable(&self, left: usize, top: usize, right: usize, bottom: usize) -> bool {
        (top..=bottom).all(|y| (left..=right).all(|x| !self.is_blocked(x, y)))
    }

    /// Overwrite one cell. Returns `false` if `(x, y)` is outside the grid.
    pub fn set(&mut self, x: usize, y: usize, tile: u16, blocked: bool) -> bool {
        let Some(tile_slot) = self.tiles.get_mut(y).and_then(|row| row.get_mut(x)) else {
            return false;
        };
        *tile_slot = tile;
        if let Some(hit_slot) = self.hitmap.get_mut(y).and_then(|row| row.get_mut(x)) {
            *hit_slot = blocked;
        }
        true
    }

    /// Overwrite the inclusive rectangle; cells outside the grid are skipped.
    pub fn fill(&mut self, left: usize, top: usize, right: usize, bottom: usize, tile: u16, blocked: bool) {
        for y in top..=bottom {
            for x in left..=right {
                self.set(x, y, tile, blocked);
            }
        }
    }

    /// Number of passable cells.
    pub fn passable_count(&self) -> usize {
        self.hitmap
            .iter()
            .map(|row| row.iter().filter(|blocked| !**blocked).count())
            .sum()
    }
}

/// Renders the JSON member list sent to clients:
/// `"width": W, "height": H, "level": [[...]], "hitmap": [[...]]`.
///
/// There are no enclosing braces; the region appends its own members.
impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"width\": {}, \"height\": {}, \"level\": ", self.width, self.height)?;
        write_grid(f, &self.tiles, |f, tile| write!(f, "{tile}"))?;
        f.write_str(", \"hitmap\": ")?;
        write_grid(f, &self.hitmap, |f, blocked| write!(f, "{blocked}"))
    }
}

fn write_grid<T>(
    f: &mut fmt::Formatter<'_>,
    rows: &[Vec<T>],
    cell: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    f.write_str("[")?;
    for (y, row) in rows.iter().enumerate() {
        if y > 0 {
            f.write_str(",")?;
        }
        f.write_str("[")?;
        for (x, value) in row.iter().enumerate() {
            if x > 0 {
                f.write_str(",")?;
            }
            cell(f, value)?;
        }
        f.write_str("]")?;
    }
    f.write_str("]")
}

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// Produces terrain for regions.
///
/// `build` is called exactly once per region creation, followed by at most
/// one decoration hook chosen by [`Decoration::for_region`]. Decoration hooks
/// default to doing nothing.
pub trait TerrainProvider: Send + Sync {
    /// Build the base terrain for a region.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the terrain data cannot be produced.
    fn build(&self, region: &RegionId) -> Result<Terrain, WorldError>;

    /// Decorate the spawn town.
    fn apply_town(&self, _terrain: &mut Terrain) {}

    /// Decorate the field that holds the dungeon entrance.
    fn apply_dungeon_entrance(&self, _terrain: &mut Terrain) {}

    /// Decorate a dungeon level. `parent` is the region the dungeon sits in.
    fn apply_dungeon(&self, _parent: &RegionId, _terrain: &mut Terrain) {}

    /// Decorate a shop interior.
    fn apply_shop_interior(&self, _terrain: &mut Terrain) {}

    /// Decorate a house interior.
    fn apply_house_interior(&self, _terrain: &mut Terrain) {}

    /// Name of the client tileset for a region kind in a root world.
    fn tileset(&self, root: RootWorld, region_type: &RegionType) -> String;
}

/// The one-time decoration a freshly built region receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// Spawn town.
    Town,
    /// Field with the dungeon entrance.
    DungeonEntrance,
    /// Dungeon level.
    Dungeon,
    /// Shop interior.
    ShopInterior,
    /// House interior.
    HouseInterior,
}

impl Decoration {
    /// Pick the decoration for a region. The first matching rule wins, in
    /// variant order.
    pub fn for_region(region: &RegionId) -> Option<Self> {
        if region.is_town() {
            return Some(Self::Town);
        }
        if region.is_dungeon_entrance() {
            return Some(Self::DungeonEntrance);
        }
        match region.region_type() {
            RegionType::Dungeon => Some(Self::Dungeon),
            RegionType::Shop => Some(Self::ShopInterior),
            RegionType::House => Some(Self::HouseInterior),
            RegionType::Field | RegionType::Other(_) => None,
        }
    }
}

/// Build and decorate the terrain for a region.
///
/// # Errors
///
/// Propagates the provider's [`WorldError`].
pub fn generate(provider: &dyn TerrainProvider, region: &RegionId) -> Result<Terrain, WorldError> {
    let mut terrain = provider.build(region)?;
    match Decoration::for_region(region) {
        Some(Decoration::Town) => provider.apply_town(&mut terrain),
        Some(Decoration::DungeonEntrance) => provider.apply_dungeon_entrance(&mut terrain),
        Some(Decoration::Dungeon) => {
            if let Some(parent) = region.parent_region() {
                provider.apply_dungeon(&parent, &mut terrain);
            }
        }
        Some(Decoration::ShopInterior) => provider.apply_shop_interior(&mut terrain),
        Some(Decoration::HouseInterior) => provider.apply_house_interior(&mut terrain),
        None => {}
    }
    Ok(terrain)
}

// ---------------------------------------------------------------------------
// Built-in provider
// ---------------------------------------------------------------------------

/// Dimensions of the shop room, centered in the region.
const SHOP_ROOM: (usize, usize) = (20, 14);
/// Dimensions of the house room, centered in the region.
const HOUSE_ROOM: (usize, usize) = (16, 12);
/// Spacing between dungeon pillars.
const PILLAR_SPACING: usize = 6;

/// Walled open terrain of a fixed size with simple decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatTerrainProvider {
    width: usize,
    height: usize,
}

impl FlatTerrainProvider {
    /// Create a provider producing `width` x `height` regions.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either side is smaller
    /// than [`MIN_DIMENSION`].
    pub const fn new(width: usize, height: usize) -> Result<Self, WorldError> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    fn center(terrain: &Terrain) -> (usize, usize) {
        (terrain.width() / 2, terrain.height() / 2)
    }

    /// Wall off everything outside a centered `room` and floor the inside.
    fn carve_room(terrain: &mut Terrain, room: (usize, usize)) {
        let width = room.0.min(terrain.width().saturating_sub(2));
        let height = room.1.min(terrain.height().saturating_sub(2));
        let left = terrain.width().saturating_sub(width) / 2;
        let top = terrain.height().saturating_sub(height) / 2;
        let right = left.saturating_add(width).saturating_sub(1);
        let bottom = top.saturating_add(height).saturating_sub(1);

        let max_x = terrain.width().saturating_sub(1);
        let max_y = terrain.height().saturating_sub(1);
        terrain.fill(0, 0, max_x, max_y, WALL_TILE, true);
        terrain.fill(
            left.saturating_add(1),
            top.saturating_add(1),
            right.saturating_sub(1),
            bottom.saturating_sub(1),
            FLOOR_TILE,
            false,
        );
    }
}

impl TerrainProvider for FlatTerrainProvider {
    fn build(&self, _region: &RegionId) -> Result<Terrain, WorldError> {
        Terrain::walled(self.width, self.height)
    }

    fn apply_town(&self, terrain: &mut Terrain) {
        let (cx, cy) = Self::center(terrain);
        terrain.fill(
            cx.saturating_sub(1),
            cy.saturating_sub(1),
            cx,
            cy,
            FEATURE_TILE,
            true,
        );
    }

    fn apply_dungeon_entrance(&self, terrain: &mut Terrain) {
        let (cx, cy) = Self::center(terrain);
        terrain.set(cx, cy, PORTAL_TILE, false);
    }

    fn apply_dungeon(&self, _parent: &RegionId, terrain: &mut Terrain) {
        let max_x = terrain.width().saturating_sub(2);
        let max_y = terrain.height().saturating_sub(2);
        terrain.fill(1, 1, max_x, max_y, FLOOR_TILE, false);
        for y in (PILLAR_SPACING..max_y).step_by(PILLAR_SPACING) {
            for x in (PILLAR_SPACING..max_x).step_by(PILLAR_SPACING) {
                terrain.set(x, y, FEATURE_TILE, true);
            }
        }
    }

    fn apply_shop_interior(&self, terrain: &mut Terrain) {
        Self::carve_room(terrain, SHOP_ROOM);
    }

    fn apply_house_interior(&self, terrain: &mut Terrain) {
        Self::carve_room(terrain, HOUSE_ROOM);
    }

    fn tileset(&self, root: RootWorld, region_type: &RegionType) -> String {
        let name = match (root, region_type) {
            (_, RegionType::Dungeon) => "tileset_dungeon",
            (_, kind) if kind.is_interior() => "tileset_interior",
            (RootWorld::Ether, _) => "tileset_ether",
            (RootWorld::Overworld, _) => "tileset_default",
        };
        name.to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(s: &str) -> RegionId {
        s.parse().unwrap()
    }

    #[test]
    fn walled_terrain_blocks_the_border() {
        let terrain = Terrain::walled(10, 8).unwrap();
        assert!(terrain.is_blocked(0, 3));
        assert!(terrain.is_blocked(9, 3));
        assert!(terrain.is_blocked(4, 0));
        assert!(terrain.is_blocked(4, 7));
        assert!(!terrain.is_blocked(4, 3));
        assert!(terrain.is_blocked(40, 3));
        assert_eq!(terrain.passable_count(), 8 * 6);
    }

    #[test]
    fn tiny_terrain_is_rejected() {
        assert!(matches!(
            Terrain::walled(3, 20),
            Err(WorldError::InvalidDimensions { width: 3, height: 20 })
        ));
        assert!(FlatTerrainProvider::new(20, 2).is_err());
    }

    #[test]
    fn display_is_a_json_member_list() {
        let terrain = Terrain::walled(8, 8).unwrap();
        let wrapped = format!("{{{terrain}}}");
        let value: serde_json::Value = serde_json::from_str(&wrapped).unwrap();
        assert_eq!(value["width"], 8);
        assert_eq!(value["height"], 8);
        assert_eq!(value["level"][0][0], u64::from(WALL_TILE));
        assert_eq!(value["hitmap"][3][3], false);
        assert_eq!(value["hitmap"][0][3], true);
    }

    #[test]
    fn decoration_dispatch() {
        let cases = [
            ("overworld,field:0:0", Some(Decoration::Town)),
            ("ether,field:0:0", Some(Decoration::Town)),
            ("overworld,field:1:0", Some(Decoration::DungeonEntrance)),
            ("overworld,field:5:5", None),
            ("overworld,field:1:0,dungeon:0:0", Some(Decoration::Dungeon)),
            ("overworld,field:5:5,shop:0:0", Some(Decoration::ShopInterior)),
            ("overworld,field:5:5,house:0:0", Some(Decoration::HouseInterior)),
            ("overworld,field:5:5,cave:0:0", None),
        ];
        for (case, expected) in cases {
            assert_eq!(Decoration::for_region(&id(case)), expected, "{case}");
        }
    }

    #[test]
    fn flat_provider_decorates() {
        let provider = FlatTerrainProvider::new(30, 30).unwrap();

        let town = generate(&provider, &id("overworld,field:0:0")).unwrap();
        assert_eq!(town.tile(15, 15), Some(FEATURE_TILE));
        assert!(town.is_blocked(14, 14));

        let entrance = generate(&provider, &id("overworld,field:1:0")).unwrap();
        assert_eq!(entrance.tile(15, 15), Some(PORTAL_TILE));
        assert!(!entrance.is_blocked(15, 15));

        let dungeon = generate(&provider, &id("overworld,field:1:0,dungeon:0:0")).unwrap();
        assert!(dungeon.is_blocked(6, 6));
        assert_eq!(dungeon.tile(7, 7), Some(FLOOR_TILE));

        let shop = generate(&provider, &id("overworld,field:3:3,shop:0:0")).unwrap();
        assert!(shop.is_blocked(2, 2));
        assert!(!shop.is_blocked(15, 15));
        assert_eq!(shop.passable_count(), 18 * 12);
    }

    #[test]
    fn tilesets_follow_world_and_type() {
        let provider = FlatTerrainProvider::new(10, 10).unwrap();
        assert_eq!(provider.tileset(RootWorld::Overworld, &RegionType::Field), "tileset_default");
        assert_eq!(provider.tileset(RootWorld::Ether, &RegionType::Field), "tileset_ether");
        assert_eq!(provider.tileset(RootWorld::Ether, &RegionType::Dungeon), "tileset_dungeon");
        assert_eq!(provider.tileset(RootWorld::Overworld, &RegionType::House), "tileset_interior");
        assert_eq!(provider.tileset(RootWorld::Ether, &RegionType::Shop), "tileset_interior");
        let cave = RegionType::Other(String::from("cave"));
        assert_eq!(provider.tileset(RootWorld::Ether, &cave), "tileset_ether");
    }
}
