//! Initial population of freshly created regions.
//!
//! Population runs exactly once per region, before the region is published,
//! so nothing else can touch the occupant list while it happens.
//!
//! # Determinism
//!
//! The generator is seeded from the product of the region's coordinates, so
//! the same coordinates always ask for the same number and mix of entities.
//! Regions at different depths that share coordinates share a seed.
//!
//! # Placement
//!
//! Positions are sampled uniformly inside the terrain, keeping a margin for
//! the entity's footprint, until every footprint cell is passable. Sampling
//! is capped at `placement_attempts`; after that the first passable position
//! in row-major order is used. If there is none the entity is skipped.

use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realm_types::{RegionId, RegionType};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::entity::{Entity, EntityFactory};
use crate::error::WorldError;
use crate::terrain::Terrain;

/// Common roaming creature in fields.
pub const COMMON_CREATURE: &str = "sheep";
/// Rare roaming creature in fields.
pub const RARE_CREATURE: &str = "wolf";
/// Ambient resident of shops and houses.
pub const RESIDENT: &str = "homely";

/// Population parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Exclusive upper bound on creatures in a field.
    #[serde(default = "default_max_field_entities")]
    pub max_field_entities: u32,

    /// Every `rare_odds`-th creature (by index, starting at 0) is rare.
    /// Zero disables rare creatures.
    #[serde(default = "default_rare_odds")]
    pub rare_odds: u32,

    /// Residents placed in a shop.
    #[serde(default = "default_shop_residents")]
    pub shop_residents: u32,

    /// Residents placed in a house.
    #[serde(default = "default_house_residents")]
    pub house_residents: u32,

    /// Random placement samples before falling back to a scan.
    #[serde(default = "default_placement_attempts")]
    pub placement_attempts: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            max_field_entities: default_max_field_entities(),
            rare_odds: default_rare_odds(),
            shop_residents: default_shop_residents(),
            house_residents: default_house_residents(),
            placement_attempts: default_placement_attempts(),
        }
    }
}

const fn default_max_field_entities() -> u32 {
    6
}

const fn default_rare_odds() -> u32 {
    4
}

const fn default_shop_residents() -> u32 {
    3
}

const fn default_house_residents() -> u32 {
    2
}

const fn default_placement_attempts() -> u32 {
    64
}

/// Seed for a region's population generator: `x * y`.
pub fn population_seed(region: &RegionId) -> u64 {
    let product = i64::from(region.x()).wrapping_mul(i64::from(region.y()));
    u64::from_le_bytes(product.to_le_bytes())
}

/// Seeds new regions with their initial occupants.
pub struct EntityPopulator<'a> {
    config: &'a PopulationConfig,
    factory: &'a dyn EntityFactory,
}

impl<'a> EntityPopulator<'a> {
    /// Create a populator drawing entities from `factory`.
    pub const fn new(config: &'a PopulationConfig, factory: &'a dyn EntityFactory) -> Self {
        Self { config, factory }
    }

    /// The entity kinds a region asks for, in spawn order.
    pub fn plan(&self, region: &RegionId) -> Vec<&'static str> {
        let mut rng = StdRng::seed_from_u64(population_seed(region));
        self.plan_with(region, &mut rng)
    }

    fn plan_with(&self, region: &RegionId, rng: &mut StdRng) -> Vec<&'static str> {
        match region.region_type() {
            RegionType::Field => {
                let count = if self.config.max_field_entities == 0 {
                    0
                } else {
                    rng.random_range(0..self.config.max_field_entities)
                };
                (0..count)
                    .map(|index| {
                        if index.checked_rem(self.config.rare_odds) == Some(0) {
                            RARE_CREATURE
                        } else {
                            COMMON_CREATURE
                        }
                    })
                    .collect()
            }
            RegionType::Shop => residents(self.config.shop_residents),
            RegionType::House => residents(self.config.house_residents),
            RegionType::Dungeon | RegionType::Other(_) => Vec::new(),
        }
    }

    /// Spawn and place the initial occupants of a region.
    ///
    /// Entities are returned in spawn order with their location and position
    /// already set. The caller adds them to the region.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityUnavailable`] if the factory cannot create
    /// one of the planned kinds.
    pub fn populate(
        &self,
        region: &RegionId,
        terrain: &Terrain,
    ) -> Result<Vec<Arc<dyn Entity>>, WorldError> {
        let mut rng = StdRng::seed_from_u64(population_seed(region));
        let plan = self.plan_with(region, &mut rng);
        let mut spawned = Vec::with_capacity(plan.len());

        for kind in plan {
            let entity = self.factory.spawn(kind)?;
            entity.set_location(region);

            let Some((x, y)) = self.place(&mut rng, terrain, entity.footprint()) else {
                warn!(region = %region, kind, "no passable position, skipping entity");
                continue;
            };
            entity.set_position(to_position(x), to_position(y));
            debug!(region = %region, kind, x, y, "placed entity");
            spawned.push(entity);
        }

        Ok(spawned)
    }

    /// Find a position whose footprint is entirely passable.
    ///
    /// `(x, y)` is the bottom-left footprint cell; the footprint extends
    /// `width` cells right and `height` cells up from it.
    fn place(
        &self,
        rng: &mut StdRng,
        terrain: &Terrain,
        (width, height): (usize, usize),
    ) -> Option<(usize, usize)> {
        let xs = span(1, terrain.width().checked_sub(width.checked_add(2)?)?)?;
        let ys = span(height.checked_add(1)?, terrain.height().checked_sub(2)?)?;

        let fits = |x: usize, y: usize| {
            terrain.is_area_passable(x, y.saturating_sub(height), x.saturating_add(width), y)
        };

        for _ in 0..self.config.placement_attempts {
            let x = rng.random_range(xs.clone());
            let y = rng.random_range(ys.clone());
            if fits(x, y) {
                return Some((x, y));
            }
        }

        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .find(|&(x, y)| fits(x, y))
    }
}

fn residents(count: u32) -> Vec<&'static str> {
    (0..count).map(|_| RESIDENT).collect()
}

fn span(low: usize, high: usize) -> Option<RangeInclusive<usize>> {
    (low <= high).then_some(low..=high)
}

fn to_position(tile: usize) -> f64 {
    u32::try_from(tile).map_or(f64::from(u32::MAX), f64::from)
}
