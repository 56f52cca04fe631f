//! Tile synthesis: the full per-tile field stack.
//!
//! A tile is the unit of generation. `generate` runs elevation, temperature,
//! rainfall and biome classification for one `(level, position)` window and
//! reports per-field min/max stats. River overlays are merged in by the
//! store, since the network is shared across tiles.

use serde::{Deserialize, Serialize};

use crate::biomes;
use crate::climate::{make_rainfall, make_temperature};
use crate::error::{GenError, GenResult};
use crate::heightfield::make_elevation;
use crate::levels::{Level, Position};
use crate::seeds::MapSeeds;
use crate::tilemap::Tilemap;

/// Map-wide generation settings; everything a save must carry to reproduce
/// its tiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    pub seed: u64,
    /// Side length of every tile, in cells.
    pub size: usize,
    /// Elevation threshold partitioning land from water.
    pub sealevel: u8,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            size: 250,
            sealevel: 150,
        }
    }
}

impl MapSettings {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> GenResult<()> {
        if self.size == 0 {
            return Err(GenError::Config("tile size must be at least 1".to_string()));
        }
        for level in Level::all() {
            level.octaves().validate()?;
        }
        Ok(())
    }

    pub fn seeds(&self) -> MapSeeds {
        MapSeeds::from_master(self.seed)
    }
}

/// Min/max of one scalar field, for display and calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f32,
    pub max: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileStats {
    pub elevation: FieldStats,
    pub temperature: FieldStats,
    pub rainfall: FieldStats,
}

/// One generated tile: four co-indexed grids plus the river overlay and
/// provenance metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub level: Level,
    pub position: Position,
    pub elevation: Tilemap<u8>,
    pub temperature: Tilemap<f32>,
    pub rainfall: Tilemap<f32>,
    pub biome: Tilemap<u8>,
    /// Binary river mask; all-zero for levels without an overlay.
    pub rivers: Tilemap<u8>,
    pub stats: TileStats,
}

fn stats_of_u8(grid: &Tilemap<u8>) -> FieldStats {
    let (min, max) = grid.min_max().unwrap_or((0, 0));
    FieldStats {
        min: min as f32,
        max: max as f32,
    }
}

fn stats_of_f32(grid: &Tilemap<f32>) -> FieldStats {
    let (min, max) = grid.min_max().unwrap_or((0.0, 0.0));
    FieldStats { min, max }
}

/// Synthesize one tile. Fails on invalid settings or a biome rule-table gap;
/// a failed synthesis returns nothing cacheable.
pub fn generate(settings: &MapSettings, level: Level, position: Position) -> GenResult<Tile> {
    settings.validate()?;
    let seeds = settings.seeds();
    let size = settings.size;

    let elevation = make_elevation(&seeds, size, level, position);
    let temperature = make_temperature(&elevation, size, level, position);
    let rainfall = make_rainfall(&seeds, size, level, position);

    let mut biome = Tilemap::new_with(size, size, 0u8);
    for y in 0..size {
        for x in 0..size {
            let t = *temperature.get(x, y);
            let r = *rainfall.get(x, y);
            let e = *elevation.get(x, y);
            let matched = biomes::classify(t, r, e, settings.sealevel).ok_or(
                GenError::Classification {
                    x,
                    y,
                    temperature: t,
                    rainfall: r,
                    elevation: e,
                },
            )?;
            biome.set(x, y, matched.id());
        }
    }

    let stats = TileStats {
        elevation: stats_of_u8(&elevation),
        temperature: stats_of_f32(&temperature),
        rainfall: stats_of_f32(&rainfall),
    };

    Ok(Tile {
        level,
        position,
        elevation,
        temperature,
        rainfall,
        biome,
        rivers: Tilemap::new_with(size, size, 0u8),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::{Biome, Domain};

    fn settings(seed: u64, size: usize) -> MapSettings {
        MapSettings {
            seed,
            size,
            sealevel: 150,
        }
    }

    #[test]
    fn test_seed_42_world_tile_reproduces() {
        let s = settings(42, 4);
        let a = generate(&s, Level::World, Position::default()).unwrap();
        let b = generate(&s, Level::World, Position::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.elevation.width, 4);
        assert_eq!(a.elevation.height, 4);
    }

    #[test]
    fn test_seed_43_differs() {
        let a = generate(&settings(42, 4), Level::World, Position::default()).unwrap();
        let b = generate(&settings(43, 4), Level::World, Position::default()).unwrap();
        assert_ne!(a.elevation, b.elevation);
    }

    #[test]
    fn test_range_invariants() {
        let tile = generate(&settings(42, 32), Level::World, Position::default()).unwrap();
        for (_, _, &t) in tile.temperature.iter() {
            assert!((-30.0..35.0).contains(&t));
        }
        for (_, _, &r) in tile.rainfall.iter() {
            assert!((0.0..=7000.0).contains(&r));
        }
        for (_, _, &b) in tile.biome.iter() {
            assert!(Biome::from_id(b).is_some());
        }
    }

    #[test]
    fn test_land_water_partition_consistency() {
        let s = settings(42, 32);
        let tile = generate(&s, Level::World, Position::default()).unwrap();
        for (x, y, &id) in tile.biome.iter() {
            let biome = Biome::from_id(id).unwrap();
            let elevation = *tile.elevation.get(x, y);
            match biome.domain() {
                Domain::Land => assert!(elevation > s.sealevel),
                Domain::Water => assert!(elevation <= s.sealevel),
            }
        }
    }

    #[test]
    fn test_stats_bracket_fields() {
        let tile = generate(&settings(7, 16), Level::World, Position::default()).unwrap();
        let (min, max) = tile.elevation.min_max().unwrap();
        assert_eq!(tile.stats.elevation.min, min as f32);
        assert_eq!(tile.stats.elevation.max, max as f32);
        assert!(tile.stats.rainfall.min >= 0.0);
        assert!(tile.stats.rainfall.max <= 7000.0);
    }

    #[test]
    fn test_zero_size_rejected() {
        let s = settings(42, 0);
        assert!(matches!(
            generate(&s, Level::World, Position::default()),
            Err(GenError::Config(_))
        ));
    }

    #[test]
    fn test_all_levels_generate() {
        for &level in Level::all() {
            let tile = generate(&settings(3, 8), level, Position::default()).unwrap();
            assert_eq!(tile.level, level);
        }
    }
}
