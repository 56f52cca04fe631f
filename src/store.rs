//! Tile store: keyed cache over the synthesis pipeline.
//!
//! Each key moves Absent -> Generating -> Cached. Synthesis runs outside the
//! lock; concurrent `get` calls for a key that is already generating wait on
//! a condvar instead of duplicating work, so at most one synthesis runs per
//! key. A failed synthesis clears the in-flight marker and never populates
//! the cache. The river network is cached the same way and shared by the
//! world and region tiles that overlay it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};
use crate::heightfield::make_elevation;
use crate::levels::{Level, Position};
use crate::rivers::{build_rivers, RegionElevationProvider, RiverNetwork};
use crate::tile::{generate, MapSettings, Tile};

/// Cache key for a tile. Region and sector coordinates are in tile units at
/// their own level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKey {
    World,
    Region { x: i64, y: i64 },
    Sector { rx: i64, ry: i64, sx: i64, sy: i64 },
}

impl TileKey {
    pub fn level(&self) -> Level {
        match self {
            TileKey::World => Level::World,
            TileKey::Region { .. } => Level::Region,
            TileKey::Sector { .. } => Level::Sector,
        }
    }

    /// Absolute offset of the tile's origin in its level's grid units.
    pub fn position(&self, size: usize) -> Position {
        let size = size as i64;
        match *self {
            TileKey::World => Position::default(),
            TileKey::Region { x, y } => Position::new(x * size, y * size),
            TileKey::Sector { rx, ry, sx, sy } => {
                let zoom = Level::Sector.zoom_scale() as i64;
                Position::new(rx * size * zoom + sx * size, ry * size * zoom + sy * size)
            }
        }
    }

    /// World and region tiles carry the river overlay; finer levels do not.
    pub fn has_river_overlay(&self) -> bool {
        matches!(self, TileKey::World | TileKey::Region { .. })
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TileKey::World => write!(f, "world"),
            TileKey::Region { x, y } => write!(f, "{}.{}", x, y),
            TileKey::Sector { rx, ry, sx, sy } => write!(f, "{}.{}-{}.{}", rx, ry, sx, sy),
        }
    }
}

impl FromStr for TileKey {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn pair(s: &str) -> Option<(i64, i64)> {
            let (x, y) = s.split_once('.')?;
            Some((x.parse().ok()?, y.parse().ok()?))
        }
        // Coordinates may be negative, so the region/sector separator is
        // the '-' that follows a digit, never one opening a number.
        fn split_sector(s: &str) -> Option<(&str, &str)> {
            let bytes = s.as_bytes();
            (1..bytes.len())
                .find(|&i| bytes[i] == b'-' && bytes[i - 1].is_ascii_digit())
                .map(|i| (&s[..i], &s[i + 1..]))
        }
        if s == "world" {
            return Ok(TileKey::World);
        }
        if let Some((region, sector)) = split_sector(s) {
            let ((rx, ry), (sx, sy)) = pair(region).zip(pair(sector)).ok_or_else(|| {
                GenError::Serialization(format!("malformed sector key \"{}\"", s))
            })?;
            return Ok(TileKey::Sector { rx, ry, sx, sy });
        }
        let (x, y) = pair(s)
            .ok_or_else(|| GenError::Serialization(format!("malformed region key \"{}\"", s)))?;
        Ok(TileKey::Region { x, y })
    }
}

enum TileSlot {
    Generating,
    Cached(Arc<Tile>),
}

enum RiverSlot {
    Absent,
    Building,
    Ready(Arc<RiverNetwork>),
}

struct StoreState {
    tiles: HashMap<TileKey, TileSlot>,
    rivers: RiverSlot,
    /// Bumped on every reset so in-flight generations know their result is
    /// stale and must not be cached.
    epoch: u64,
}

/// Generate-or-fetch cache for tiles of one map.
pub struct TileStore {
    settings: MapSettings,
    state: Mutex<StoreState>,
    cond: Condvar,
    generation_count: AtomicU64,
}

impl TileStore {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(StoreState {
                tiles: HashMap::new(),
                rivers: RiverSlot::Absent,
                epoch: 0,
            }),
            cond: Condvar::new(),
            generation_count: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Number of tile syntheses performed so far (cache misses).
    pub fn generation_count(&self) -> u64 {
        self.generation_count.load(Ordering::Relaxed)
    }

    /// Fetch a tile, generating it on first request.
    pub fn get(&self, key: TileKey) -> GenResult<Arc<Tile>> {
        let epoch = {
            let mut state = self.state.lock().unwrap();
            loop {
                match state.tiles.get(&key) {
                    Some(TileSlot::Cached(tile)) => return Ok(tile.clone()),
                    Some(TileSlot::Generating) => {
                        state = self.cond.wait(state).unwrap();
                    }
                    None => {
                        state.tiles.insert(key, TileSlot::Generating);
                        break state.epoch;
                    }
                }
            }
        };

        let result = self.synthesize(key);

        let mut state = self.state.lock().unwrap();
        if state.epoch == epoch {
            match &result {
                Ok(tile) => {
                    state.tiles.insert(key, TileSlot::Cached(tile.clone()));
                }
                Err(_) => {
                    state.tiles.remove(&key);
                }
            }
        }
        drop(state);
        self.cond.notify_all();
        result
    }

    /// Cache-aware accessor in the shape the UI layer calls: a level plus
    /// the coordinates that level requires.
    pub fn fetch_tile(
        &self,
        level: Level,
        region: Option<(i64, i64)>,
        sector: Option<(i64, i64)>,
    ) -> GenResult<Arc<Tile>> {
        let key = match level {
            Level::World => TileKey::World,
            Level::Region => {
                let (x, y) = region.ok_or_else(|| {
                    GenError::Config("region fetch requires a region coordinate".to_string())
                })?;
                TileKey::Region { x, y }
            }
            Level::Sector => {
                let ((rx, ry), (sx, sy)) = region.zip(sector).ok_or_else(|| {
                    GenError::Config(
                        "sector fetch requires region and sector coordinates".to_string(),
                    )
                })?;
                TileKey::Sector { rx, ry, sx, sy }
            }
            Level::Local => {
                return Err(GenError::Config(
                    "local tiles are generated directly, not cached".to_string(),
                ))
            }
        };
        self.get(key)
    }

    /// The shared river network, building it on first request.
    pub fn river_network(&self) -> GenResult<Arc<RiverNetwork>> {
        {
            let mut state = self.state.lock().unwrap();
            loop {
                match &state.rivers {
                    RiverSlot::Ready(network) => return Ok(network.clone()),
                    RiverSlot::Building => {
                        state = self.cond.wait(state).unwrap();
                    }
                    RiverSlot::Absent => {
                        state.rivers = RiverSlot::Building;
                        break;
                    }
                }
            }
        }

        let seeds = self.settings.seeds();
        let size = self.settings.size;
        let world = make_elevation(&seeds, size, Level::World, Position::default());
        let mut provider = RegionElevationProvider::new(&seeds, size);
        let network = Arc::new(build_rivers(
            &world,
            &mut provider,
            self.settings.sealevel,
            seeds.rivers,
        ));

        let mut state = self.state.lock().unwrap();
        if matches!(state.rivers, RiverSlot::Building) {
            state.rivers = RiverSlot::Ready(network.clone());
        }
        drop(state);
        self.cond.notify_all();
        Ok(network)
    }

    fn synthesize(&self, key: TileKey) -> GenResult<Arc<Tile>> {
        self.generation_count.fetch_add(1, Ordering::Relaxed);
        let position = key.position(self.settings.size);
        let mut tile = generate(&self.settings, key.level(), position)?;
        if key.has_river_overlay() {
            let network = self.river_network()?;
            self.apply_river_overlay(&mut tile, &key, &network);
        }
        Ok(Arc::new(tile))
    }

    /// Copy this tile's window of the river network into its mask.
    fn apply_river_overlay(&self, tile: &mut Tile, key: &TileKey, network: &RiverNetwork) {
        let size = self.settings.size;
        match *key {
            TileKey::World => {
                tile.rivers = network.world.clone();
            }
            TileKey::Region { x, y } => {
                let dim = network.regional.width as i64;
                for ly in 0..size {
                    for lx in 0..size {
                        let gx = x * size as i64 + lx as i64;
                        let gy = y * size as i64 + ly as i64;
                        if (0..dim).contains(&gx) && (0..dim).contains(&gy) {
                            let marked = *network.regional.get(gx as usize, gy as usize);
                            tile.rivers.set(lx, ly, marked);
                        }
                    }
                }
            }
            TileKey::Sector { .. } => {}
        }
    }

    /// Drop every cached tile and the river network, keeping the settings.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.tiles.clear();
        state.rivers = RiverSlot::Absent;
        state.epoch += 1;
        drop(state);
        self.cond.notify_all();
    }

    /// Replace the settings (seed or size change) and rebuild from scratch.
    pub fn set_settings(&mut self, settings: MapSettings) {
        self.settings = settings;
        self.reset();
    }

    /// Every cached tile, for serialization.
    pub fn cached_tiles(&self) -> Vec<(TileKey, Arc<Tile>)> {
        let state = self.state.lock().unwrap();
        let mut tiles: Vec<(TileKey, Arc<Tile>)> = state
            .tiles
            .iter()
            .filter_map(|(key, slot)| match slot {
                TileSlot::Cached(tile) => Some((*key, tile.clone())),
                TileSlot::Generating => None,
            })
            .collect();
        tiles.sort_by_key(|(key, _)| key.to_string());
        tiles
    }

    /// Seed the cache with already-generated tiles (load path).
    pub fn insert_cached(&self, key: TileKey, tile: Tile) {
        let mut state = self.state.lock().unwrap();
        state.tiles.insert(key, TileSlot::Cached(Arc::new(tile)));
    }
}
