//! Coastal detection and river network growth.
//!
//! Rivers are seeded at coastal cells of the world-level elevation field and
//! grown uphill over the region-resolution elevation field: each step moves
//! to 4-connected neighbors whose elevation is at least the current cell's
//! and above sea level, occasionally forking into two branches. The walk is
//! strictly non-decreasing in elevation and never revisits a marked cell, so
//! it terminates on plateaus and at local ridges. The persisted artifact is
//! the flattened mask pair, not the growth tree.

use noise::Simplex;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

use crate::levels::{Level, OctaveParams, Position};
use crate::octaves::layered_noise;
use crate::seeds::MapSeeds;
use crate::tilemap::Tilemap;

/// Probability that a growth step forks into two branches.
const BRANCH_CHANCE: f64 = 0.05;

/// Fraction of tile size used for the base river source count.
const SOURCE_FRACTION: f64 = 0.1;

/// Elevation lookup at region resolution. The provider is mutable because
/// implementations may compute cells on demand.
pub trait ElevationSource {
    /// Side length of the (square) elevation field.
    fn dim(&self) -> usize;
    fn elevation_at(&mut self, x: usize, y: usize) -> u8;
}

impl ElevationSource for Tilemap<u8> {
    fn dim(&self) -> usize {
        self.width
    }

    fn elevation_at(&mut self, x: usize, y: usize) -> u8 {
        *self.get(x, y)
    }
}

/// Region-resolution elevation computed on demand and memoized per cell.
///
/// An explicit `Option` slot distinguishes "not yet computed" from a
/// legitimately zero elevation. Values are identical to the cells of region
/// tiles generated from the same seeds, since both go through the same
/// transform and noise stream.
pub struct RegionElevationProvider {
    source: Simplex,
    params: OctaveParams,
    size: usize,
    dim: usize,
    cells: Vec<Option<u8>>,
}

impl RegionElevationProvider {
    pub fn new(seeds: &MapSeeds, size: usize) -> Self {
        let dim = size * Level::Region.zoom_scale() as usize;
        Self {
            source: Simplex::new(seeds.elevation as u32),
            params: Level::Region.octaves(),
            size,
            dim,
            cells: vec![None; dim * dim],
        }
    }
}

impl ElevationSource for RegionElevationProvider {
    fn dim(&self) -> usize {
        self.dim
    }

    fn elevation_at(&mut self, x: usize, y: usize) -> u8 {
        let idx = y * self.dim + x;
        if let Some(value) = self.cells[idx] {
            return value;
        }
        let (nx, ny) = Level::Region.transform(x, y, Position::default(), self.size);
        let value = (layered_noise(&self.source, &self.params, nx, ny) * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8;
        self.cells[idx] = Some(value);
        value
    }
}

/// The two river masks produced by one build pass: the full-resolution
/// regional mask and its floor-divided world-resolution reduction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RiverNetwork {
    pub regional: Tilemap<u8>,
    pub world: Tilemap<u8>,
}

impl RiverNetwork {
    fn empty(world_size: usize, regional_dim: usize) -> Self {
        Self {
            regional: Tilemap::new_with(regional_dim, regional_dim, 0u8),
            world: Tilemap::new_with(world_size, world_size, 0u8),
        }
    }
}

/// Land cells 4-adjacent to at least one below-sea-level cell, in row-major
/// order (the order matters: it feeds a seeded shuffle).
pub fn find_coastal_cells(world_elevation: &Tilemap<u8>, sealevel: u8) -> Vec<(usize, usize)> {
    let mut coastal = Vec::new();
    for y in 0..world_elevation.height {
        for x in 0..world_elevation.width {
            if *world_elevation.get(x, y) <= sealevel {
                continue;
            }
            let touches_water = world_elevation
                .neighbors4(x, y)
                .into_iter()
                .any(|(nx, ny)| *world_elevation.get(nx, ny) < sealevel);
            if touches_water {
                coastal.push((x, y));
            }
        }
    }
    coastal
}

/// Build the river network for a map.
///
/// Zero valid coastal cells produce empty masks, not an error.
pub fn build_rivers(
    world_elevation: &Tilemap<u8>,
    region_elevation: &mut impl ElevationSource,
    sealevel: u8,
    river_seed: u64,
) -> RiverNetwork {
    let size = world_elevation.width;
    let dim = region_elevation.dim();
    let zoom = dim / size;
    let mut network = RiverNetwork::empty(size, dim);
    let mut rng = ChaCha8Rng::seed_from_u64(river_seed);

    // Project coastal world cells to region resolution, dropping any whose
    // finer-resolution elevation is no longer above sea level.
    let mut candidates: Vec<(usize, usize)> = find_coastal_cells(world_elevation, sealevel)
        .into_iter()
        .map(|(x, y)| (x * zoom, y * zoom))
        .filter(|&(x, y)| region_elevation.elevation_at(x, y) > sealevel)
        .collect();

    if candidates.is_empty() {
        return network;
    }

    // Source count is seed-dependent and proportional to tile size.
    let base = (size as f64 * SOURCE_FRACTION).round() as usize;
    let num_rivers = base + rng.gen_range(0..=base);
    candidates.shuffle(&mut rng);
    candidates.truncate(num_rivers.min(candidates.len()));

    for (sx, sy) in candidates {
        grow_river(&mut network.regional, region_elevation, sealevel, (sx, sy), &mut rng);
    }

    downsample_mask(&network.regional, &mut network.world, zoom);
    network
}

/// Grow one branching uphill tree from a source cell, marking the regional
/// mask. Worklist-based; cells are marked before being pushed so no cell is
/// ever expanded twice.
fn grow_river(
    mask: &mut Tilemap<u8>,
    elevation: &mut impl ElevationSource,
    sealevel: u8,
    source: (usize, usize),
    rng: &mut ChaCha8Rng,
) {
    if *mask.get(source.0, source.1) != 0 {
        return;
    }
    mask.set(source.0, source.1, 1);
    let mut stack = vec![source];

    while let Some((x, y)) = stack.pop() {
        let current = elevation.elevation_at(x, y);
        let branches = if rng.gen_bool(BRANCH_CHANCE) { 2 } else { 1 };

        let mut candidates: Vec<((usize, usize), u8)> = mask
            .neighbors4(x, y)
            .into_iter()
            .filter(|&(nx, ny)| *mask.get(nx, ny) == 0)
            .filter_map(|(nx, ny)| {
                let e = elevation.elevation_at(nx, ny);
                (e >= current && e > sealevel).then_some(((nx, ny), e))
            })
            .collect();
        // Lowest-elevation candidates first; stable sort keeps traversal
        // order on ties.
        candidates.sort_by_key(|&(_, e)| e);

        for &((nx, ny), _) in candidates.iter().take(branches) {
            mask.set(nx, ny, 1);
            stack.push((nx, ny));
        }
    }
}

/// OR-reduce the regional mask into the world mask by flooring coordinates.
fn downsample_mask(regional: &Tilemap<u8>, world: &mut Tilemap<u8>, zoom: usize) {
    for (x, y, &marked) in regional.iter() {
        if marked != 0 {
            world.set(x / zoom, y / zoom, 1);
        }
    }
}
