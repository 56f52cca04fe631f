//! Elevation field synthesis.
//!
//! Each cell is a single layered-noise evaluation of the elevation stream at
//! the level's transform of that cell, scaled onto the 0-255 byte range.
//! Rows are independent pure computations, so they are filled in parallel.

use noise::Simplex;
use rayon::prelude::*;

use crate::levels::{Level, Position};
use crate::octaves::layered_noise;
use crate::seeds::MapSeeds;
use crate::tilemap::Tilemap;

/// Generate a `size x size` elevation grid for a tile.
pub fn make_elevation(
    seeds: &MapSeeds,
    size: usize,
    level: Level,
    position: Position,
) -> Tilemap<u8> {
    let source = Simplex::new(seeds.elevation as u32);
    let params = level.octaves();

    let mut elevation = Tilemap::new_with(size, size, 0u8);
    elevation
        .data_mut()
        .par_chunks_mut(size)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let (nx, ny) = level.transform(x, y, position, size);
                let value = layered_noise(&source, &params, nx, ny) * 255.0;
                *cell = value.round().clamp(0.0, 255.0) as u8;
            }
        });
    elevation
}
