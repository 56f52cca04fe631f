//! Temperature and rainfall field synthesis.
//!
//! Temperature ("radiation") is a pure function of the cell's latitude proxy
//! and its already-computed elevation; it samples no noise of its own, so it
//! is reproducible from the elevation grid plus the row index. Rainfall is
//! an independent noise stream combining a heavily damped high-frequency
//! profile with a broader low-frequency one.

use noise::Simplex;
use rayon::prelude::*;

use crate::levels::{Level, OctaveParams, Position};
use crate::octaves::layered_noise;
use crate::seeds::MapSeeds;
use crate::tilemap::Tilemap;

/// Coldest and total span of the output temperature range (Celsius).
pub const TEMP_FLOOR: f32 = -30.0;
pub const TEMP_SPAN: f32 = 65.0;

/// Maximum annual rainfall (mm).
pub const RAIN_CEILING: f32 = 7000.0;

/// Weight of the latitude factor vs the elevation factor.
const LATITUDE_WEIGHT: f64 = 0.65;
const ELEVATION_WEIGHT: f64 = 0.35;

/// Fold a 0..1 vertical ratio so the tile's vertical center maps to 1 and
/// both edges map to 0.
fn latitude_factor(ratio: f64) -> f64 {
    if ratio < 0.5 {
        ratio / 0.5
    } else {
        (1.0 - ratio) / 0.5
    }
}

/// Generate the temperature grid from the elevation grid.
pub fn make_temperature(
    elevation: &Tilemap<u8>,
    size: usize,
    level: Level,
    position: Position,
) -> Tilemap<f32> {
    let zoom = level.cumulative_zoom();
    let mut temperature = Tilemap::new_with(size, size, 0.0f32);
    temperature
        .data_mut()
        .par_chunks_mut(size)
        .enumerate()
        .for_each(|(y, row)| {
            let ty = (y as f64 + position.y as f64) / zoom;
            let lat = latitude_factor(ty / size as f64);
            for (x, cell) in row.iter_mut().enumerate() {
                let height_ratio = *elevation.get(x, y) as f64 / 255.0;
                let rad = LATITUDE_WEIGHT * lat + ELEVATION_WEIGHT * height_ratio;
                *cell = (rad * 1.1).clamp(0.0, 0.99) as f32 * TEMP_SPAN + TEMP_FLOOR;
            }
        });
    temperature
}

/// Generate the rainfall grid from the rainfall noise stream.
pub fn make_rainfall(
    seeds: &MapSeeds,
    size: usize,
    level: Level,
    position: Position,
) -> Tilemap<f32> {
    let source = Simplex::new(seeds.rainfall as u32);
    let octaves = level.octaves().num_iterations;
    // Damped high-frequency detail and a broader low-frequency base.
    let fine = OctaveParams {
        num_iterations: octaves,
        persistence: 0.1,
        init_frequency: 35.0,
        max_amp: 10.0,
    };
    let broad = OctaveParams {
        num_iterations: octaves,
        persistence: 0.3,
        init_frequency: 4.0,
        max_amp: 1.0,
    };

    let mut rainfall = Tilemap::new_with(size, size, 0.0f32);
    rainfall
        .data_mut()
        .par_chunks_mut(size)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let (nx, ny) = level.transform(x, y, position, size);
                let fine_term = layered_noise(&source, &fine, nx, ny);
                let broad_term = layered_noise(&source, &broad, nx, ny);
                let rain = broad_term - fine_term / 1.5;
                *cell = (rain as f32 * RAIN_CEILING).clamp(0.0, RAIN_CEILING);
            }
        });
    rainfall
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_factor_folds_at_center() {
        assert_eq!(latitude_factor(0.0), 0.0);
        assert!((latitude_factor(0.25) - 0.5).abs() < 1e-12);
        assert!((latitude_factor(0.5) - 1.0).abs() < 1e-12);
        assert!((latitude_factor(0.75) - 0.5).abs() < 1e-12);
        assert!((latitude_factor(1.0 - 1e-9)).abs() < 1e-6);
    }

    #[test]
    fn test_temperature_range_and_determinism() {
        let seeds = MapSeeds::from_master(42);
        let elevation =
            crate::heightfield::make_elevation(&seeds, 16, Level::World, Position::default());
        let a = make_temperature(&elevation, 16, Level::World, Position::default());
        let b = make_temperature(&elevation, 16, Level::World, Position::default());
        assert_eq!(a, b);
        for (_, _, &t) in a.iter() {
            assert!((-30.0..35.0).contains(&t), "temperature out of range: {}", t);
        }
    }

    #[test]
    fn test_temperature_needs_no_noise_stream() {
        // Temperature is a pure function of the elevation grid and the row
        // index; a synthetic grid works without any seed at all.
        let elevation = Tilemap::new_with(8, 8, 128u8);
        let a = make_temperature(&elevation, 8, Level::World, Position::default());
        let b = make_temperature(&elevation, 8, Level::World, Position::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_rainfall_range() {
        let seeds = MapSeeds::from_master(42);
        let rain = make_rainfall(&seeds, 32, Level::World, Position::default());
        for (_, _, &r) in rain.iter() {
            assert!((0.0..=RAIN_CEILING).contains(&r), "rainfall out of range: {}", r);
        }
    }

    #[test]
    fn test_rainfall_independent_of_elevation_stream() {
        // Rainfall uses its own sub-seed: two masters with the same rainfall
        // sub-seed would agree, different masters disagree.
        let a = make_rainfall(&MapSeeds::from_master(1), 16, Level::World, Position::default());
        let b = make_rainfall(&MapSeeds::from_master(2), 16, Level::World, Position::default());
        assert_ne!(a, b);
    }
}
