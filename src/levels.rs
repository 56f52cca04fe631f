//! Zoom level registry.
//!
//! The same pipeline runs at four nested spatial scales. Each level carries
//! its octave profile and its zoom scale relative to the parent level, plus
//! the rule mapping a local cell coordinate and a global offset into the
//! continuous noise-space window sampled by the evaluator. Levels nest
//! exactly: a finer tile's continuous window is a sub-rectangle of its
//! parent cell's window.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};

/// Octave parameters for the layered noise evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OctaveParams {
    /// Number of octaves summed (>= 1)
    pub num_iterations: u32,
    /// Amplitude decay per octave (0 < p < 1)
    pub persistence: f64,
    /// Starting frequency multiplier
    pub init_frequency: f64,
    /// Starting value of the amplitude total used for normalization.
    /// Nonzero values damp the whole field toward mid-range.
    pub max_amp: f64,
}

impl OctaveParams {
    pub fn validate(&self) -> GenResult<()> {
        if self.num_iterations == 0 {
            return Err(GenError::Config(
                "octave count must be at least 1".to_string(),
            ));
        }
        if !(self.persistence > 0.0 && self.persistence < 1.0) {
            return Err(GenError::Config(format!(
                "persistence must be in (0, 1), got {}",
                self.persistence
            )));
        }
        if self.init_frequency <= 0.0 {
            return Err(GenError::Config(format!(
                "init frequency must be positive, got {}",
                self.init_frequency
            )));
        }
        Ok(())
    }
}

/// Global offset of a tile's origin, in its level's grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// The closed set of zoom levels, coarsest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    World,
    Region,
    Sector,
    Local,
}

impl Level {
    pub fn all() -> &'static [Level] {
        &[Level::World, Level::Region, Level::Sector, Level::Local]
    }

    /// Octave profile used for this level's elevation field.
    pub fn octaves(self) -> OctaveParams {
        let num_iterations = match self {
            Level::World => 5,
            Level::Region => 10,
            Level::Sector => 15,
            Level::Local => 20,
        };
        OctaveParams {
            num_iterations,
            persistence: 0.6,
            init_frequency: 2.0,
            max_amp: 0.0,
        }
    }

    /// Spatial scale relative to the parent level.
    pub fn zoom_scale(self) -> u32 {
        match self {
            Level::World => 1,
            Level::Region | Level::Sector | Level::Local => 10,
        }
    }

    /// Ratio of this level's coordinate span to the world's: the product of
    /// zoom scales down from the root.
    pub fn cumulative_zoom(self) -> f64 {
        match self {
            Level::World => 1.0,
            Level::Region => 10.0,
            Level::Sector => 100.0,
            Level::Local => 1000.0,
        }
    }

    /// Map a local cell coordinate plus a global offset into continuous
    /// noise space. The sampled window is centered on the origin so the
    /// world tile spans [0.5, 1.5) in both axes.
    pub fn transform(self, x: usize, y: usize, position: Position, size: usize) -> (f64, f64) {
        let zoom = self.cumulative_zoom();
        let nx = (x as f64 + position.x as f64) / zoom;
        let ny = (y as f64 + position.y as f64) / zoom;
        (nx / size as f64 + 0.5, ny / size as f64 + 0.5)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::World => write!(f, "world"),
            Level::Region => write!(f, "region"),
            Level::Sector => write!(f, "sector"),
            Level::Local => write!(f, "local"),
        }
    }
}

impl FromStr for Level {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "world" => Ok(Level::World),
            "region" => Ok(Level::Region),
            "sector" => Ok(Level::Sector),
            "local" => Ok(Level::Local),
            other => Err(GenError::Config(format!("unknown level \"{}\"", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octave_validation() {
        for level in Level::all() {
            assert!(level.octaves().validate().is_ok());
        }
        let bad = OctaveParams {
            num_iterations: 0,
            persistence: 0.6,
            init_frequency: 2.0,
            max_amp: 0.0,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_cumulative_zoom_is_product_of_scales() {
        let mut product = 1.0;
        for level in Level::all() {
            product *= level.zoom_scale() as f64;
            assert_eq!(level.cumulative_zoom(), product);
        }
    }

    #[test]
    fn test_world_window_is_centered_unit_square() {
        let size = 8;
        let origin = Level::World.transform(0, 0, Position::default(), size);
        assert!((origin.0 - 0.5).abs() < 1e-12);
        assert!((origin.1 - 0.5).abs() < 1e-12);
        let last = Level::World.transform(size - 1, size - 1, Position::default(), size);
        assert!(last.0 < 1.5 && last.1 < 1.5);
    }

    /// Region sub-windows must tile their parent world cell's continuous
    /// window exactly: no gaps, no overlap with neighboring world cells.
    #[test]
    fn test_region_windows_nest_in_world_cells() {
        let size = 6;
        let zoom = Level::Region.zoom_scale() as i64;
        for wy in 0..size as i64 {
            for wx in 0..size as i64 {
                let (wx0, wy0) = Level::World.transform(
                    wx as usize,
                    wy as usize,
                    Position::default(),
                    size,
                );
                let cell_span = 1.0 / size as f64;
                for sub_y in 0..zoom {
                    for sub_x in 0..zoom {
                        let pos = Position::new(wx * zoom, wy * zoom);
                        let (rx, ry) = Level::Region.transform(
                            sub_x as usize,
                            sub_y as usize,
                            pos,
                            size,
                        );
                        assert!(rx >= wx0 - 1e-12 && rx < wx0 + cell_span);
                        assert!(ry >= wy0 - 1e-12 && ry < wy0 + cell_span);
                        // Sub-windows land on an exact subdivision grid.
                        let expected_x = wx0 + sub_x as f64 * cell_span / zoom as f64;
                        assert!((rx - expected_x).abs() < 1e-12);
                    }
                }
            }
        }
    }
}
