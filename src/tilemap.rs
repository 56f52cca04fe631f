//! 2D grid container used for every per-cell field.
//!
//! Tiles are flat rectangular windows into a level's coordinate space, so
//! unlike a cylindrical world map there is no edge wrapping: out-of-bounds
//! neighbors simply do not exist.
//!
//! Grids serialize as a tagged object `{"__type": "ndarray", "data": [...],
//! "shape": [width, height]}` so save files stay compatible with generic
//! ndarray-aware readers.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A dense row-major `width x height` grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Tilemap<T> {
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Flat row-major view of the grid.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat view, for handing disjoint row slices to parallel
    /// workers.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 4-connected neighbors (up, down, left, right), skipping out-of-bounds.
    pub fn neighbors4(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(4);
        if y > 0 {
            result.push((x, y - 1));
        }
        if y + 1 < self.height {
            result.push((x, y + 1));
        }
        if x > 0 {
            result.push((x - 1, y));
        }
        if x + 1 < self.width {
            result.push((x + 1, y));
        }
        result
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % self.width;
            let y = idx / self.width;
            (x, y, val)
        })
    }
}

impl<T: Copy + PartialOrd> Tilemap<T> {
    /// Minimum and maximum cell values. Returns None for an empty grid.
    pub fn min_max(&self) -> Option<(T, T)> {
        let mut it = self.data.iter();
        let first = *it.next()?;
        let mut min = first;
        let mut max = first;
        for &v in it {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }
}

impl<T: Serialize> Serialize for Tilemap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("__type", "ndarray")?;
        map.serialize_entry("data", &self.data)?;
        map.serialize_entry("shape", &[self.width, self.height])?;
        map.end()
    }
}

struct TilemapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for TilemapVisitor<T> {
    type Value = Tilemap<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an ndarray-tagged grid object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut tag: Option<String> = None;
        let mut data: Option<Vec<T>> = None;
        let mut shape: Option<[usize; 2]> = None;
        while let Some(key) = access.next_key::<String>()? {
            match key.as_str() {
                "__type" => tag = Some(access.next_value()?),
                "data" => data = Some(access.next_value()?),
                "shape" => shape = Some(access.next_value()?),
                _ => {
                    access.next_value::<de::IgnoredAny>()?;
                }
            }
        }
        let tag = tag.ok_or_else(|| de::Error::missing_field("__type"))?;
        if tag != "ndarray" {
            return Err(de::Error::custom(format!(
                "expected __type \"ndarray\", got \"{}\"",
                tag
            )));
        }
        let data = data.ok_or_else(|| de::Error::missing_field("data"))?;
        let [width, height] = shape.ok_or_else(|| de::Error::missing_field("shape"))?;
        if data.len() != width * height {
            return Err(de::Error::custom(format!(
                "grid data length {} does not match shape {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Tilemap {
            width,
            height,
            data,
        })
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Tilemap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TilemapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut grid = Tilemap::new_with(4, 4, 0u8);
        grid.set(2, 3, 7);
        assert_eq!(*grid.get(2, 3), 7);
        assert_eq!(*grid.get(3, 2), 0);
    }

    #[test]
    fn test_neighbors4_corner_and_interior() {
        let grid = Tilemap::new_with(3, 3, 0u8);
        assert_eq!(grid.neighbors4(0, 0).len(), 2);
        assert_eq!(grid.neighbors4(1, 1).len(), 4);
        assert_eq!(grid.neighbors4(2, 1).len(), 3);
    }

    #[test]
    fn test_min_max() {
        let mut grid = Tilemap::new_with(2, 2, 5.0f32);
        grid.set(0, 1, -1.0);
        grid.set(1, 1, 9.0);
        assert_eq!(grid.min_max(), Some((-1.0, 9.0)));
    }

    #[test]
    fn test_serde_round_trip_exact() {
        let mut grid = Tilemap::new_with(3, 2, 0.0f32);
        grid.set(0, 0, 0.1);
        grid.set(2, 1, -1234.5678);
        let json = serde_json::to_string(&grid).unwrap();
        assert!(json.contains("\"__type\":\"ndarray\""));
        assert!(json.contains("\"shape\":[3,2]"));
        let back: Tilemap<f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(grid, back);
    }

    #[test]
    fn test_deserialize_rejects_bad_shape() {
        let json = r#"{"__type":"ndarray","data":[1,2,3],"shape":[2,2]}"#;
        assert!(serde_json::from_str::<Tilemap<u8>>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_tag() {
        let json = r#"{"__type":"matrix","data":[1,2,3,4],"shape":[2,2]}"#;
        assert!(serde_json::from_str::<Tilemap<u8>>(json).is_err());
    }
}
