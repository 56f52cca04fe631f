//! Deterministic multi-level world map generation.
//!
//! A single seed drives elevation, temperature, rainfall, biome
//! classification and river networks at four nested zoom levels. Tiles are
//! generated on demand, cached, and serializable.

pub mod biomes;
pub mod climate;
pub mod error;
pub mod export;
pub mod heightfield;
pub mod levels;
pub mod octaves;
pub mod persist;
pub mod rivers;
pub mod seeds;
pub mod store;
pub mod tile;
pub mod tilemap;

pub use error::{GenError, GenResult};
pub use levels::{Level, Position};
pub use store::{TileKey, TileStore};
pub use tile::{generate, MapSettings, Tile};
