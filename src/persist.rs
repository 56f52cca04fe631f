//! Save and load for generated maps.
//!
//! The core only asks its storage collaborator for a string-keyed blob
//! contract (`BlobStore`); the save format itself is JSON with every grid
//! encoded as the ndarray-tagged object from `tilemap`. Loading a malformed
//! blob fails without touching any in-memory store.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};
use crate::store::{TileKey, TileStore};
use crate::tile::{MapSettings, Tile};

/// A saved map: the settings plus every populated tile, keyed by the tile
/// key's string form ("world", "x.y", "x.y-sx.sy").
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedMap {
    pub settings: MapSettings,
    pub tiles: BTreeMap<String, Tile>,
}

impl SavedMap {
    pub fn from_store(store: &TileStore) -> Self {
        let tiles = store
            .cached_tiles()
            .into_iter()
            .map(|(key, tile)| (key.to_string(), (*tile).clone()))
            .collect();
        Self {
            settings: *store.settings(),
            tiles,
        }
    }

    /// Rebuild a store from this save. Tile keys and grid shapes are
    /// validated before anything is inserted.
    pub fn into_store(self) -> GenResult<TileStore> {
        let size = self.settings.size;
        let mut parsed: Vec<(TileKey, Tile)> = Vec::with_capacity(self.tiles.len());
        for (name, tile) in self.tiles {
            let key: TileKey = name.parse()?;
            let shapes = [
                ("elevation", tile.elevation.width, tile.elevation.height),
                ("temperature", tile.temperature.width, tile.temperature.height),
                ("rainfall", tile.rainfall.width, tile.rainfall.height),
                ("biome", tile.biome.width, tile.biome.height),
                ("rivers", tile.rivers.width, tile.rivers.height),
            ];
            for (grid, width, height) in shapes {
                if width != size || height != size {
                    return Err(GenError::Serialization(format!(
                        "tile \"{}\" {} grid is {}x{}, settings say {}",
                        name, grid, width, height, size
                    )));
                }
            }
            parsed.push((key, tile));
        }
        let store = TileStore::new(self.settings);
        for (key, tile) in parsed {
            store.insert_cached(key, tile);
        }
        Ok(store)
    }
}

/// Serialize a store to a save blob.
pub fn serialize_map(store: &TileStore) -> GenResult<Vec<u8>> {
    serde_json::to_vec(&SavedMap::from_store(store))
        .map_err(|e| GenError::Serialization(e.to_string()))
}

/// Parse a save blob back into a store.
pub fn deserialize_map(blob: &[u8]) -> GenResult<TileStore> {
    let saved: SavedMap =
        serde_json::from_slice(blob).map_err(|e| GenError::Serialization(e.to_string()))?;
    saved.into_store()
}

/// String-keyed blob storage contract. The key format under the hood (file
/// names, browser storage prefixes) is the collaborator's business.
pub trait BlobStore {
    fn put(&self, name: &str, blob: &[u8]) -> GenResult<()>;
    fn get(&self, name: &str) -> GenResult<Option<Vec<u8>>>;
    fn list(&self) -> GenResult<Vec<String>>;
    fn delete(&self, name: &str) -> GenResult<()>;
}

/// Directory-backed blob store; one `<name>.json` file per save.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, name: &str, blob: &[u8]) -> GenResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_of(name), blob)?;
        Ok(())
    }

    fn get(&self, name: &str) -> GenResult<Option<Vec<u8>>> {
        match fs::read(self.path_of(name)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> GenResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> GenResult<()> {
        fs::remove_file(self.path_of(name))?;
        Ok(())
    }
}

/// In-memory blob store for tests and embedding.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, name: &str, blob: &[u8]) -> GenResult<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(name.to_string(), blob.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> GenResult<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(name).cloned())
    }

    fn list(&self) -> GenResult<Vec<String>> {
        let mut names: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> GenResult<()> {
        self.blobs.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Serialize a store and hand it to the blob collaborator under `name`.
pub fn save_map(store: &TileStore, blobs: &dyn BlobStore, name: &str) -> GenResult<()> {
    let blob = serialize_map(store)?;
    blobs.put(name, &blob)
}

/// Load a named save into a fresh store.
pub fn load_map(blobs: &dyn BlobStore, name: &str) -> GenResult<TileStore> {
    let blob = blobs.get(name)?.ok_or_else(|| {
        GenError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no save named \"{}\"", name),
        ))
    })?;
    deserialize_map(&blob)
}

pub fn list_saves(blobs: &dyn BlobStore) -> GenResult<Vec<String>> {
    blobs.list()
}

pub fn delete_save(blobs: &dyn BlobStore, name: &str) -> GenResult<()> {
    blobs.delete(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;

    fn populated_store() -> TileStore {
        let store = TileStore::new(MapSettings {
            seed: 42,
            size: 12,
            sealevel: 150,
        });
        store.get(TileKey::World).unwrap();
        store.get(TileKey::Region { x: 1, y: 2 }).unwrap();
        store
            .get(TileKey::Sector {
                rx: 0,
                ry: 0,
                sx: 3,
                sy: 3,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_round_trip_reproduces_every_tile() {
        let store = populated_store();
        let blob = serialize_map(&store).unwrap();
        let loaded = deserialize_map(&blob).unwrap();

        assert_eq!(loaded.settings(), store.settings());
        let original = store.cached_tiles();
        let restored = loaded.cached_tiles();
        assert_eq!(original.len(), restored.len());
        for ((key_a, tile_a), (key_b, tile_b)) in original.iter().zip(restored.iter()) {
            assert_eq!(key_a, key_b);
            assert_eq!(**tile_a, **tile_b);
        }
    }

    #[test]
    fn test_loaded_tiles_need_no_resynthesis() {
        let store = populated_store();
        let loaded = deserialize_map(&serialize_map(&store).unwrap()).unwrap();
        let before = loaded.generation_count();
        loaded.get(TileKey::World).unwrap();
        assert_eq!(loaded.generation_count(), before);
    }

    #[test]
    fn test_save_and_load_through_blob_store() {
        let blobs = MemoryBlobStore::new();
        let store = populated_store();
        save_map(&store, &blobs, "alpha").unwrap();
        save_map(&store, &blobs, "beta").unwrap();
        assert_eq!(list_saves(&blobs).unwrap(), vec!["alpha", "beta"]);

        let loaded = load_map(&blobs, "alpha").unwrap();
        assert_eq!(loaded.settings(), store.settings());

        delete_save(&blobs, "alpha").unwrap();
        assert_eq!(list_saves(&blobs).unwrap(), vec!["beta"]);
        assert!(load_map(&blobs, "alpha").is_err());
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let store = populated_store();
        let mut blob = serialize_map(&store).unwrap();
        blob.truncate(blob.len() / 2);
        assert!(matches!(
            deserialize_map(&blob),
            Err(GenError::Serialization(_))
        ));
    }

    #[test]
    fn test_mismatched_grid_is_rejected() {
        let store = populated_store();
        for grid in ["temperature", "rainfall", "biome", "rivers"] {
            let mut saved = SavedMap::from_store(&store);
            let tile = saved.tiles.get_mut("world").unwrap();
            match grid {
                "temperature" => tile.temperature = Tilemap::new_with(2, 2, 0.0),
                "rainfall" => tile.rainfall = Tilemap::new_with(2, 2, 0.0),
                "biome" => tile.biome = Tilemap::new_with(2, 2, 0),
                _ => tile.rivers = Tilemap::new_with(2, 2, 0),
            }
            assert!(matches!(
                saved.into_store(),
                Err(GenError::Serialization(_))
            ));
        }
    }

    #[test]
    fn test_negative_region_keys_survive_save_and_load() {
        let store = TileStore::new(MapSettings {
            seed: 42,
            size: 12,
            sealevel: 150,
        });
        store.get(TileKey::Region { x: -1, y: 0 }).unwrap();

        let loaded = deserialize_map(&serialize_map(&store).unwrap()).unwrap();
        let tiles = loaded.cached_tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].0, TileKey::Region { x: -1, y: 0 });
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let json = r#"{
            "settings": {"seed": 1, "size": 4, "sealevel": 150},
            "tiles": {
                "world": null
            }
        }"#;
        assert!(deserialize_map(json.as_bytes()).is_err());
    }
}
