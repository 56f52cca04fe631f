//! PNG rendering of generated tiles.

use image::{Rgb, RgbImage};

use crate::biomes::Biome;
use crate::tile::Tile;

/// Overlay color for river cells.
const RIVER_COLOR: [u8; 3] = [63, 102, 180];

/// Fallback for an id outside the rule table; only reachable on corrupt data.
const UNKNOWN_COLOR: [u8; 3] = [255, 0, 255];

/// Render a tile's biome grid, with rivers drawn over, one pixel per cell.
pub fn render_tile(tile: &Tile) -> RgbImage {
    let width = tile.biome.width as u32;
    let height = tile.biome.height as u32;
    let mut img = RgbImage::new(width, height);
    for (x, y, &id) in tile.biome.iter() {
        let color = if *tile.rivers.get(x, y) != 0 {
            RIVER_COLOR
        } else {
            Biome::from_id(id).map_or(UNKNOWN_COLOR, Biome::color)
        };
        img.put_pixel(x as u32, y as u32, Rgb(color));
    }
    img
}

/// Render a tile's elevation as grayscale.
pub fn render_elevation(tile: &Tile) -> RgbImage {
    let mut img = RgbImage::new(tile.elevation.width as u32, tile.elevation.height as u32);
    for (x, y, &e) in tile.elevation.iter() {
        img.put_pixel(x as u32, y as u32, Rgb([e, e, e]));
    }
    img
}

/// Render and write a tile to a PNG file.
pub fn export_tile_png(tile: &Tile, path: &std::path::Path) -> Result<(), image::ImageError> {
    render_tile(tile).save(path)
}
