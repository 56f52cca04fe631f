use std::path::PathBuf;

use clap::Parser;

use world_mapgen::error::GenResult;
use world_mapgen::export::export_tile_png;
use world_mapgen::levels::Level;
use world_mapgen::persist::{self, FileBlobStore};
use world_mapgen::store::{TileKey, TileStore};
use world_mapgen::tile::MapSettings;

#[derive(Parser, Debug)]
#[command(name = "world_mapgen")]
#[command(about = "Generate deterministic multi-level world maps")]
struct Args {
    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tile size in cells
    #[arg(long, default_value = "250")]
    size: usize,

    /// Sea level on the 0-255 elevation scale
    #[arg(long, default_value = "150")]
    sealevel: u8,

    /// Zoom level to generate (world, region, sector)
    #[arg(short, long, default_value = "world")]
    level: String,

    /// Region tile coordinate (required for region and sector levels)
    #[arg(long)]
    region_x: Option<i64>,
    #[arg(long)]
    region_y: Option<i64>,

    /// Sector tile coordinate within the region (required for sector level)
    #[arg(long)]
    sector_x: Option<i64>,
    #[arg(long)]
    sector_y: Option<i64>,

    /// Write the tile as a biome-colored PNG
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also write the elevation field as a grayscale PNG
    #[arg(long)]
    elevation_out: Option<PathBuf>,

    /// Save the generated map under this name
    #[arg(long)]
    save: Option<String>,

    /// Load a previously saved map instead of generating a new one
    #[arg(long)]
    load: Option<String>,

    /// List available saves and exit
    #[arg(long)]
    list_saves: bool,

    /// Directory holding save files
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> GenResult<()> {
    let blobs = FileBlobStore::new(&args.save_dir);

    if args.list_saves {
        for name in persist::list_saves(&blobs)? {
            println!("{}", name);
        }
        return Ok(());
    }

    let store = match &args.load {
        Some(name) => {
            println!("Loading save \"{}\"", name);
            let store = persist::load_map(&blobs, name)?;
            println!(
                "Loaded {} tiles (seed {})",
                store.cached_tiles().len(),
                store.settings().seed
            );
            store
        }
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            println!("Generating map with seed: {}", seed);
            TileStore::new(MapSettings {
                seed,
                size: args.size,
                sealevel: args.sealevel,
            })
        }
    };

    let level: Level = args.level.parse()?;
    let region = args.region_x.zip(args.region_y);
    let sector = args.sector_x.zip(args.sector_y);
    let key = describe_key(level, region, sector);

    println!("Generating {} tile...", key);
    let tile = store.fetch_tile(level, region, sector)?;
    println!(
        "Elevation {}..{}  Temperature {:.1}..{:.1}  Rainfall {:.0}..{:.0}",
        tile.stats.elevation.min,
        tile.stats.elevation.max,
        tile.stats.temperature.min,
        tile.stats.temperature.max,
        tile.stats.rainfall.min,
        tile.stats.rainfall.max,
    );
    let river_cells = tile.rivers.iter().filter(|(_, _, &m)| m != 0).count();
    println!("River cells: {}", river_cells);

    if let Some(path) = &args.out {
        export_tile_png(&tile, path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.elevation_out {
        world_mapgen::export::render_elevation(&tile)
            .save(path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        println!("Wrote {}", path.display());
    }

    if let Some(name) = &args.save {
        persist::save_map(&store, &blobs, name)?;
        println!("Saved as \"{}\"", name);
    }

    Ok(())
}

fn describe_key(level: Level, region: Option<(i64, i64)>, sector: Option<(i64, i64)>) -> String {
    match level {
        Level::World => TileKey::World.to_string(),
        Level::Region => region
            .map(|(x, y)| TileKey::Region { x, y }.to_string())
            .unwrap_or_else(|| "region".to_string()),
        Level::Sector => region
            .zip(sector)
            .map(|((rx, ry), (sx, sy))| TileKey::Sector { rx, ry, sx, sy }.to_string())
            .unwrap_or_else(|| "sector".to_string()),
        Level::Local => "local".to_string(),
    }
}
