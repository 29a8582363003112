mod config;
pub mod entities;
pub mod error;
pub mod persistence;
pub mod telemetry;
pub mod world;

pub use config::{AppConfig, WorldConfig};
pub use error::{WorldError, WorldResult};
pub use world::grid::World;

use persistence::tile_records;
use world::{housing, kinds};

pub fn run(args: &[String]) -> Result<(), String> {
    let config = AppConfig::from_args(args)?;
    let world_config = config.world_config().map_err(|err| err.to_string())?;
    let level = world_config.level_filter().map_err(|err| err.to_string())?;
    telemetry::logging::init(&config.root, level)?;

    let mut world = load_world(&config.root, &world_config).map_err(|err| {
        log::error!("world load failed: {}", err);
        err.to_string()
    })?;
    let armed = world.arm_decay();

    println!("tibia-world: loaded");
    println!("- root: {}", config.root.display());
    println!("- kinds: {}", world.kinds().len());
    println!("- tiles: {}", world.tile_count());
    println!("- decay timers: {}", armed);

    if config.ticks == 0 {
        return Ok(());
    }

    let fired = world.advance(config.ticks).map_err(|err| err.to_string())?;
    let notifications: usize = world
        .drain_notifications()
        .iter()
        .map(|(_, batch)| batch.len())
        .sum();
    log::info!(
        "advanced {} ticks: {} events fired, {} notifications",
        config.ticks,
        fired,
        notifications
    );
    let simulated = world
        .services()
        .clock()
        .tick_length()
        .saturating_mul(u32::try_from(config.ticks).unwrap_or(u32::MAX));
    println!("- ticks: {} (now {}, {:?} game time)", config.ticks, world.now().0, simulated);
    println!("- events fired: {}", fired);
    println!("- notifications: {}", notifications);

    let tiles_path = world_config.resolve(&config.root, &world_config.tiles);
    let saved = tile_records::save_tiles(&tiles_path, &world).map_err(|err| err.to_string())?;
    log::info!("saved {} tiles to {}", saved, tiles_path.display());
    println!("- saved tiles: {}", saved);
    Ok(())
}

/// Loads the kind table, tile snapshot and, when present, the house table.
pub fn load_world(root: &std::path::Path, config: &WorldConfig) -> WorldResult<World> {
    let kinds = kinds::load_kinds(&config.resolve(root, &config.kinds))?;
    let mut world = World::new(kinds, config);

    let records = tile_records::load_tiles(&config.resolve(root, &config.tiles))?;
    let restored = tile_records::restore(&mut world, &records)?;
    log::info!("restored {} tiles", restored);

    let houses_path = config.resolve(root, &config.houses);
    if houses_path.exists() {
        let houses = housing::load_houses(&houses_path)?;
        let count = houses.len();
        let linked = world.add_houses(houses);
        log::info!("loaded {} houses covering {} tiles", count, linked);
    }
    Ok(world)
}
