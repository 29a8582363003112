use crate::entities::thing::{Thing, ThingDescriptor};
use crate::error::{WorldError, WorldResult};
use crate::world::grid::World;
use crate::world::kinds::KindId;
use crate::world::position::Position;
use crate::world::tile::Tile;
use crate::world::zone_flags::ZoneFlags;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted form of one tile: ground kind, zone bits and the item stack
/// bottom to top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub position: Position,
    pub kind: KindId,
    #[serde(default)]
    pub zone_flags: u32,
    #[serde(default)]
    pub items: Vec<ThingDescriptor>,
}

impl TileRecord {
    pub fn from_tile(tile: &Tile) -> Self {
        Self {
            position: tile.position(),
            kind: tile.kind_id(),
            zone_flags: tile.zone_flags().bits(),
            items: tile.items().iter().map(Thing::descriptor).collect(),
        }
    }
}

/// Snapshot of every tile, ordered by position so saves are stable.
pub fn snapshot(world: &World) -> Vec<TileRecord> {
    let mut records: Vec<TileRecord> = world.tiles().map(TileRecord::from_tile).collect();
    records.sort_by_key(|record| record.position);
    records
}

/// Builds the tiles of `records` into the world. Items are restored without
/// notifications; open magic doors get their exit listener back.
pub fn restore(world: &mut World, records: &[TileRecord]) -> WorldResult<usize> {
    for record in records {
        let mut tile = Tile::new(record.position, record.kind, world.kinds())?
            .with_maximum_items(world.item_stack_size());
        tile.set_zone_flags(ZoneFlags::from_config(record.zone_flags));
        for descriptor in &record.items {
            let thing = Thing::from_descriptor(world.kinds(), *descriptor)?;
            tile.load_thing(thing)?;
        }
        world.insert_tile(tile);
    }
    Ok(records.len())
}

pub fn parse_tiles(content: &str) -> WorldResult<Vec<TileRecord>> {
    let records: Vec<TileRecord> = serde_yaml::from_str(content)?;
    let mut seen = std::collections::HashSet::new();
    for record in &records {
        if !seen.insert(record.position) {
            return Err(WorldError::Config(format!(
                "duplicate tile record at {}",
                record.position
            )));
        }
    }
    Ok(records)
}

pub fn load_tiles(path: &Path) -> WorldResult<Vec<TileRecord>> {
    let content = fs::read_to_string(path).map_err(|err| WorldError::io(path, err))?;
    parse_tiles(&content)
}

/// `tiles.yml` backs up to `tiles.yml.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Writes the world snapshot. An existing file is kept as `<name>.bak`.
pub fn save_tiles(path: &Path, world: &World) -> WorldResult<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| WorldError::io(parent, err))?;
        }
    }
    let records = snapshot(world);
    let data = serde_yaml::to_string(&records)?;
    if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(|err| WorldError::io(&backup, err))?;
    }
    fs::write(path, data).map_err(|err| WorldError::io(path, err))?;
    Ok(records.len())
}
