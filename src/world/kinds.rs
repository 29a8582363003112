use crate::error::{WorldError, WorldResult};
use crate::world::position::{Direction, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Static type identifier shared by tiles and items. Zero is the void kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindId(pub u16);

impl KindId {
    pub const VOID: KindId = KindId(0);

    pub fn is_void(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for KindId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorChange {
    North,
    East,
    South,
    West,
    Down,
}

impl FloorChange {
    /// Horizontal step taken together with the floor change, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            FloorChange::North => Some(Direction::North),
            FloorChange::East => Some(Direction::East),
            FloorChange::South => Some(Direction::South),
            FloorChange::West => Some(Direction::West),
            FloorChange::Down => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorState {
    pub opened: bool,
    /// Kind the door turns into when toggled.
    pub toggle_to: KindId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decay {
    pub to: KindId,
    /// Delay in game ticks.
    pub duration: u64,
}

pub const DEFAULT_FRICTION: u16 = 100;

fn default_friction() -> u16 {
    DEFAULT_FRICTION
}

/// Prototype of a kind: every static attribute the tile layer consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kind {
    pub id: KindId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_friction")]
    pub friction: u16,
    #[serde(default)]
    pub block_solid: bool,
    #[serde(default)]
    pub block_projectile: bool,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub trashholder: bool,
    #[serde(default)]
    pub elevation: bool,
    #[serde(default)]
    pub magic_door: bool,
    #[serde(default)]
    pub door: Option<DoorState>,
    #[serde(default)]
    pub floor_change: Option<FloorChange>,
    #[serde(default)]
    pub decay: Option<Decay>,
    #[serde(default)]
    pub teleport: Option<Position>,
}

impl Kind {
    pub fn new(id: KindId) -> Self {
        Self {
            id,
            name: String::new(),
            friction: DEFAULT_FRICTION,
            block_solid: false,
            block_projectile: false,
            stackable: false,
            trashholder: false,
            elevation: false,
            magic_door: false,
            door: None,
            floor_change: None,
            decay: None,
            teleport: None,
        }
    }

    pub fn is_decaying(&self) -> bool {
        self.decay.is_some()
    }

    pub fn is_opened(&self) -> bool {
        self.door.map_or(false, |door| door.opened)
    }
}

#[derive(Debug, Default, Clone)]
pub struct KindIndex {
    kinds: HashMap<KindId, Arc<Kind>>,
}

impl KindIndex {
    pub fn get(&self, id: KindId) -> Option<&Arc<Kind>> {
        self.kinds.get(&id)
    }

    /// Resolves a prototype that world data refers to. A miss means the data
    /// is corrupt and the caller must abort.
    pub fn lookup(&self, id: KindId) -> WorldResult<Arc<Kind>> {
        match self.kinds.get(&id) {
            Some(kind) => Ok(Arc::clone(kind)),
            None => {
                log::error!("kind lookup failed for id {}", id);
                Err(WorldError::UnknownKind(id))
            }
        }
    }

    pub fn insert(&mut self, kind: Kind) -> WorldResult<()> {
        if self.kinds.contains_key(&kind.id) {
            return Err(WorldError::DuplicateKind(kind.id));
        }
        self.kinds.insert(kind.id, Arc::new(kind));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KindId, &Arc<Kind>)> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

pub fn load_kinds(path: &Path) -> WorldResult<KindIndex> {
    let content = std::fs::read_to_string(path).map_err(|err| WorldError::io(path, err))?;
    parse_kinds(&content)
}

pub fn parse_kinds(content: &str) -> WorldResult<KindIndex> {
    let entries: Vec<Kind> = serde_yaml::from_str(content)?;
    let mut index = KindIndex::default();
    for entry in entries {
        if entry.id.is_void() {
            return Err(WorldError::Config(
                "kind id 0 is reserved for void tiles".to_string(),
            ));
        }
        index.insert(entry)?;
    }
    validate_references(&index)?;
    Ok(index)
}

/// Decay and door links name known kinds; decay takes at least one tick.
fn validate_references(index: &KindIndex) -> WorldResult<()> {
    for (id, kind) in index.iter() {
        if let Some(decay) = kind.decay {
            if decay.duration == 0 {
                return Err(WorldError::Config(format!(
                    "kind {} decays with zero duration",
                    id
                )));
            }
            if !decay.to.is_void() && index.get(decay.to).is_none() {
                return Err(WorldError::Config(format!(
                    "kind {} decays into unknown kind {}",
                    id, decay.to
                )));
            }
        }
        if let Some(door) = kind.door {
            if index.get(door.toggle_to).is_none() {
                return Err(WorldError::Config(format!(
                    "door kind {} toggles to unknown kind {}",
                    id, door.toggle_to
                )));
            }
        }
    }
    Ok(())
}
