use crate::world::kinds::KindId;
use crate::world::position::Position;
use crate::world::tile::Tile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureKind {
    Player,
    Npc,
    Monster,
    Summon,
}

/// Capabilities the tile layer needs from whoever is moving around.
pub trait Actor {
    fn id(&self) -> CreatureId;
    fn name(&self) -> &str;
    fn is_player_type(&self) -> bool;
    fn is_in_combat(&self) -> bool;
    fn release_combat_lock(&mut self);
    fn has_target(&self) -> bool;
    fn clear_target(&mut self);
    fn send_cancellation(&mut self, message: &str);

    fn owns_house_tile(&self, tile: &Tile) -> bool {
        tile.house().map_or(false, |house| house.grants(self.name()))
    }
}

/// Plain creature record used by the movement pipeline and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    pub id: CreatureId,
    pub name: String,
    pub kind: CreatureKind,
    pub position: Position,
    pub in_combat: bool,
    pub target: Option<CreatureId>,
    pub cancellations: Vec<String>,
}

impl Creature {
    pub fn new(id: CreatureId, name: &str, kind: CreatureKind, position: Position) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            position,
            in_combat: false,
            target: None,
            cancellations: Vec::new(),
        }
    }
}

impl Actor for Creature {
    fn id(&self) -> CreatureId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_player_type(&self) -> bool {
        self.kind == CreatureKind::Player
    }

    fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    fn release_combat_lock(&mut self) {
        self.in_combat = false;
    }

    fn has_target(&self) -> bool {
        self.target.is_some()
    }

    fn clear_target(&mut self) {
        self.target = None;
    }

    fn send_cancellation(&mut self, message: &str) {
        self.cancellations.push(message.to_string());
    }
}

pub const CORPSE_MALE: KindId = KindId(3058);
pub const CORPSE_FEMALE: KindId = KindId(3065);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

// TODO: both sexes get CORPSE_MALE on live servers; switch Female to
// CORPSE_FEMALE once the content team confirms it is not intentional.
pub fn corpse_kind(sex: Sex) -> KindId {
    match sex {
        Sex::Male => CORPSE_MALE,
        Sex::Female => CORPSE_MALE,
    }
}

/// Attack value used when the equipment reports no weapon attack.
pub const DEFAULT_WEAPON_ATTACK: u32 = 20;

/// One base damage point per five levels.
pub fn base_damage(level: u32) -> u32 {
    level / 5
}

/// Melee attack in the offensive stance, the only stance players fight in.
pub fn melee_attack(level: u32, skill: u32, weapon_attack: u32) -> u32 {
    let weapon = weapon_attack.saturating_mul(6) / 5;
    base_damage(level) + weapon.saturating_mul(skill + 4) / 28
}
