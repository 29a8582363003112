use crate::entities::thing::{Thing, ThingId};
use crate::world::kinds::FloorChange;
use crate::world::position::Position;

/// Items a single tile holds unless configured otherwise.
pub const DEFAULT_MAXIMUM_SIZE: usize = 10;

/// Slot in an item stack. `Top` means "above everything" on insertion and
/// "the topmost element" on lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackIndex {
    At(usize),
    Top,
}

impl StackIndex {
    pub const WIRE_TOP: u8 = 0xFF;

    pub fn from_wire(value: u8) -> Self {
        if value == Self::WIRE_TOP {
            StackIndex::Top
        } else {
            StackIndex::At(usize::from(value))
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            StackIndex::Top => Self::WIRE_TOP,
            StackIndex::At(index) => u8::try_from(index).unwrap_or(Self::WIRE_TOP - 1),
        }
    }
}

/// Ordered things on one tile; index 0 is the bottom.
#[derive(Debug)]
pub struct ItemStack {
    items: Vec<Thing>,
    maximum_size: usize,
}

impl ItemStack {
    pub fn new(maximum_size: usize) -> Self {
        Self {
            items: Vec::new(),
            maximum_size: maximum_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn maximum_size(&self) -> usize {
        self.maximum_size
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Thing> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Thing] {
        &self.items
    }

    pub fn is_valid_index(&self, index: StackIndex) -> bool {
        match index {
            StackIndex::Top => true,
            StackIndex::At(index) => index < self.items.len(),
        }
    }

    /// Concrete vector position an index refers to right now.
    pub fn resolve(&self, index: StackIndex) -> Option<usize> {
        match index {
            StackIndex::Top => self.items.len().checked_sub(1),
            StackIndex::At(index) if index < self.items.len() => Some(index),
            StackIndex::At(_) => None,
        }
    }

    pub fn peek_index(&self, index: StackIndex) -> Option<&Thing> {
        self.resolve(index).and_then(|index| self.items.get(index))
    }

    pub fn top_item(&self) -> Option<&Thing> {
        self.items.last()
    }

    pub fn position_of(&self, id: ThingId) -> Option<usize> {
        self.items.iter().position(|thing| thing.id() == id)
    }

    /// Inserts without any checks; the tile validates index and capacity.
    pub fn add_thing(&mut self, index: StackIndex, thing: Thing) {
        match index {
            StackIndex::Top => self.items.push(thing),
            StackIndex::At(index) => {
                let index = index.min(self.items.len());
                self.items.insert(index, thing);
            }
        }
    }

    pub fn delete_thing(&mut self, index: StackIndex) -> Option<Thing> {
        let index = self.resolve(index)?;
        Some(self.items.remove(index))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Thing> {
        self.items.get_mut(index)
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.maximum_size
    }

    pub fn has_magic_door(&self) -> bool {
        self.items.iter().any(Thing::is_magic_door)
    }

    pub fn has_open_magic_door(&self) -> bool {
        self.items
            .iter()
            .any(|thing| thing.is_magic_door() && thing.is_opened())
    }

    pub fn is_block_solid(&self) -> bool {
        self.items.iter().any(|thing| thing.kind().block_solid)
    }

    pub fn is_trashholder(&self) -> bool {
        self.items.iter().any(|thing| thing.kind().trashholder)
    }

    pub fn is_block_projectile(&self) -> bool {
        self.items.iter().any(|thing| thing.kind().block_projectile)
    }

    pub fn has_elevation(&self) -> bool {
        self.items.iter().any(|thing| thing.kind().elevation)
    }

    /// Topmost teleporter wins.
    pub fn teleporter_destination(&self) -> Option<Position> {
        self.items.iter().rev().find_map(|thing| thing.kind().teleport)
    }

    /// Topmost floor change wins.
    pub fn floor_change(&self) -> Option<FloorChange> {
        self.items
            .iter()
            .rev()
            .find_map(|thing| thing.kind().floor_change)
    }
}
