use crate::error::{WorldError, WorldResult};
use crate::world::kinds::{Kind, KindId, KindIndex};
use crate::world::position::Position;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Largest count a single stackable thing may carry.
pub const MAXIMUM_STACK_COUNT: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThingId(pub u32);

static NEXT_THING_ID: AtomicU32 = AtomicU32::new(1);

impl ThingId {
    pub fn next() -> Self {
        let id = NEXT_THING_ID.fetch_add(1, Ordering::Relaxed);
        ThingId(id)
    }

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

/// Where a thing currently lives. A relation, never ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Tile(Position),
    Container(ThingId),
}

/// Kind and count of a thing, as seen by spectators and persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingDescriptor {
    pub kind: KindId,
    #[serde(default = "one")]
    pub count: u16,
}

fn one() -> u16 {
    1
}

/// Something that has to run when a thing leaves the world for good.
pub trait Cleanup {
    /// Drops every timer owned by `owner`; returns how many were dropped.
    fn cancel_owned(&mut self, owner: ThingId) -> usize;
}

#[derive(Debug)]
pub struct Thing {
    id: ThingId,
    kind: Arc<Kind>,
    count: u16,
    parent: Option<Parent>,
}

impl Thing {
    /// Factory: creates a single thing of the given kind.
    pub fn create(kinds: &KindIndex, kind: KindId) -> WorldResult<Self> {
        Self::with_count(kinds, kind, 1)
    }

    pub fn with_count(kinds: &KindIndex, kind: KindId, count: u16) -> WorldResult<Self> {
        let prototype = kinds.lookup(kind)?;
        Self::from_prototype(prototype, count)
    }

    pub fn from_descriptor(kinds: &KindIndex, descriptor: ThingDescriptor) -> WorldResult<Self> {
        Self::with_count(kinds, descriptor.kind, descriptor.count)
    }

    pub fn from_prototype(kind: Arc<Kind>, count: u16) -> WorldResult<Self> {
        let count = if kind.stackable {
            if count == 0 || count > MAXIMUM_STACK_COUNT {
                return Err(WorldError::InvalidCount {
                    kind: kind.id,
                    count,
                });
            }
            count
        } else {
            1
        };
        Ok(Self {
            id: ThingId::next(),
            kind,
            count,
            parent: None,
        })
    }

    pub fn id(&self) -> ThingId {
        self.id
    }

    pub fn kind_id(&self) -> KindId {
        self.kind.id
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn descriptor(&self) -> ThingDescriptor {
        ThingDescriptor {
            kind: self.kind.id,
            count: self.count,
        }
    }

    pub fn is_stackable(&self) -> bool {
        self.kind.stackable
    }

    pub fn is_magic_door(&self) -> bool {
        self.kind.magic_door
    }

    pub fn is_opened(&self) -> bool {
        self.kind.is_opened()
    }

    pub fn parent(&self) -> Option<Parent> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Parent) {
        self.parent = Some(parent);
    }

    /// Turns the thing into another kind in place, keeping its identity.
    pub fn transform(&mut self, kind: Arc<Kind>) {
        if !kind.stackable {
            self.count = 1;
        }
        self.kind = kind;
    }

    /// A brand-new thing of the same kind holding `count`. Stackable things
    /// are fungible, so a changed count always means a new identity.
    pub fn create_fungible_thing(&self, count: u16) -> Thing {
        Thing {
            id: ThingId::next(),
            kind: Arc::clone(&self.kind),
            count: count.clamp(1, MAXIMUM_STACK_COUNT),
            parent: None,
        }
    }

    /// Detaches the thing from the world: timers it owns are cancelled and
    /// the parent relation is cleared.
    pub fn cleanup(&mut self, timers: &mut dyn Cleanup) {
        let cancelled = timers.cancel_owned(self.id);
        if cancelled > 0 {
            log::debug!("thing {:?} cleanup cancelled {} timers", self.id, cancelled);
        }
        self.parent = None;
    }
}
