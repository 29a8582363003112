use crate::entities::thing::{Cleanup, ThingDescriptor, ThingId};
use crate::world::event_queue::{EventId, ScheduledEvent};
use crate::world::kinds::{KindId, KindIndex};
use crate::world::position::Position;
use std::collections::BTreeMap;

/// Visual effect shown when a thing vanishes.
pub const EFFECT_POFF: u16 = 3;

pub const SECTOR_TILE_SIZE: u16 = 32;

/// Change a spectator of a tile has to learn about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    ItemAdded {
        position: Position,
        thing: ThingDescriptor,
        index: usize,
    },
    ItemRemoved {
        position: Position,
        index: usize,
        previous_count: u16,
    },
    TileUpdated {
        position: Position,
        kind: KindId,
    },
    MagicEffect {
        position: Position,
        effect: u16,
    },
}

impl Notification {
    pub fn position(&self) -> Position {
        match *self {
            Notification::ItemAdded { position, .. }
            | Notification::ItemRemoved { position, .. }
            | Notification::TileUpdated { position, .. }
            | Notification::MagicEffect { position, .. } => position,
        }
    }
}

/// Everything a tile may touch outside of itself during one operation.
pub trait TileContext {
    fn kinds(&self) -> &KindIndex;

    /// Delivers to every spectator of the region containing the position.
    fn broadcast(&mut self, notification: Notification);

    fn send_magic_effect(&mut self, position: Position, effect: u16) {
        self.broadcast(Notification::MagicEffect { position, effect });
    }

    fn poff_effect(&self) -> u16 {
        EFFECT_POFF
    }

    fn schedule(&mut self, event: ScheduledEvent, owner: Option<ThingId>, delay: u64) -> EventId;

    /// Timer registry consulted when a thing is destroyed.
    fn timers(&mut self) -> &mut dyn Cleanup;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorCoord {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl SectorCoord {
    pub fn containing(position: Position, sector_size: u16) -> Self {
        let size = sector_size.max(1);
        SectorCoord {
            x: position.x / size,
            y: position.y / size,
            z: position.z,
        }
    }
}

/// Notifications queued until the mutating call has returned, then handed
/// out grouped by sector.
#[derive(Debug)]
pub struct RegionOutbox {
    sector_size: u16,
    queued: Vec<(SectorCoord, Notification)>,
}

impl Default for RegionOutbox {
    fn default() -> Self {
        Self::new(SECTOR_TILE_SIZE)
    }
}

impl RegionOutbox {
    pub fn new(sector_size: u16) -> Self {
        Self {
            sector_size: sector_size.max(1),
            queued: Vec::new(),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        let sector = SectorCoord::containing(notification.position(), self.sector_size);
        self.queued.push((sector, notification));
    }

    pub fn pending(&self, sector: SectorCoord) -> Vec<Notification> {
        self.queued
            .iter()
            .filter(|(queued, _)| *queued == sector)
            .map(|(_, notification)| *notification)
            .collect()
    }

    /// Every queued notification in emission order.
    pub fn flattened(&self) -> Vec<Notification> {
        self.queued
            .iter()
            .map(|(_, notification)| *notification)
            .collect()
    }

    /// Empties the outbox. Emission order is kept within each sector.
    pub fn drain(&mut self) -> Vec<(SectorCoord, Vec<Notification>)> {
        let mut grouped: BTreeMap<SectorCoord, Vec<Notification>> = BTreeMap::new();
        for (sector, notification) in self.queued.drain(..) {
            grouped.entry(sector).or_default().push(notification);
        }
        grouped.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removed(x: u16, index: usize) -> Notification {
        Notification::ItemRemoved {
            position: Position::new(x, 40, 7),
            index,
            previous_count: 1,
        }
    }

    #[test]
    fn notifications_are_grouped_by_sector() {
        let mut outbox = RegionOutbox::new(32);
        outbox.push(removed(10, 0));
        outbox.push(removed(70, 1));
        outbox.push(removed(31, 2));
        assert_eq!(outbox.len(), 3);

        let near = SectorCoord { x: 0, y: 1, z: 7 };
        let far = SectorCoord { x: 2, y: 1, z: 7 };
        assert_eq!(outbox.pending(near), vec![removed(10, 0), removed(31, 2)]);
        assert_eq!(outbox.pending(far), vec![removed(70, 1)]);

        let drained = outbox.drain();
        assert_eq!(drained.len(), 2);
        assert!(outbox.is_empty());
        assert!(outbox.pending(near).is_empty());
    }

    #[test]
    fn magic_effect_default_goes_through_broadcast() {
        struct Sink {
            kinds: KindIndex,
            outbox: RegionOutbox,
            timers: crate::world::event_queue::EventQueue,
        }
        impl TileContext for Sink {
            fn kinds(&self) -> &KindIndex {
                &self.kinds
            }
            fn broadcast(&mut self, notification: Notification) {
                self.outbox.push(notification);
            }
            fn schedule(
                &mut self,
                event: ScheduledEvent,
                owner: Option<ThingId>,
                delay: u64,
            ) -> EventId {
                self.timers
                    .set(event, owner, delay, crate::world::time::GameTick(0))
            }
            fn timers(&mut self) -> &mut dyn Cleanup {
                &mut self.timers
            }
        }

        let mut sink = Sink {
            kinds: KindIndex::default(),
            outbox: RegionOutbox::default(),
            timers: Default::default(),
        };
        let position = Position::new(5, 5, 7);
        let effect = sink.poff_effect();
        sink.send_magic_effect(position, effect);
        assert_eq!(
            sink.outbox.flattened(),
            vec![Notification::MagicEffect {
                position,
                effect: EFFECT_POFF
            }]
        );
    }
}
