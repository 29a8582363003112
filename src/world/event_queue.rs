use crate::entities::thing::{Cleanup, ThingId};
use crate::world::kinds::KindId;
use crate::world::position::Position;
use crate::world::time::GameTick;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// Work the world performs when a timer fires. Events describe what they
/// expect to find so a stale timer can be recognised and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    TileDecay {
        position: Position,
        from: KindId,
        to: KindId,
    },
    /// Owned by the decaying item, so removing the item cancels it.
    ItemDecay {
        position: Position,
        thing: ThingId,
        from: KindId,
        to: KindId,
    },
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: EventId,
    due: GameTick,
}

/// Min-heap by due tick, then by id so equal ticks fire in schedule order
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.due == other.due
    }
}

impl Eq for QueueEntry {}

#[derive(Debug, Clone, Copy)]
struct PendingEvent {
    due: GameTick,
    owner: Option<ThingId>,
    event: ScheduledEvent,
}

/// One-shot timers keyed by id. Cancelled entries stay in the heap and are
/// discarded lazily when they reach the front.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<QueueEntry>,
    pending: HashMap<EventId, PendingEvent>,
    next_id: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        event: ScheduledEvent,
        owner: Option<ThingId>,
        delay: u64,
        now: GameTick,
    ) -> EventId {
        self.next_id += 1;
        let id = EventId(self.next_id);
        let due = now.after(delay);
        self.pending.insert(id, PendingEvent { due, owner, event });
        self.heap.push(QueueEntry { id, due });
        id
    }

    pub fn cancel(&mut self, id: EventId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Next event due at or before `now`, removed from the queue.
    pub fn pop_due(&mut self, now: GameTick) -> Option<(EventId, ScheduledEvent)> {
        loop {
            let entry = *self.heap.peek()?;
            match self.pending.get(&entry.id) {
                Some(active) if active.due == entry.due => {
                    if entry.due > now {
                        return None;
                    }
                    self.heap.pop();
                    let pending = self.pending.remove(&entry.id)?;
                    return Some((entry.id, pending.event));
                }
                _ => {
                    self.heap.pop();
                }
            }
        }
    }

    pub fn next_due(&mut self) -> Option<GameTick> {
        loop {
            let entry = *self.heap.peek()?;
            if self.pending.contains_key(&entry.id) {
                return Some(entry.due);
            }
            self.heap.pop();
        }
    }

    pub fn remaining(&self, id: EventId, now: GameTick) -> Option<u64> {
        let pending = self.pending.get(&id)?;
        Some(pending.due.0.saturating_sub(now.0))
    }

    pub fn get(&self, id: EventId) -> Option<ScheduledEvent> {
        self.pending.get(&id).map(|pending| pending.event)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Cleanup for EventQueue {
    fn cancel_owned(&mut self, owner: ThingId) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, pending| pending.owner != Some(owner));
        before - self.pending.len()
    }
}
