use crate::entities::actor::{Actor, CreatureId};
use crate::entities::thing::{Parent, Thing, ThingId, MAXIMUM_STACK_COUNT};
use crate::error::{WorldError, WorldResult};
use crate::world::event_queue::{EventId, ScheduledEvent};
use crate::world::housing::House;
use crate::world::item_stack::{ItemStack, StackIndex, DEFAULT_MAXIMUM_SIZE};
use crate::world::kinds::{Decay, FloorChange, Kind, KindId, KindIndex, DEFAULT_FRICTION};
use crate::world::notifications::{Notification, TileContext};
use crate::world::pathfinder::PathfinderNode;
use crate::world::position::Position;
use crate::world::zone_flags::ZoneFlags;
use std::collections::HashMap;
use std::sync::Arc;

pub const HOUSE_CANCELLATION: &str = "You do not own this house.";

/// Read access to tiles by coordinate.
pub trait TileLookup {
    fn tile_at(&self, position: Position) -> Option<&Tile>;
}

pub trait TileLookupMut: TileLookup {
    fn tile_at_mut(&mut self, position: Position) -> Option<&mut Tile>;
}

impl TileLookup for HashMap<Position, Tile> {
    fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.get(&position)
    }
}

impl TileLookupMut for HashMap<Position, Tile> {
    fn tile_at_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.get_mut(&position)
    }
}

/// What happened to a thing handed to the tile.
#[must_use]
#[derive(Debug)]
pub enum Placement {
    /// Stored as a new element at the slot.
    Inserted(usize),
    /// Combined into the stackable element at the slot.
    Merged(usize),
    /// Destroyed by overflow or a trashholder.
    Discarded,
    /// Refused without mutation; the thing is handed back.
    Rejected(Thing),
}

impl Placement {
    pub fn is_stored(&self) -> bool {
        matches!(self, Placement::Inserted(_) | Placement::Merged(_))
    }
}

/// Take-once callback fired when the last creature leaves the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitListener {
    CloseDoor(ThingId),
}

impl ExitListener {
    fn subject(self) -> ThingId {
        match self {
            ExitListener::CloseDoor(id) => id,
        }
    }
}

/// Why an actor may not step onto a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstruction {
    BlockSolid,
    UnownedHouse,
    Items,
    Characters,
}

#[derive(Debug)]
pub struct Tile {
    position: Position,
    kind_id: KindId,
    kind: Option<Arc<Kind>>,
    zone_flags: Option<ZoneFlags>,
    house: Option<Arc<House>>,
    item_stack: Option<ItemStack>,
    creatures: Option<Vec<CreatureId>>,
    pathfinder_node: Option<PathfinderNode>,
    exit_listeners: Vec<ExitListener>,
    maximum_items: usize,
}

impl Tile {
    pub fn new(position: Position, kind_id: KindId, kinds: &KindIndex) -> WorldResult<Self> {
        let kind = if kind_id.is_void() {
            None
        } else {
            Some(kinds.lookup(kind_id)?)
        };
        Ok(Self {
            position,
            kind_id,
            kind,
            zone_flags: None,
            house: None,
            item_stack: None,
            creatures: None,
            pathfinder_node: None,
            exit_listeners: Vec::new(),
            maximum_items: DEFAULT_MAXIMUM_SIZE,
        })
    }

    pub fn with_maximum_items(mut self, maximum_items: usize) -> Self {
        self.maximum_items = maximum_items.max(1);
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind_id(&self) -> KindId {
        self.kind_id
    }

    pub fn kind(&self) -> Option<&Kind> {
        self.kind.as_deref()
    }

    pub fn friction(&self) -> u16 {
        self.kind.as_ref().map_or(DEFAULT_FRICTION, |kind| kind.friction)
    }

    pub fn zone_flags(&self) -> ZoneFlags {
        self.zone_flags.unwrap_or_default()
    }

    pub fn set_zone_flags(&mut self, flags: ZoneFlags) {
        self.zone_flags = if flags.is_empty() { None } else { Some(flags) };
    }

    pub fn house(&self) -> Option<&House> {
        self.house.as_deref()
    }

    pub fn set_house(&mut self, house: Option<Arc<House>>) {
        self.house = house;
    }

    pub fn is_house_tile(&self) -> bool {
        self.house.is_some()
    }

    pub fn is_protection_zone(&self) -> bool {
        self.zone_flags().is_protection_zone()
    }

    pub fn is_no_logout_zone(&self) -> bool {
        self.zone_flags().is_no_logout()
    }

    // Items

    pub fn has_items(&self) -> bool {
        self.item_stack.is_some()
    }

    pub fn items(&self) -> &[Thing] {
        self.item_stack
            .as_ref()
            .map(ItemStack::as_slice)
            .unwrap_or(&[])
    }

    pub fn top_item(&self) -> Option<&Thing> {
        self.item_stack.as_ref().and_then(ItemStack::top_item)
    }

    pub fn peek_index(&self, index: StackIndex) -> Option<&Thing> {
        self.item_stack.as_ref()?.peek_index(index)
    }

    pub fn is_valid_index(&self, index: StackIndex) -> bool {
        match &self.item_stack {
            Some(stack) => stack.is_valid_index(index),
            None => index == StackIndex::Top,
        }
    }

    pub fn is_full(&self) -> bool {
        self.item_stack.as_ref().map_or(false, ItemStack::is_full)
    }

    pub fn exit_listeners(&self) -> &[ExitListener] {
        &self.exit_listeners
    }

    pub fn add_top_thing(&mut self, thing: Thing, ctx: &mut dyn TileContext) -> Placement {
        self.add_thing(thing, StackIndex::Top, ctx)
    }

    pub fn add_thing(
        &mut self,
        mut thing: Thing,
        index: StackIndex,
        ctx: &mut dyn TileContext,
    ) -> Placement {
        if !self.is_valid_index(index) {
            return Placement::Rejected(thing);
        }

        if self.is_full() {
            self.eliminate(thing, ctx);
            return Placement::Discarded;
        }

        if let Some(stack) = &self.item_stack {
            if stack.has_open_magic_door() || (thing.is_magic_door() && stack.has_magic_door()) {
                return Placement::Rejected(thing);
            }
        }

        if thing.is_magic_door() && thing.is_opened() {
            self.exit_listeners.push(ExitListener::CloseDoor(thing.id()));
        }

        thing.set_parent(Parent::Tile(self.position));

        if let Some(slot) = self.stacking_slot(&thing, index) {
            self.combine(slot, thing, ctx);
            return Placement::Merged(slot);
        }

        Placement::Inserted(self.insert_at(index, thing, ctx))
    }

    /// Top insertion for item moves: trashholder tiles swallow the thing.
    pub fn place_thing(&mut self, thing: Thing, ctx: &mut dyn TileContext) -> Placement {
        if self.is_trashholder() {
            self.eliminate(thing, ctx);
            return Placement::Discarded;
        }
        self.add_top_thing(thing, ctx)
    }

    /// Takes a thing off the tile. Stackables give up `amount`, splitting the
    /// element when less than all of it is requested.
    pub fn remove_index(
        &mut self,
        index: StackIndex,
        amount: u16,
        ctx: &mut dyn TileContext,
    ) -> Option<Thing> {
        let stack = self.item_stack.as_ref()?;
        let slot = stack.resolve(index)?;
        let current = stack.as_slice().get(slot)?;

        if !current.is_stackable() {
            return self.take_at(slot, ctx);
        }

        let count = current.count();
        if amount == 0 || amount > count {
            return None;
        }
        if amount == count {
            return self.take_at(slot, ctx);
        }

        let previous = self.replace_fungible(slot, count - amount, ctx)?;
        Some(previous.create_fungible_thing(amount))
    }

    /// Removes the thing with the given identity; returns the slot it held.
    pub fn delete_thing(&mut self, id: ThingId, ctx: &mut dyn TileContext) -> Option<usize> {
        let slot = self.item_stack.as_ref()?.position_of(id)?;
        self.take_at(slot, ctx).map(|_| slot)
    }

    pub fn delete_index(&mut self, index: StackIndex, ctx: &mut dyn TileContext) -> Option<Thing> {
        let slot = self.item_stack.as_ref()?.resolve(index)?;
        self.take_at(slot, ctx)
    }

    /// Restores a persisted thing on top of the stack without notifying
    /// anybody. Records that would overfill the stack or hold a second magic
    /// door are corrupt.
    pub(crate) fn load_thing(&mut self, mut thing: Thing) -> WorldResult<()> {
        if let Some(stack) = &self.item_stack {
            if stack.is_full() {
                return Err(WorldError::Config(format!(
                    "tile {} holds more than {} items",
                    self.position,
                    stack.maximum_size()
                )));
            }
            if thing.is_magic_door() && stack.has_magic_door() {
                return Err(WorldError::Config(format!(
                    "tile {} holds a second magic door",
                    self.position
                )));
            }
        }
        if thing.is_magic_door() && thing.is_opened() {
            self.exit_listeners.push(ExitListener::CloseDoor(thing.id()));
        }
        thing.set_parent(Parent::Tile(self.position));
        let maximum_items = self.maximum_items;
        self.item_stack
            .get_or_insert_with(|| ItemStack::new(maximum_items))
            .add_thing(StackIndex::Top, thing);
        Ok(())
    }

    /// How many of a thing the actor may drop at `index`.
    pub fn maximum_add_count(&self, actor: &dyn Actor, index: StackIndex) -> u16 {
        if !self.is_valid_index(index) {
            return 0;
        }
        if self.is_house_tile() && !actor.owns_house_tile(self) {
            return 0;
        }
        if self.is_trashholder() {
            return MAXIMUM_STACK_COUNT;
        }
        let Some(stack) = &self.item_stack else {
            return MAXIMUM_STACK_COUNT;
        };
        if stack.is_full() || stack.has_magic_door() {
            return 0;
        }
        MAXIMUM_STACK_COUNT
    }

    fn stacking_slot(&self, thing: &Thing, index: StackIndex) -> Option<usize> {
        if !thing.is_stackable() {
            return None;
        }
        let stack = self.item_stack.as_ref()?;
        let slot = stack.resolve(index)?;
        let current = stack.as_slice().get(slot)?;
        let mergeable = current.kind_id() == thing.kind_id()
            && current.is_stackable()
            && current.count() < MAXIMUM_STACK_COUNT;
        mergeable.then_some(slot)
    }

    fn combine(&mut self, slot: usize, incoming: Thing, ctx: &mut dyn TileContext) {
        let existing = match self.items().get(slot) {
            Some(existing) => existing.count(),
            None => return,
        };
        let total = u32::from(existing) + u32::from(incoming.count());
        let maximum = u32::from(MAXIMUM_STACK_COUNT);

        if total <= maximum {
            self.replace_fungible(slot, total as u16, ctx);
            return;
        }

        self.replace_fungible(slot, MAXIMUM_STACK_COUNT, ctx);
        let overflow = incoming.create_fungible_thing((total - maximum) as u16);
        if let Placement::Rejected(overflow) = self.add_top_thing(overflow, ctx) {
            self.eliminate(overflow, ctx);
        }
    }

    /// Swaps the element at `slot` for a fresh one of the same kind holding
    /// `count`, at the same slot. Returns the element that was taken out.
    fn replace_fungible(
        &mut self,
        slot: usize,
        count: u16,
        ctx: &mut dyn TileContext,
    ) -> Option<Thing> {
        let previous = self.take_at(slot, ctx)?;
        let replacement = previous.create_fungible_thing(count);
        self.insert_at(StackIndex::At(slot), replacement, ctx);
        Some(previous)
    }

    fn insert_at(&mut self, index: StackIndex, mut thing: Thing, ctx: &mut dyn TileContext) -> usize {
        thing.set_parent(Parent::Tile(self.position));
        let descriptor = thing.descriptor();
        let id = thing.id();
        let decay = thing.kind().decay;
        let maximum_items = self.maximum_items;
        let stack = self
            .item_stack
            .get_or_insert_with(|| ItemStack::new(maximum_items));
        let slot = match index {
            StackIndex::Top => stack.len(),
            StackIndex::At(slot) => slot.min(stack.len()),
        };
        stack.add_thing(StackIndex::At(slot), thing);

        ctx.broadcast(Notification::ItemAdded {
            position: self.position,
            thing: descriptor,
            index: slot,
        });
        if let Some(decay) = decay {
            self.schedule_item_decay(id, descriptor.kind, decay, ctx);
        }
        slot
    }

    fn take_at(&mut self, slot: usize, ctx: &mut dyn TileContext) -> Option<Thing> {
        let stack = self.item_stack.as_mut()?;
        let mut thing = stack.delete_thing(StackIndex::At(slot))?;
        if stack.is_empty() {
            self.item_stack = None;
        }
        let id = thing.id();
        self.exit_listeners.retain(|listener| listener.subject() != id);

        ctx.broadcast(Notification::ItemRemoved {
            position: self.position,
            index: slot,
            previous_count: thing.count(),
        });
        thing.cleanup(ctx.timers());
        Some(thing)
    }

    fn eliminate(&self, mut thing: Thing, ctx: &mut dyn TileContext) {
        log::debug!(
            "tile {} discarded thing {:?} of kind {}",
            self.position,
            thing.id(),
            thing.kind_id()
        );
        let effect = ctx.poff_effect();
        ctx.send_magic_effect(self.position, effect);
        thing.cleanup(ctx.timers());
    }

    // Creatures

    pub fn has_occupants(&self) -> bool {
        self.creatures.is_some()
    }

    pub fn creatures(&self) -> &[CreatureId] {
        self.creatures.as_deref().unwrap_or(&[])
    }

    pub fn creature(&self) -> Option<CreatureId> {
        self.creatures().first().copied()
    }

    pub fn number_characters(&self) -> usize {
        self.creatures().len()
    }

    /// Puts the actor on the tile. Players entering a protection zone drop
    /// their combat lock and their target.
    pub fn add_creature(&mut self, actor: &mut dyn Actor) {
        if actor.is_player_type() && self.is_protection_zone() {
            if actor.is_in_combat() {
                log::info!("{} entered protection zone at {}, combat released", actor.name(), self.position);
                actor.release_combat_lock();
            }
            if actor.has_target() {
                actor.clear_target();
            }
        }

        let id = actor.id();
        let creatures = self.creatures.get_or_insert_with(Vec::new);
        if !creatures.contains(&id) {
            creatures.push(id);
        }
    }

    /// Returns false when the creature was not on the tile.
    pub fn remove_creature(&mut self, id: CreatureId, ctx: &mut dyn TileContext) -> WorldResult<bool> {
        let Some(creatures) = self.creatures.as_mut() else {
            return Ok(false);
        };
        let Some(slot) = creatures.iter().position(|creature| *creature == id) else {
            return Ok(false);
        };
        creatures.remove(slot);
        if !creatures.is_empty() {
            return Ok(true);
        }
        self.creatures = None;

        for listener in std::mem::take(&mut self.exit_listeners) {
            match listener {
                ExitListener::CloseDoor(door) => {
                    self.close_magic_door(door, ctx)?;
                }
            }
        }
        Ok(true)
    }

    /// Turns an open magic door into its closed counterpart, keeping its
    /// identity and slot. Stale listeners are ignored.
    fn close_magic_door(&mut self, id: ThingId, ctx: &mut dyn TileContext) -> WorldResult<bool> {
        let Some(slot) = self.items().iter().position(|thing| thing.id() == id) else {
            return Ok(false);
        };
        let door = &self.items()[slot];
        let toggle_to = match door.kind().door {
            Some(state) if door.is_magic_door() && state.opened => state.toggle_to,
            _ => return Ok(false),
        };
        let closed = ctx.kinds().lookup(toggle_to)?;
        Ok(self.transform_at(slot, closed, ctx))
    }

    /// Changes the kind of the item at `slot` in place. Clients see it as a
    /// removal followed by an insertion at the same slot.
    fn transform_at(&mut self, slot: usize, kind: Arc<Kind>, ctx: &mut dyn TileContext) -> bool {
        let Some(thing) = self.item_stack.as_mut().and_then(|stack| stack.get_mut(slot)) else {
            return false;
        };
        let previous_count = thing.count();
        thing.transform(kind);
        let descriptor = thing.descriptor();

        ctx.broadcast(Notification::ItemRemoved {
            position: self.position,
            index: slot,
            previous_count,
        });
        ctx.broadcast(Notification::ItemAdded {
            position: self.position,
            thing: descriptor,
            index: slot,
        });
        true
    }

    // Occupancy and movement

    fn is_ground_block_solid(&self) -> bool {
        self.kind.as_ref().map_or(true, |kind| kind.block_solid)
    }

    pub fn is_block_solid(&self) -> bool {
        self.is_ground_block_solid()
            || self.item_stack.as_ref().map_or(false, ItemStack::is_block_solid)
    }

    pub fn is_occupied(&self) -> bool {
        self.is_block_solid()
    }

    pub fn is_occupied_characters(&self) -> bool {
        self.has_occupants()
    }

    pub fn is_occupied_any(&self) -> bool {
        self.is_occupied() || self.is_occupied_characters()
    }

    pub fn is_trashholder(&self) -> bool {
        match &self.kind {
            None => false,
            Some(kind) => {
                kind.trashholder
                    || self.item_stack.as_ref().map_or(false, ItemStack::is_trashholder)
            }
        }
    }

    pub fn is_block_projectile(&self) -> bool {
        self.item_stack
            .as_ref()
            .map_or(false, ItemStack::is_block_projectile)
    }

    pub fn has_elevation(&self) -> bool {
        self.item_stack.as_ref().map_or(false, ItemStack::has_elevation)
    }

    /// First reason the actor may not enter, checked in a fixed order.
    pub fn obstruction_for(&self, actor: &dyn Actor) -> Option<Obstruction> {
        if self.is_ground_block_solid() {
            return Some(Obstruction::BlockSolid);
        }
        if self.is_house_tile() && !actor.owns_house_tile(self) {
            return Some(Obstruction::UnownedHouse);
        }
        if self.item_stack.as_ref().map_or(false, ItemStack::is_block_solid) {
            return Some(Obstruction::Items);
        }
        if self.is_occupied_characters() {
            return Some(Obstruction::Characters);
        }
        None
    }

    /// Step cost when arriving from `from`.
    pub fn weight(&self, from: Position) -> u32 {
        let friction = u32::from(self.friction());
        if self.position.is_diagonal(from) {
            3 * friction
        } else {
            friction
        }
    }

    // Pathfinding scratch state

    pub fn enable_pathfinding(&mut self) {
        self.pathfinder_node = Some(PathfinderNode::default());
    }

    pub fn disable_pathfinding(&mut self) {
        self.pathfinder_node = None;
    }

    pub fn pathfinder_node(&self) -> Option<&PathfinderNode> {
        self.pathfinder_node.as_ref()
    }

    pub fn pathfinder_node_mut(&mut self) -> Option<&mut PathfinderNode> {
        self.pathfinder_node.as_mut()
    }

    pub fn score(&self) -> Option<u32> {
        self.pathfinder_node.as_ref().map(|node| node.score)
    }

    // Floor change

    pub fn floor_change(&self) -> Option<FloorChange> {
        let kind = self.kind.as_ref()?;
        kind.floor_change
            .or_else(|| self.item_stack.as_ref().and_then(ItemStack::floor_change))
    }

    pub fn has_destination(&self) -> bool {
        self.floor_change().is_some()
            || self
                .item_stack
                .as_ref()
                .and_then(ItemStack::teleporter_destination)
                .is_some()
    }

    /// Where a creature stepping on this tile ends up, if anywhere else.
    pub fn destination(&self, world: &dyn TileLookup) -> Option<Position> {
        if let Some(target) = self
            .item_stack
            .as_ref()
            .and_then(ItemStack::teleporter_destination)
        {
            return Some(target);
        }

        match self.floor_change()? {
            FloorChange::Down => self.inverse_floor_change(world),
            change => {
                let direction = change.direction()?;
                self.position.step(direction)?.up()
            }
        }
    }

    fn inverse_floor_change(&self, world: &dyn TileLookup) -> Option<Position> {
        let below = world.tile_at(self.position.down()?)?;
        match below.floor_change().and_then(FloorChange::direction) {
            Some(direction) => below.position.step(direction.opposite()),
            None => Some(below.position),
        }
    }

    // Decay

    pub fn is_decaying(&self) -> bool {
        self.kind.as_ref().map_or(false, |kind| kind.is_decaying())
    }

    pub fn schedule_decay(&self, ctx: &mut dyn TileContext) -> Option<EventId> {
        let decay = self.kind.as_ref()?.decay?;
        let event = ScheduledEvent::TileDecay {
            position: self.position,
            from: self.kind_id,
            to: decay.to,
        };
        // At least one tick, so a decay chain always leaves the current tick.
        Some(ctx.schedule(event, None, decay.duration.max(1)))
    }

    /// Changes the tile kind, re-arming decay when the new kind decays too.
    pub fn replace(&mut self, kind_id: KindId, ctx: &mut dyn TileContext) -> WorldResult<()> {
        self.kind = if kind_id.is_void() {
            None
        } else {
            Some(ctx.kinds().lookup(kind_id)?)
        };
        self.kind_id = kind_id;

        if self.is_decaying() {
            self.schedule_decay(ctx);
        }

        ctx.broadcast(Notification::TileUpdated {
            position: self.position,
            kind: kind_id,
        });
        Ok(())
    }

    fn schedule_item_decay(
        &self,
        id: ThingId,
        from: KindId,
        decay: Decay,
        ctx: &mut dyn TileContext,
    ) -> EventId {
        let event = ScheduledEvent::ItemDecay {
            position: self.position,
            thing: id,
            from,
            to: decay.to,
        };
        ctx.schedule(event, Some(id), decay.duration.max(1))
    }

    /// Arms decay for items that arrived without a context, as restored ones do.
    pub fn arm_item_decay(&self, ctx: &mut dyn TileContext) -> usize {
        let mut armed = 0;
        for thing in self.items() {
            if let Some(decay) = thing.kind().decay {
                self.schedule_item_decay(thing.id(), thing.kind_id(), decay, ctx);
                armed += 1;
            }
        }
        armed
    }

    /// Fires an item decay timer: the item turns into `to` or vanishes when
    /// `to` is void. Skipped when the item left the tile or changed kind.
    pub fn apply_item_decay(
        &mut self,
        id: ThingId,
        from: KindId,
        to: KindId,
        ctx: &mut dyn TileContext,
    ) -> WorldResult<bool> {
        let slot = self
            .items()
            .iter()
            .position(|thing| thing.id() == id && thing.kind_id() == from);
        let Some(slot) = slot else {
            log::debug!("stale item decay at {} for {:?} ({} -> {})", self.position, id, from, to);
            return Ok(false);
        };
        if to.is_void() {
            return Ok(self.take_at(slot, ctx).is_some());
        }
        let kind = ctx.kinds().lookup(to)?;
        let decay = kind.decay;
        self.transform_at(slot, kind, ctx);
        if let Some(decay) = decay {
            self.schedule_item_decay(id, to, decay, ctx);
        }
        Ok(true)
    }

    /// Fires a decay timer. Skipped when the tile no longer has the kind
    /// the timer was armed for.
    pub fn apply_decay(
        &mut self,
        from: KindId,
        to: KindId,
        ctx: &mut dyn TileContext,
    ) -> WorldResult<bool> {
        if self.kind_id != from {
            log::debug!("stale decay at {} ({} -> {}), tile is {}", self.position, from, to, self.kind_id);
            return Ok(false);
        }
        self.replace(to, ctx)?;
        Ok(true)
    }
}

/// Movement check used by the walking pipeline. Unowned house tiles tell the
/// actor why.
pub fn is_tile_occupied(actor: &mut dyn Actor, tile: &Tile) -> bool {
    match tile.obstruction_for(&*actor) {
        Some(Obstruction::UnownedHouse) => {
            actor.send_cancellation(HOUSE_CANCELLATION);
            true
        }
        Some(_) => true,
        None => false,
    }
}
