use crate::config::WorldConfig;
use crate::entities::actor::Actor;
use crate::entities::thing::{Cleanup, Thing, ThingId};
use crate::error::{WorldError, WorldResult};
use crate::world::event_queue::{EventId, EventQueue, ScheduledEvent};
use crate::world::housing::House;
use crate::world::item_stack::StackIndex;
use crate::world::kinds::{KindId, KindIndex, DEFAULT_FRICTION};
use crate::world::notifications::{Notification, RegionOutbox, SectorCoord, TileContext};
use crate::world::pathfinder::{self, SearchLimits};
use crate::world::position::{Direction, Position};
use crate::world::tile::{is_tile_occupied, Placement, Tile, TileLookup, TileLookupMut};
use crate::world::time::{GameClock, GameTick};
use std::collections::HashMap;
use std::sync::Arc;

pub const NOT_ENOUGH_ROOM: &str = "There is not enough room.";

/// Collaborators shared by every tile of one world.
#[derive(Debug)]
pub struct WorldServices {
    kinds: KindIndex,
    events: EventQueue,
    outbox: RegionOutbox,
    clock: GameClock,
    poff_effect: u16,
}

impl WorldServices {
    pub fn new(kinds: KindIndex, config: &WorldConfig) -> Self {
        Self {
            kinds,
            events: EventQueue::new(),
            outbox: RegionOutbox::new(config.region_size),
            clock: GameClock::new(config.tick_length()),
            poff_effect: config.poff_effect,
        }
    }

    pub fn now(&self) -> GameTick {
        self.clock.now()
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn outbox(&self) -> &RegionOutbox {
        &self.outbox
    }
}

impl TileContext for WorldServices {
    fn kinds(&self) -> &KindIndex {
        &self.kinds
    }

    fn broadcast(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    fn poff_effect(&self) -> u16 {
        self.poff_effect
    }

    fn schedule(&mut self, event: ScheduledEvent, owner: Option<ThingId>, delay: u64) -> EventId {
        let now = self.clock.now();
        self.events.set(event, owner, delay, now)
    }

    fn timers(&mut self) -> &mut dyn Cleanup {
        &mut self.events
    }
}

/// The tile grid of one world together with its services. Owned by the
/// game thread; every mutation goes through here.
#[derive(Debug)]
pub struct World {
    tiles: HashMap<Position, Tile>,
    houses: HashMap<u32, Arc<House>>,
    services: WorldServices,
    item_stack_size: usize,
    limits: SearchLimits,
}

impl World {
    pub fn new(kinds: KindIndex, config: &WorldConfig) -> Self {
        let minimum_friction = kinds
            .iter()
            .map(|(_, kind)| kind.friction)
            .filter(|friction| *friction > 0)
            .min()
            .unwrap_or(DEFAULT_FRICTION);
        Self {
            tiles: HashMap::new(),
            houses: HashMap::new(),
            services: WorldServices::new(kinds, config),
            item_stack_size: config.item_stack_size,
            limits: SearchLimits {
                node_budget: config.pathfinder_budget,
                minimum_friction,
            },
        }
    }

    pub fn kinds(&self) -> &KindIndex {
        &self.services.kinds
    }

    pub fn services(&self) -> &WorldServices {
        &self.services
    }

    pub fn now(&self) -> GameTick {
        self.services.now()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    /// Builds a tile sized for this world. An existing tile at the position
    /// is replaced.
    pub fn create_tile(&mut self, position: Position, kind: KindId) -> WorldResult<&mut Tile> {
        let tile = Tile::new(position, kind, &self.services.kinds)?
            .with_maximum_items(self.item_stack_size);
        self.tiles.insert(position, tile);
        self.tiles
            .get_mut(&position)
            .ok_or(WorldError::UnknownTile(position))
    }

    /// Runs `f` against one tile with the world services as its context.
    pub fn with_tile<R>(
        &mut self,
        position: Position,
        f: impl FnOnce(&mut Tile, &mut dyn TileContext) -> R,
    ) -> WorldResult<R> {
        let tile = self
            .tiles
            .get_mut(&position)
            .ok_or(WorldError::UnknownTile(position))?;
        Ok(f(tile, &mut self.services))
    }

    pub fn create_thing(&self, kind: KindId, count: u16) -> WorldResult<Thing> {
        Thing::with_count(&self.services.kinds, kind, count)
    }

    /// Registers houses and links them to their tiles. Fields without a tile
    /// are reported and skipped.
    pub fn add_houses(&mut self, houses: Vec<House>) -> usize {
        let mut linked = 0;
        for house in houses {
            let house = Arc::new(house);
            for field in &house.fields {
                match self.tiles.get_mut(field) {
                    Some(tile) => {
                        tile.set_house(Some(Arc::clone(&house)));
                        linked += 1;
                    }
                    None => log::warn!("house {} field {} has no tile", house.id, field),
                }
            }
            self.houses.insert(house.id, house);
        }
        linked
    }

    pub fn house(&self, id: u32) -> Option<&House> {
        self.houses.get(&id).map(|house| house.as_ref())
    }

    /// Schedules decay for every decaying tile and item of a freshly restored
    /// world. Returns how many timers were armed.
    pub fn arm_decay(&mut self) -> usize {
        let mut tiles = 0;
        let mut items = 0;
        for tile in self.tiles.values() {
            if tile.schedule_decay(&mut self.services).is_some() {
                tiles += 1;
            }
            items += tile.arm_item_decay(&mut self.services);
        }
        if tiles + items > 0 {
            log::info!("armed {} tile and {} item decay timers", tiles, items);
        }
        tiles + items
    }

    /// Moves the clock forward, firing every timer that falls due on the way
    /// at its own tick. Returns the number of events fired.
    pub fn advance(&mut self, ticks: u64) -> WorldResult<usize> {
        let target = self.services.clock.now().after(ticks);
        let mut fired = 0;

        while let Some(due) = self.services.events.next_due() {
            if due > target {
                break;
            }
            let now = self.services.clock.now();
            if due > now {
                self.services.clock.advance(due.0 - now.0);
            }
            while let Some((_, event)) = self.services.events.pop_due(self.services.clock.now()) {
                self.dispatch(event)?;
                fired += 1;
            }
        }

        let now = self.services.clock.now();
        if target > now {
            self.services.clock.advance(target.0 - now.0);
        }
        Ok(fired)
    }

    fn dispatch(&mut self, event: ScheduledEvent) -> WorldResult<()> {
        match event {
            ScheduledEvent::TileDecay { position, from, to } => {
                let Some(tile) = self.tiles.get_mut(&position) else {
                    log::debug!("decay for missing tile {} dropped", position);
                    return Ok(());
                };
                if tile.apply_decay(from, to, &mut self.services)? {
                    log::debug!("tile {} decayed {} -> {}", position, from, to);
                }
            }
            ScheduledEvent::ItemDecay { position, thing, from, to } => {
                let Some(tile) = self.tiles.get_mut(&position) else {
                    log::debug!("item decay for missing tile {} dropped", position);
                    return Ok(());
                };
                if tile.apply_item_decay(thing, from, to, &mut self.services)? {
                    log::debug!("item {:?} at {} decayed {} -> {}", thing, position, from, to);
                }
            }
        }
        Ok(())
    }

    /// Hands out everything queued since the last drain, grouped by sector.
    pub fn drain_notifications(&mut self) -> Vec<(SectorCoord, Vec<Notification>)> {
        self.services.outbox.drain()
    }

    pub fn destination(&self, position: Position) -> Option<Position> {
        self.tiles.get(&position)?.destination(&self.tiles)
    }

    pub fn find_path(
        &mut self,
        from: Position,
        to: Position,
        actor: &dyn Actor,
    ) -> Option<Vec<Position>> {
        pathfinder::find_path(&mut self.tiles, from, to, actor, self.limits)
    }

    /// Puts a creature onto a tile without any movement checks.
    pub fn place_creature(&mut self, actor: &mut dyn Actor, position: Position) -> WorldResult<()> {
        let tile = self
            .tiles
            .get_mut(&position)
            .ok_or(WorldError::UnknownTile(position))?;
        tile.add_creature(actor);
        Ok(())
    }

    /// Walks a creature one step. Floor changes and teleporters on the
    /// entered tile carry it on. Returns where it ended up, or `None` when the
    /// move is not possible.
    pub fn move_creature(
        &mut self,
        actor: &mut dyn Actor,
        from: Position,
        direction: Direction,
    ) -> WorldResult<Option<Position>> {
        let Some(next) = from.step(direction) else {
            return Ok(None);
        };
        let Some(entered) = self.tiles.get(&next) else {
            log::debug!("{} cannot move to {}: missing tile", actor.name(), next);
            return Ok(None);
        };
        if is_tile_occupied(actor, entered) {
            return Ok(None);
        }

        let mut landing = next;
        if let Some(target) = entered.destination(&self.tiles) {
            match self.tiles.get(&target) {
                Some(tile) if !is_tile_occupied(actor, tile) => landing = target,
                Some(_) => return Ok(None),
                None => log::warn!("floor change at {} leads to missing tile {}", next, target),
            }
        }

        if let Some(tile) = self.tiles.get_mut(&from) {
            tile.remove_creature(actor.id(), &mut self.services)?;
        }
        self.place_creature(actor, landing)?;
        Ok(Some(landing))
    }

    /// Removes a creature from a tile, firing the tile's exit listeners.
    pub fn remove_creature(&mut self, actor: &dyn Actor, position: Position) -> WorldResult<bool> {
        let tile = self
            .tiles
            .get_mut(&position)
            .ok_or(WorldError::UnknownTile(position))?;
        tile.remove_creature(actor.id(), &mut self.services)
    }

    pub fn place_thing(&mut self, position: Position, thing: Thing) -> WorldResult<Placement> {
        self.with_tile(position, |tile, ctx| tile.place_thing(thing, ctx))
    }

    /// Moves `amount` of the thing at `index` from one tile onto another on
    /// behalf of an actor. Returns false when nothing moved.
    pub fn move_thing(
        &mut self,
        actor: &mut dyn Actor,
        from: Position,
        index: StackIndex,
        amount: u16,
        to: Position,
    ) -> WorldResult<bool> {
        let room = self
            .tiles
            .get(&to)
            .ok_or(WorldError::UnknownTile(to))?
            .maximum_add_count(&*actor, StackIndex::Top);
        if room == 0 || room < amount {
            actor.send_cancellation(NOT_ENOUGH_ROOM);
            return Ok(false);
        }

        let Some(thing) = self.with_tile(from, |tile, ctx| tile.remove_index(index, amount, ctx))? else {
            return Ok(false);
        };
        if let Placement::Rejected(thing) = self.place_thing(to, thing)? {
            actor.send_cancellation(NOT_ENOUGH_ROOM);
            let returned = self.with_tile(from, |tile, ctx| tile.add_top_thing(thing, ctx))?;
            if !returned.is_stored() {
                log::warn!("thing moved from {} could not be put back", from);
            }
            return Ok(false);
        }
        Ok(true)
    }

    pub(crate) fn insert_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.position(), tile);
    }

    pub(crate) fn item_stack_size(&self) -> usize {
        self.item_stack_size
    }
}

impl TileLookup for World {
    fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }
}

impl TileLookupMut for World {
    fn tile_at_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(&position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::actor::{Creature, CreatureId, CreatureKind};
    use crate::world::kinds::{Decay, DoorState, FloorChange, Kind};
    use crate::world::zone_flags::ZoneFlags;

    const GRASS: KindId = KindId(102);
    const PICKHOLE: KindId = KindId(385);
    const HALF_HOLE: KindId = KindId(386);
    const EARTH: KindId = KindId(387);
    const STAIRS: KindId = KindId(1385);
    const CHEST: KindId = KindId(1740);
    const GOLD: KindId = KindId(2148);
    const OPEN_GATE: KindId = KindId(1223);
    const CLOSED_GATE: KindId = KindId(1222);
    const LIT_TORCH: KindId = KindId(2050);
    const BURNT_TORCH: KindId = KindId(2051);

    fn kinds() -> KindIndex {
        let mut kinds = KindIndex::default();
        kinds.insert(Kind::new(GRASS)).unwrap();
        let mut pickhole = Kind::new(PICKHOLE);
        pickhole.decay = Some(Decay { to: HALF_HOLE, duration: 40 });
        kinds.insert(pickhole).unwrap();
        let mut half = Kind::new(HALF_HOLE);
        half.decay = Some(Decay { to: EARTH, duration: 10 });
        kinds.insert(half).unwrap();
        kinds.insert(Kind::new(EARTH)).unwrap();
        let mut stairs = Kind::new(STAIRS);
        stairs.floor_change = Some(FloorChange::North);
        kinds.insert(stairs).unwrap();
        kinds.insert(Kind::new(CHEST)).unwrap();
        let mut gold = Kind::new(GOLD);
        gold.stackable = true;
        kinds.insert(gold).unwrap();
        let mut open_gate = Kind::new(OPEN_GATE);
        open_gate.magic_door = true;
        open_gate.door = Some(DoorState { opened: true, toggle_to: CLOSED_GATE });
        kinds.insert(open_gate).unwrap();
        let mut closed_gate = Kind::new(CLOSED_GATE);
        closed_gate.magic_door = true;
        closed_gate.door = Some(DoorState { opened: false, toggle_to: OPEN_GATE });
        kinds.insert(closed_gate).unwrap();
        let mut lit = Kind::new(LIT_TORCH);
        lit.decay = Some(Decay { to: BURNT_TORCH, duration: 20 });
        kinds.insert(lit).unwrap();
        let mut burnt = Kind::new(BURNT_TORCH);
        burnt.decay = Some(Decay { to: KindId::VOID, duration: 10 });
        kinds.insert(burnt).unwrap();
        kinds
    }

    fn world() -> World {
        let mut world = World::new(kinds(), &WorldConfig::default());
        for x in 100..104 {
            for y in 100..104 {
                world.create_tile(Position::new(x, y, 7), GRASS).unwrap();
                world.create_tile(Position::new(x, y, 6), GRASS).unwrap();
            }
        }
        world
    }

    fn player(name: &str, position: Position) -> Creature {
        Creature::new(CreatureId(1), name, CreatureKind::Player, position)
    }

    #[test]
    fn decay_fires_at_due_ticks_and_chains() {
        let mut world = world();
        let hole = Position::new(101, 101, 7);
        world.create_tile(hole, PICKHOLE).unwrap();
        assert_eq!(world.arm_decay(), 1);

        assert_eq!(world.advance(39).unwrap(), 0);
        assert_eq!(world.tile(hole).map(Tile::kind_id), Some(PICKHOLE));
        assert_eq!(world.advance(1).unwrap(), 1);
        assert_eq!(world.tile(hole).map(Tile::kind_id), Some(HALF_HOLE));
        assert_eq!(world.now(), GameTick(40));

        // The chained timer counts from the tick the first one fired.
        assert_eq!(world.advance(100).unwrap(), 1);
        assert_eq!(world.tile(hole).map(Tile::kind_id), Some(EARTH));
        assert_eq!(world.now(), GameTick(140));

        let drained = world.drain_notifications();
        let updates: Vec<Notification> = drained.into_iter().flat_map(|(_, batch)| batch).collect();
        assert_eq!(
            updates,
            vec![
                Notification::TileUpdated { position: hole, kind: HALF_HOLE },
                Notification::TileUpdated { position: hole, kind: EARTH },
            ]
        );
    }

    #[test]
    fn decay_of_replaced_tile_is_skipped() {
        let mut world = world();
        let hole = Position::new(101, 101, 7);
        world.create_tile(hole, PICKHOLE).unwrap();
        world.arm_decay();
        world
            .with_tile(hole, |tile, ctx| tile.replace(GRASS, ctx))
            .unwrap()
            .unwrap();
        assert_eq!(world.advance(50).unwrap(), 1);
        assert_eq!(world.tile(hole).map(Tile::kind_id), Some(GRASS));
    }

    #[test]
    fn zero_duration_decay_cycle_still_lets_time_pass() {
        let mut kinds = KindIndex::default();
        let mut ping = Kind::new(KindId(10));
        ping.decay = Some(Decay { to: KindId(11), duration: 0 });
        kinds.insert(ping).unwrap();
        let mut pong = Kind::new(KindId(11));
        pong.decay = Some(Decay { to: KindId(10), duration: 0 });
        kinds.insert(pong).unwrap();

        let mut world = World::new(kinds, &WorldConfig::default());
        let spot = Position::new(100, 100, 7);
        world.create_tile(spot, KindId(10)).unwrap();
        assert_eq!(world.arm_decay(), 1);
        assert_eq!(world.advance(3).unwrap(), 3);
        assert_eq!(world.tile(spot).map(Tile::kind_id), Some(KindId(11)));
        assert_eq!(world.now(), GameTick(3));
    }

    #[test]
    fn torch_burns_down_and_vanishes() {
        let mut world = world();
        let spot = Position::new(101, 101, 7);
        let torch = world.create_thing(LIT_TORCH, 1).unwrap();
        let id = torch.id();
        assert!(world.place_thing(spot, torch).unwrap().is_stored());
        assert_eq!(world.services().events().len(), 1);

        assert_eq!(world.advance(20).unwrap(), 1);
        let top = world.tile(spot).unwrap().top_item();
        assert_eq!(top.map(|thing| (thing.id(), thing.kind_id())), Some((id, BURNT_TORCH)));

        assert_eq!(world.advance(10).unwrap(), 1);
        assert!(!world.tile(spot).unwrap().has_items());
        assert!(world.services().events().is_empty());
    }

    #[test]
    fn moving_a_torch_cancels_its_old_timer() {
        let mut world = world();
        let from = Position::new(100, 100, 7);
        let to = Position::new(101, 100, 7);
        let torch = world.create_thing(LIT_TORCH, 1).unwrap();
        world.place_thing(from, torch).unwrap();
        assert_eq!(world.advance(15).unwrap(), 0);

        let mut mover = player("Eryn", from);
        assert!(world.move_thing(&mut mover, from, StackIndex::Top, 1, to).unwrap());
        assert_eq!(world.services().events().len(), 1);

        // The timer armed at tick 0 would have fired at 20.
        assert_eq!(world.advance(15).unwrap(), 0);
        assert_eq!(world.tile(to).unwrap().top_item().map(Thing::kind_id), Some(LIT_TORCH));
        assert_eq!(world.advance(5).unwrap(), 1);
        assert_eq!(world.tile(to).unwrap().top_item().map(Thing::kind_id), Some(BURNT_TORCH));
    }

    #[test]
    fn restored_torch_is_armed_with_the_tiles() {
        let mut world = World::new(kinds(), &WorldConfig::default());
        let record = crate::persistence::tile_records::TileRecord {
            position: Position::new(100, 100, 7),
            kind: PICKHOLE,
            zone_flags: 0,
            items: vec![crate::entities::thing::ThingDescriptor { kind: LIT_TORCH, count: 1 }],
        };
        crate::persistence::tile_records::restore(&mut world, &[record]).unwrap();
        assert!(world.services().events().is_empty());
        assert_eq!(world.arm_decay(), 2);
        assert_eq!(world.advance(20).unwrap(), 1);
        let tile = world.tile(Position::new(100, 100, 7)).unwrap();
        assert_eq!(tile.top_item().map(Thing::kind_id), Some(BURNT_TORCH));
        assert_eq!(tile.kind_id(), PICKHOLE);
    }

    #[test]
    fn stairs_carry_the_walker_upstairs() {
        let mut world = world();
        let start = Position::new(101, 102, 7);
        let stairs = Position::new(101, 101, 7);
        world.create_tile(stairs, STAIRS).unwrap();
        let mut walker = player("Eryn", start);
        world.place_creature(&mut walker, start).unwrap();

        let landed = world
            .move_creature(&mut walker, start, Direction::North)
            .unwrap();
        assert_eq!(landed, Some(Position::new(101, 100, 6)));
        assert!(!world.tile(start).unwrap().has_occupants());
        assert_eq!(
            world.tile(Position::new(101, 100, 6)).unwrap().creature(),
            Some(walker.id)
        );
    }

    #[test]
    fn walking_into_missing_tile_or_unowned_house_fails() {
        let mut world = world();
        let start = Position::new(100, 100, 7);
        let mut walker = player("Eryn", start);
        world.place_creature(&mut walker, start).unwrap();
        assert_eq!(world.move_creature(&mut walker, start, Direction::West).unwrap(), None);

        let mut house = House::new(7, "Mill");
        house.owner = Some("Tarek".to_string());
        house.fields.push(Position::new(101, 100, 7));
        assert_eq!(world.add_houses(vec![house]), 1);
        assert_eq!(world.house(7).map(|house| house.name.as_str()), Some("Mill"));
        assert_eq!(world.move_creature(&mut walker, start, Direction::East).unwrap(), None);
        assert_eq!(walker.cancellations.len(), 1);
        assert_eq!(world.tile(start).unwrap().creature(), Some(walker.id));
    }

    #[test]
    fn leaving_a_gate_tile_closes_the_gate() {
        let mut world = world();
        let gate_position = Position::new(102, 102, 7);
        let gate = world.create_thing(OPEN_GATE, 1).unwrap();
        assert!(world.place_thing(gate_position, gate).unwrap().is_stored());

        let mut walker = player("Eryn", gate_position);
        world.place_creature(&mut walker, gate_position).unwrap();
        let landed = world
            .move_creature(&mut walker, gate_position, Direction::South)
            .unwrap();
        assert_eq!(landed, Some(Position::new(102, 103, 7)));
        let top = world.tile(gate_position).unwrap().top_item().unwrap();
        assert_eq!(top.kind_id(), CLOSED_GATE);
    }

    #[test]
    fn protection_zone_entry_through_world_movement() {
        let mut world = world();
        let start = Position::new(100, 100, 7);
        let temple = Position::new(100, 101, 7);
        world
            .with_tile(temple, |tile, _| tile.set_zone_flags(ZoneFlags::PROTECTION_ZONE))
            .unwrap();
        let mut walker = player("Eryn", start);
        walker.in_combat = true;
        walker.target = Some(CreatureId(9));
        world.place_creature(&mut walker, start).unwrap();
        world.move_creature(&mut walker, start, Direction::South).unwrap();
        assert!(!walker.in_combat);
        assert_eq!(walker.target, None);
    }

    #[test]
    fn moving_coins_between_tiles_splits_the_pile() {
        let mut world = world();
        let from = Position::new(100, 100, 7);
        let to = Position::new(101, 100, 7);
        let coins = world.create_thing(GOLD, 60).unwrap();
        assert!(world.place_thing(from, coins).unwrap().is_stored());
        let mut mover = player("Eryn", from);

        assert!(world
            .move_thing(&mut mover, from, StackIndex::Top, 25, to)
            .unwrap());
        assert_eq!(world.tile(from).unwrap().top_item().map(Thing::count), Some(35));
        assert_eq!(world.tile(to).unwrap().top_item().map(Thing::count), Some(25));
        assert!(!world
            .move_thing(&mut mover, from, StackIndex::Top, 50, to)
            .unwrap());
        assert_eq!(world.tile(from).unwrap().top_item().map(Thing::count), Some(35));
    }

    #[test]
    fn moving_onto_a_full_tile_is_refused() {
        let mut world = World::new(
            kinds(),
            &WorldConfig {
                item_stack_size: 1,
                ..WorldConfig::default()
            },
        );
        let from = Position::new(100, 100, 7);
        let to = Position::new(101, 100, 7);
        world.create_tile(from, GRASS).unwrap();
        world.create_tile(to, GRASS).unwrap();
        let chest = world.create_thing(CHEST, 1).unwrap();
        assert!(world.place_thing(from, chest).unwrap().is_stored());
        let other = world.create_thing(CHEST, 1).unwrap();
        assert!(world.place_thing(to, other).unwrap().is_stored());

        let mut mover = player("Eryn", from);
        assert!(!world.move_thing(&mut mover, from, StackIndex::Top, 1, to).unwrap());
        assert_eq!(mover.cancellations, vec![NOT_ENOUGH_ROOM]);
        assert!(world.tile(from).unwrap().has_items());
    }

    #[test]
    fn notifications_are_grouped_per_sector() {
        let mut world = world();
        world.create_tile(Position::new(140, 100, 7), GRASS).unwrap();
        let a = world.create_thing(CHEST, 1).unwrap();
        let b = world.create_thing(CHEST, 1).unwrap();
        assert!(world.place_thing(Position::new(100, 100, 7), a).unwrap().is_stored());
        assert!(world.place_thing(Position::new(140, 100, 7), b).unwrap().is_stored());
        let drained = world.drain_notifications();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].0, SectorCoord { x: 3, y: 3, z: 7 });
        assert_eq!(drained[1].0, SectorCoord { x: 4, y: 3, z: 7 });
        assert!(world.services().outbox().is_empty());
    }

    #[test]
    fn unknown_positions_are_errors() {
        let mut world = world();
        let chest = world.create_thing(CHEST, 1).unwrap();
        assert!(matches!(
            world.place_thing(Position::new(1, 1, 7), chest),
            Err(WorldError::UnknownTile(_))
        ));
        assert!(world.create_tile(Position::new(1, 1, 7), KindId(4242)).is_err());
    }

    #[test]
    fn world_pathfinding_uses_configured_budget() {
        let mut world = world();
        let walker = player("Eryn", Position::new(100, 100, 7));
        let path = world
            .find_path(Position::new(100, 100, 7), Position::new(103, 103, 7), &walker)
            .expect("path");
        assert_eq!(path.last(), Some(&Position::new(103, 103, 7)));
        assert!(world.tiles().all(|tile| tile.pathfinder_node().is_none()));
    }
}
