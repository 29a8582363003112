use pretty_assertions::assert_eq;
use std::path::Path;
use tibia_world::entities::actor::{Creature, CreatureId, CreatureKind};
use tibia_world::entities::thing::{Thing, ThingDescriptor};
use tibia_world::persistence::tile_records::{self, TileRecord};
use tibia_world::world::item_stack::StackIndex;
use tibia_world::world::kinds::{parse_kinds, KindId};
use tibia_world::world::notifications::Notification;
use tibia_world::world::position::{Direction, Position};
use tibia_world::{load_world, World, WorldConfig};

const KINDS: &str = r#"
- id: 102
  name: grass
- id: 385
  name: open pickhole
  decay: { to: 386, duration: 40 }
- id: 386
  name: half closed pickhole
- id: 1740
  name: chest
- id: 2148
  name: gold coin
  stackable: true
- id: 1223
  name: open gate of expertise
  magic_door: true
  door: { opened: true, toggle_to: 1222 }
- id: 1222
  name: closed gate of expertise
  magic_door: true
  door: { opened: false, toggle_to: 1223 }
- id: 1777
  name: dustbin
  trashholder: true
"#;

const TILES: &str = r#"
- position: { x: 100, y: 100, z: 7 }
  kind: 102
- position: { x: 101, y: 100, z: 7 }
  kind: 102
- position: { x: 102, y: 100, z: 7 }
  kind: 385
- position: { x: 100, y: 101, z: 7 }
  kind: 102
  items:
    - kind: 1223
- position: { x: 101, y: 101, z: 7 }
  kind: 102
  zone_flags: 1
"#;

const HOUSES: &str = r#"
- id: 3
  name: Lower Lighthouse
  owner: Tarek
  fields: [{ x: 101, y: 100, z: 7 }]
"#;

fn write_assets(root: &Path) {
    std::fs::write(root.join("kinds.yml"), KINDS).unwrap();
    std::fs::write(root.join("tiles.yml"), TILES).unwrap();
    std::fs::write(root.join("houses.yml"), HOUSES).unwrap();
}

fn loaded_world() -> (tempfile::TempDir, World) {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path());
    let world = load_world(dir.path(), &WorldConfig::default()).unwrap();
    (dir, world)
}

fn player(id: u32, name: &str, position: Position) -> Creature {
    Creature::new(CreatureId(id), name, CreatureKind::Player, position)
}

#[test]
fn world_loads_kinds_tiles_and_houses_from_disk() {
    let (_dir, world) = loaded_world();
    assert_eq!(world.kinds().len(), 8);
    assert_eq!(world.tile_count(), 5);
    assert_eq!(world.house(3).and_then(|house| house.owner.as_deref()), Some("Tarek"));
    assert!(world.tile(Position::new(101, 100, 7)).unwrap().is_house_tile());
    assert!(world.tile(Position::new(101, 101, 7)).unwrap().is_protection_zone());
    assert!(world.services().outbox().is_empty());
}

#[test]
fn only_the_owner_walks_into_the_house() {
    let (_dir, mut world) = loaded_world();
    let street = Position::new(100, 100, 7);

    let mut stranger = player(1, "Eryn", street);
    world.place_creature(&mut stranger, street).unwrap();
    assert_eq!(world.move_creature(&mut stranger, street, Direction::East).unwrap(), None);
    assert_eq!(stranger.cancellations, vec!["You do not own this house.".to_string()]);

    world.remove_creature(&stranger, street).unwrap();
    let mut owner = player(2, "tarek", street);
    world.place_creature(&mut owner, street).unwrap();
    assert_eq!(
        world.move_creature(&mut owner, street, Direction::East).unwrap(),
        Some(Position::new(101, 100, 7))
    );
}

#[test]
fn restored_open_gate_closes_after_the_last_visitor() {
    let (_dir, mut world) = loaded_world();
    let gate = Position::new(100, 101, 7);
    let mut first = player(1, "Eryn", gate);
    let mut second = player(2, "Mira", gate);
    world.place_creature(&mut first, gate).unwrap();
    world.place_creature(&mut second, gate).unwrap();

    world.move_creature(&mut first, gate, Direction::North).unwrap();
    let still_open = world.tile(gate).unwrap().top_item().map(Thing::kind_id);
    assert_eq!(still_open, Some(KindId(1223)));

    world.move_creature(&mut second, gate, Direction::East).unwrap();
    let closed = world.tile(gate).unwrap().top_item().map(Thing::kind_id);
    assert_eq!(closed, Some(KindId(1222)));
    assert!(world.tile(gate).unwrap().exit_listeners().is_empty());
}

#[test]
fn coins_dropped_on_coins_merge_and_overflow() {
    let (_dir, mut world) = loaded_world();
    let spot = Position::new(100, 100, 7);
    let first = world.create_thing(KindId(2148), 60).unwrap();
    let second = world.create_thing(KindId(2148), 50).unwrap();
    assert!(world.place_thing(spot, first).unwrap().is_stored());
    world.drain_notifications();
    assert!(world.place_thing(spot, second).unwrap().is_stored());

    let counts: Vec<u16> = world.tile(spot).unwrap().items().iter().map(Thing::count).collect();
    assert_eq!(counts, vec![100, 10]);

    let batch: Vec<Notification> = world
        .drain_notifications()
        .into_iter()
        .flat_map(|(_, batch)| batch)
        .collect();
    assert_eq!(
        batch,
        vec![
            Notification::ItemRemoved { position: spot, index: 0, previous_count: 60 },
            Notification::ItemAdded {
                position: spot,
                thing: ThingDescriptor { kind: KindId(2148), count: 100 },
                index: 0,
            },
            Notification::ItemAdded {
                position: spot,
                thing: ThingDescriptor { kind: KindId(2148), count: 10 },
                index: 1,
            },
        ]
    );
}

#[test]
fn pickhole_decay_survives_a_snapshot_round_trip() {
    let (dir, mut world) = loaded_world();
    assert_eq!(world.arm_decay(), 1);
    assert_eq!(world.advance(40).unwrap(), 1);

    let path = dir.path().join("tiles.yml");
    tile_records::save_tiles(&path, &world).unwrap();
    let records = tile_records::load_tiles(&path).unwrap();
    let hole = records
        .iter()
        .find(|record| record.position == Position::new(102, 100, 7))
        .cloned();
    assert_eq!(
        hole,
        Some(TileRecord {
            position: Position::new(102, 100, 7),
            kind: KindId(386),
            zone_flags: 0,
            items: Vec::new(),
        })
    );

    let mut reloaded = World::new(parse_kinds(KINDS).unwrap(), &WorldConfig::default());
    tile_records::restore(&mut reloaded, &records).unwrap();
    assert_eq!(reloaded.arm_decay(), 0);
}

#[test]
fn moving_items_respects_room_and_the_house() {
    let (_dir, mut world) = loaded_world();
    let street = Position::new(100, 100, 7);
    let house = Position::new(101, 100, 7);
    let chest = world.create_thing(KindId(1740), 1).unwrap();
    assert!(world.place_thing(street, chest).unwrap().is_stored());

    let mut stranger = player(1, "Eryn", street);
    assert!(!world.move_thing(&mut stranger, street, StackIndex::Top, 1, house).unwrap());
    assert!(world.tile(street).unwrap().has_items());
    assert!(!world.tile(house).unwrap().has_items());

    let mut owner = player(2, "Tarek", street);
    assert!(world.move_thing(&mut owner, street, StackIndex::Top, 1, house).unwrap());
    assert!(!world.tile(street).unwrap().has_items());
    assert!(world.tile(house).unwrap().has_items());
}

#[test]
fn pathfinder_walks_around_the_house_for_strangers() {
    let (_dir, mut world) = loaded_world();
    let walker = player(1, "Eryn", Position::new(100, 100, 7));
    let path = world
        .find_path(Position::new(100, 100, 7), Position::new(102, 100, 7), &walker)
        .expect("path");
    assert!(!path.contains(&Position::new(101, 100, 7)));
    assert_eq!(path.last(), Some(&Position::new(102, 100, 7)));
}

#[test]
fn run_advances_and_writes_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path());
    let args = vec![
        "tibia-world".to_string(),
        dir.path().display().to_string(),
        "45".to_string(),
    ];
    tibia_world::run(&args).unwrap();

    let records = tile_records::load_tiles(&dir.path().join("tiles.yml")).unwrap();
    let hole = records
        .iter()
        .find(|record| record.position == Position::new(102, 100, 7))
        .map(|record| record.kind);
    assert_eq!(hole, Some(KindId(386)));
    assert!(dir.path().join("tiles.yml.bak").exists());
    assert!(dir.path().join("log").join("game.log").exists());
}
