pub mod event_queue;
pub mod grid;
pub mod housing;
pub mod item_stack;
pub mod kinds;
pub mod notifications;
pub mod pathfinder;
pub mod position;
pub mod tile;
pub mod time;
pub mod zone_flags;
