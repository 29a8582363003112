use crate::entities::actor::Actor;
use crate::world::kinds::DEFAULT_FRICTION;
use crate::world::position::{Position, DIRECTIONS};
use crate::world::tile::{Obstruction, Tile, TileLookupMut};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub const DEFAULT_NODE_BUDGET: usize = 4096;

/// Per-tile A* scratch state. Present on a tile only while a search runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathfinderNode {
    /// Cost of the cheapest known route from the start.
    pub score: u32,
    pub heuristic: u32,
    pub parent: Option<Position>,
    pub opened: bool,
    pub closed: bool,
}

impl PathfinderNode {
    pub fn total(&self) -> u32 {
        self.score.saturating_add(self.heuristic)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    /// Expansions allowed before the search gives up.
    pub node_budget: usize,
    /// Lowest friction on the map; keeps the heuristic admissible.
    pub minimum_friction: u16,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            node_budget: DEFAULT_NODE_BUDGET,
            minimum_friction: DEFAULT_FRICTION,
        }
    }
}

/// Cheapest walk from `from` to `to` on one floor, excluding the start and
/// including the goal. The goal may hold creatures; nothing else in the way
/// may block the actor.
pub fn find_path(
    grid: &mut dyn TileLookupMut,
    from: Position,
    to: Position,
    actor: &dyn Actor,
    limits: SearchLimits,
) -> Option<Vec<Position>> {
    if from.z != to.z {
        return None;
    }
    if from == to {
        return Some(Vec::new());
    }
    match grid.tile_at(to)?.obstruction_for(actor) {
        None | Some(Obstruction::Characters) => {}
        Some(_) => return None,
    }

    let mut touched = Vec::new();
    let path = search(grid, from, to, actor, limits, &mut touched);
    for position in touched {
        if let Some(tile) = grid.tile_at_mut(position) {
            tile.disable_pathfinding();
        }
    }
    path
}

fn search(
    grid: &mut dyn TileLookupMut,
    from: Position,
    to: Position,
    actor: &dyn Actor,
    limits: SearchLimits,
    touched: &mut Vec<Position>,
) -> Option<Vec<Position>> {
    let estimate = |position: Position| {
        position
            .chebyshev_distance(to)
            .saturating_mul(u32::from(limits.minimum_friction))
    };

    let start = grid.tile_at_mut(from)?;
    start.enable_pathfinding();
    touched.push(from);
    if let Some(node) = start.pathfinder_node_mut() {
        node.opened = true;
        node.heuristic = estimate(from);
    }

    // (total, insertion order, position); lowest total first, FIFO on ties
    let mut open = BinaryHeap::new();
    let mut sequence = 0u64;
    open.push(Reverse((estimate(from), sequence, from)));
    let mut expanded = 0usize;

    while let Some(Reverse((_, _, current))) = open.pop() {
        let score = match grid.tile_at(current).and_then(Tile::pathfinder_node) {
            Some(node) if !node.closed => node.score,
            _ => continue,
        };
        if current == to {
            return Some(reconstruct(grid, from, to));
        }
        if expanded >= limits.node_budget {
            log::warn!(
                "pathfinder budget of {} nodes exhausted between {} and {}",
                limits.node_budget,
                from,
                to
            );
            return None;
        }
        expanded += 1;
        if let Some(node) = grid.tile_at_mut(current).and_then(Tile::pathfinder_node_mut) {
            node.closed = true;
        }

        for direction in DIRECTIONS {
            let Some(next) = current.step(direction) else {
                continue;
            };
            let Some(tile) = grid.tile_at(next) else {
                continue;
            };
            match tile.obstruction_for(actor) {
                None => {}
                Some(Obstruction::Characters) if next == to => {}
                Some(_) => continue,
            }
            let tentative = score.saturating_add(tile.weight(current));
            let known = tile.pathfinder_node().copied();
            if let Some(node) = known {
                if node.closed || (node.opened && tentative >= node.score) {
                    continue;
                }
            }

            let Some(tile) = grid.tile_at_mut(next) else {
                continue;
            };
            if known.is_none() {
                tile.enable_pathfinding();
                touched.push(next);
            }
            let heuristic = estimate(next);
            if let Some(node) = tile.pathfinder_node_mut() {
                node.opened = true;
                node.score = tentative;
                node.heuristic = heuristic;
                node.parent = Some(current);
            }
            sequence += 1;
            open.push(Reverse((tentative.saturating_add(heuristic), sequence, next)));
        }
    }
    None
}

fn reconstruct(grid: &dyn TileLookupMut, from: Position, to: Position) -> Vec<Position> {
    let mut path = vec![to];
    let mut cursor = to;
    while let Some(parent) = grid
        .tile_at(cursor)
        .and_then(Tile::pathfinder_node)
        .and_then(|node| node.parent)
    {
        if parent == from {
            break;
        }
        path.push(parent);
        cursor = parent;
    }
    path.reverse();
    path
}
