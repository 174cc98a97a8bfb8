// Pure Go rules over a board snapshot: adjacency, group connectivity,
// liberty counting and capture computation. No I/O and no game state;
// legality beyond bounds/occupancy is judged one layer up, and ko/suicide
// warnings are advisory client-side concerns rather than server rules.

use crate::model::{Board, Coord, Player};
use std::collections::HashSet;

const OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// The up-to-4 orthogonal points within bounds, with their occupant.
/// Edge and corner points simply have fewer neighbors.
pub fn neighbors(target: Coord, board: &Board) -> Vec<(Coord, Option<Player>)> {
    OFFSETS
        .iter()
        .filter_map(|(dx, dy)| {
            let x = target.x as i32 + dx;
            let y = target.y as i32 + dy;
            if x < 0 || y < 0 || x >= board.size as i32 || y >= board.size as i32 {
                None
            } else {
                let coord = Coord::of(x as u16, y as u16);
                Some((coord, board.pieces.get(&coord).copied()))
            }
        })
        .collect()
}

fn neighbor_stones(target: Coord, board: &Board) -> Vec<(Coord, Player)> {
    neighbors(target, board)
        .into_iter()
        .filter_map(|(coord, occupant)| occupant.map(|p| (coord, p)))
        .collect()
}

fn neighbor_spaces(target: Coord, board: &Board) -> Vec<Coord> {
    neighbors(target, board)
        .into_iter()
        .filter_map(|(coord, occupant)| match occupant {
            None => Some(coord),
            Some(_) => None,
        })
        .collect()
}

/// The maximal same-color group containing `target`, including `target`
/// itself. Empty set when the point is unoccupied.
pub fn connected(target: Coord, board: &Board) -> HashSet<Coord> {
    let color = match board.pieces.get(&target) {
        Some(color) => *color,
        None => return HashSet::new(),
    };

    let mut group = HashSet::new();
    group.insert(target);
    let mut frontier = vec![target];

    while let Some(stone) = frontier.pop() {
        for (coord, occupant) in neighbor_stones(stone, board) {
            if occupant == color && group.insert(coord) {
                frontier.push(coord);
            }
        }
    }

    group
}

/// Every empty point adjacent to the group containing `target`.
pub fn liberties(target: Coord, board: &Board) -> HashSet<Coord> {
    let mut open = HashSet::new();
    for stone in connected(target, board) {
        for space in neighbor_spaces(stone, board) {
            open.insert(space);
        }
    }
    open
}

/// The set of opposing stones removed when `player` plays `placement`.
/// A neighboring enemy group dies as a whole when its only remaining
/// liberty is the placement point; groups are never split.
pub fn captures_for(player: Player, placement: Coord, board: &Board) -> HashSet<Coord> {
    let mut captured = HashSet::new();

    for (coord, occupant) in neighbor_stones(placement, board) {
        if occupant == player || captured.contains(&coord) {
            continue;
        }
        let mut last_liberty = HashSet::new();
        last_liberty.insert(placement);
        if liberties(coord, board) == last_liberty {
            captured.extend(connected(coord, board));
        }
    }

    captured
}
