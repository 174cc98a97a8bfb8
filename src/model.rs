// Core value types shared by every service: identifiers, players,
// board coordinates and the materialized game state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(GameId);
uuid_id!(ReqId);
uuid_id!(EventId);
uuid_id!(SessionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => write!(f, "BLACK"),
            Player::White => write!(f, "WHITE"),
        }
    }
}

/// A point on the board. `(0, 0)` is a corner; both axes run to `size - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: u16,
    pub y: u16,
}

impl Coord {
    pub fn of(x: u16, y: u16) -> Self {
        Coord { x, y }
    }
}

pub const DEFAULT_BOARD_SIZE: u16 = 19;

/// Occupied points only. A coordinate missing from `pieces` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(with = "board_pieces")]
    pub pieces: HashMap<Coord, Player>,
    pub size: u16,
}

impl Board {
    pub fn with_size(size: u16) -> Self {
        Board {
            pieces: HashMap::new(),
            size,
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.size && coord.y < self.size
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::with_size(DEFAULT_BOARD_SIZE)
    }
}

/// JSON objects require string keys, so board pieces travel as a list
/// of (coord, player) entries on the wire.
mod board_pieces {
    use super::{Coord, Player};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S>(pieces: &HashMap<Coord, Player>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries: Vec<(Coord, Player)> = pieces.iter().map(|(c, p)| (*c, *p)).collect();
        entries.sort_by_key(|(c, _)| (c.x, c.y));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<Coord, Player>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(Coord, Player)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// Stones captured by each player over the life of a game.
/// Counters never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captures {
    pub black: u16,
    pub white: u16,
}

impl Captures {
    pub fn credit(&mut self, player: Player, count: u16) {
        match player {
            Player::Black => self.black += count,
            Player::White => self.white += count,
        }
    }
}

/// One entry in a game's history. A `None` coord is a pass.
/// `turn` is 1-based and strictly increasing per game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub player: Player,
    pub coord: Option<Coord>,
    pub turn: u32,
}

/// The materialized view of a single game, produced by folding its
/// accepted-move events in log order. The changelog service is the
/// only writer; everyone else reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub captures: Captures,
    pub turn: u32,
    pub player_up: Player,
    pub moves: Vec<Move>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            board: Board::default(),
            captures: Captures::default(),
            turn: 1,
            player_up: Player::Black,
            moves: Vec::new(),
        }
    }
}

impl GameState {
    pub fn with_board_size(size: u16) -> Self {
        GameState {
            board: Board::with_size(size),
            ..GameState::default()
        }
    }
}
