// Event shapes supplied by the lobby / color-chooser collaborators.
// The core consumes these only to learn that a game exists (and at what
// board size); matchmaking itself happens elsewhere.

use crate::model::{EventId, GameId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Private,
}

/// Both seats are filled and the game exists. Seeds an empty game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReady {
    pub game_id: GameId,
    pub sessions: (SessionId, SessionId),
    pub event_id: EventId,
    pub board_size: u16,
}

/// A client asked the lobby for a game. `game_id` may be absent when the
/// gateway leaves assignment to the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGame {
    pub game_id: Option<GameId>,
    pub session_id: SessionId,
    pub visibility: Visibility,
    pub board_size: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPrivateGame {
    pub game_id: GameId,
    pub session_id: SessionId,
}
