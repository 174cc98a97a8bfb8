// Commands and events that travel over the log. Commands are requests
// that have not been validated; events are authoritative facts.

use crate::lobby::{CreateGame, GameReady, JoinPrivateGame};
use crate::model::{Coord, EventId, GameId, GameState, Move, Player, ReqId, SessionId};
use serde::{Deserialize, Serialize};

/// A request to place a stone (or pass, when `coord` is absent).
/// Not yet validated; the judge turns it into `MoveMade` or `MoveRejected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeMoveCommand {
    pub game_id: GameId,
    pub req_id: ReqId,
    pub player: Player,
    pub coord: Option<Coord>,
}

/// The authoritative, already-validated outcome of a move request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveMade {
    pub game_id: GameId,
    pub reply_to: ReqId,
    pub event_id: EventId,
    pub player: Player,
    pub coord: Option<Coord>,
    pub captured: Vec<Coord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRejected {
    pub game_id: GameId,
    pub reply_to: ReqId,
    pub player: Player,
    pub coord: Option<Coord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvideHistory {
    pub game_id: GameId,
    pub req_id: ReqId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryProvided {
    pub game_id: GameId,
    pub reply_to: ReqId,
    pub event_id: EventId,
    pub moves: Vec<Move>,
    pub epoch_millis: u64,
}

/// A client's claim about its own view of a game. The reconciler joins
/// this against fresh history and answers with `SyncReply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReqSync {
    pub session_id: SessionId,
    pub req_id: ReqId,
    pub game_id: GameId,
    pub player_up: Player,
    pub turn: u32,
    pub last_move: Option<Move>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReply {
    pub session_id: SessionId,
    pub reply_to: ReqId,
    pub game_id: GameId,
    pub player_up: Player,
    pub turn: u32,
    pub moves: Vec<Move>,
}

/// One changelog entry: the materialized state of a game after a fold step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateRecord {
    pub game_id: GameId,
    pub state: GameState,
}

/// Every message kind the core reads or writes, tagged for exhaustive
/// decoding at the log boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamMessage {
    MakeMove(MakeMoveCommand),
    MoveMade(MoveMade),
    MoveRejected(MoveRejected),
    ProvideHistory(ProvideHistory),
    HistoryProvided(HistoryProvided),
    ReqSync(ReqSync),
    SyncReply(SyncReply),
    GameState(GameStateRecord),
    GameReady(GameReady),
    CreateGame(CreateGame),
    JoinPrivateGame(JoinPrivateGame),
}

impl StreamMessage {
    /// The partition key. Per-game traffic is keyed on the game ID so that
    /// validate/fold/reconcile stay ordered per game; session-addressed
    /// replies are keyed on the session.
    pub fn key(&self) -> String {
        match self {
            StreamMessage::MakeMove(m) => m.game_id.to_string(),
            StreamMessage::MoveMade(m) => m.game_id.to_string(),
            StreamMessage::MoveRejected(m) => m.game_id.to_string(),
            StreamMessage::ProvideHistory(m) => m.game_id.to_string(),
            StreamMessage::HistoryProvided(m) => m.game_id.to_string(),
            StreamMessage::ReqSync(m) => m.session_id.to_string(),
            StreamMessage::SyncReply(m) => m.session_id.to_string(),
            StreamMessage::GameState(m) => m.game_id.to_string(),
            StreamMessage::GameReady(m) => m.game_id.to_string(),
            StreamMessage::CreateGame(m) => m.session_id.to_string(),
            StreamMessage::JoinPrivateGame(m) => m.game_id.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::MakeMove(_) => "make_move_cmd",
            StreamMessage::MoveMade(_) => "move_made_ev",
            StreamMessage::MoveRejected(_) => "move_rejected_ev",
            StreamMessage::ProvideHistory(_) => "provide_history_cmd",
            StreamMessage::HistoryProvided(_) => "history_provided_ev",
            StreamMessage::ReqSync(_) => "req_sync_cmd",
            StreamMessage::SyncReply(_) => "sync_reply_ev",
            StreamMessage::GameState(_) => "game_state_changelog",
            StreamMessage::GameReady(_) => "game_ready_ev",
            StreamMessage::CreateGame(_) => "create_game_ev",
            StreamMessage::JoinPrivateGame(_) => "join_private_game_ev",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_union_round_trip() {
        let msg = StreamMessage::MakeMove(MakeMoveCommand {
            game_id: GameId::new(),
            req_id: ReqId::new(),
            player: Player::Black,
            coord: Some(Coord::of(4, 4)),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"MakeMove\""));
        let back: StreamMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn key_follows_game_partition() {
        let game_id = GameId::new();
        let msg = StreamMessage::MoveMade(MoveMade {
            game_id: game_id.clone(),
            reply_to: ReqId::new(),
            event_id: EventId::new(),
            player: Player::White,
            coord: None,
            captured: vec![],
        });
        assert_eq!(msg.key(), game_id.to_string());
        assert_eq!(msg.kind(), "move_made_ev");
    }

    #[test]
    fn sync_messages_keyed_on_session() {
        let session_id = SessionId::new();
        let msg = StreamMessage::ReqSync(ReqSync {
            session_id: session_id.clone(),
            req_id: ReqId::new(),
            game_id: GameId::new(),
            player_up: Player::Black,
            turn: 1,
            last_move: None,
        });
        assert_eq!(msg.key(), session_id.to_string());
    }
}
