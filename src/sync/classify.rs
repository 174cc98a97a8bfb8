use crate::model::{Move, Player};
use crate::stream::ReqSync;

/// How a client's claimed state relates to the server's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Client and server agree; reply with the server view as-is.
    InSync,
    /// The client made a move the server never recorded (e.g. a dropped
    /// acknowledgment). The move must be replayed on the client's behalf.
    ClientAhead,
    /// The server holds a move the client hasn't seen. No corrective
    /// write is needed; the authoritative reply already contains it.
    ServerAhead,
    /// Anything else. The client adopts the server view wholesale.
    Divergent,
}

/// Turn number implied by a history: one past the last recorded move.
pub fn server_turn(history: &[Move]) -> u32 {
    history.last().map(|m| m.turn).unwrap_or(0) + 1
}

/// Black opens; afterwards the player up is whoever didn't move last.
pub fn server_player_up(history: &[Move]) -> Player {
    history
        .last()
        .map(|m| m.player.other())
        .unwrap_or(Player::Black)
}

/// First match wins, checked in declaration order. The `last_move`
/// presence check in `ClientAhead` matters: a pass still shows up as a
/// `Move`, just with no coordinate, so a truthful client one turn ahead
/// always has one.
pub fn classify(req: &ReqSync, history: &[Move]) -> SyncStatus {
    let turn = server_turn(history);
    let player_up = server_player_up(history);

    if req.turn == turn && req.player_up == player_up {
        SyncStatus::InSync
    } else if req.turn == turn + 1 && req.player_up == player_up.other() && req.last_move.is_some()
    {
        SyncStatus::ClientAhead
    } else if req.turn + 1 == turn && req.player_up.other() == player_up {
        SyncStatus::ServerAhead
    } else {
        SyncStatus::Divergent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coord, GameId, ReqId, SessionId};
    use rstest::rstest;

    fn two_move_history() -> Vec<Move> {
        vec![
            Move {
                player: Player::Black,
                coord: Some(Coord::of(4, 4)),
                turn: 1,
            },
            Move {
                player: Player::White,
                coord: Some(Coord::of(10, 10)),
                turn: 2,
            },
        ]
    }

    fn req(turn: u32, player_up: Player, last_move: Option<Move>) -> ReqSync {
        ReqSync {
            session_id: SessionId::new(),
            req_id: ReqId::new(),
            game_id: GameId::new(),
            player_up,
            turn,
            last_move,
        }
    }

    #[test]
    fn fresh_game_defaults() {
        assert_eq!(server_turn(&[]), 1);
        assert_eq!(server_player_up(&[]), Player::Black);
    }

    #[test]
    fn derived_from_last_move() {
        let history = two_move_history();
        assert_eq!(server_turn(&history), 3);
        assert_eq!(server_player_up(&history), Player::Black);
    }

    #[test]
    fn matching_claim_is_in_sync() {
        let history = two_move_history();
        let claim = req(3, Player::Black, history.last().cloned());
        assert_eq!(classify(&claim, &history), SyncStatus::InSync);
    }

    #[test]
    fn client_one_move_ahead() {
        let history = two_move_history();
        let unrecorded = Move {
            player: Player::Black,
            coord: Some(Coord::of(4, 5)),
            turn: 3,
        };
        let claim = req(4, Player::White, Some(unrecorded));
        assert_eq!(classify(&claim, &history), SyncStatus::ClientAhead);
    }

    #[test]
    fn client_ahead_by_a_pass_still_counts() {
        let history = two_move_history();
        let pass = Move {
            player: Player::Black,
            coord: None,
            turn: 3,
        };
        let claim = req(4, Player::White, Some(pass));
        assert_eq!(classify(&claim, &history), SyncStatus::ClientAhead);
    }

    #[test]
    fn ahead_claim_without_a_move_is_divergent() {
        let history = two_move_history();
        let claim = req(4, Player::White, None);
        assert_eq!(classify(&claim, &history), SyncStatus::Divergent);
    }

    #[test]
    fn client_behind_by_one_is_server_ahead() {
        let history = two_move_history();
        let claim = req(2, Player::White, history.first().cloned());
        assert_eq!(classify(&claim, &history), SyncStatus::ServerAhead);
    }

    #[rstest]
    #[case(7, Player::Black)] // fabricated future turn
    #[case(3, Player::White)] // right turn, wrong player
    #[case(1, Player::Black)] // way behind
    fn everything_else_is_divergent(#[case] turn: u32, #[case] player_up: Player) {
        let history = two_move_history();
        let bogus = Move {
            player: Player::Black,
            coord: Some(Coord::of(13, 13)),
            turn,
        };
        let claim = req(turn, player_up, Some(bogus));
        assert_eq!(classify(&claim, &history), SyncStatus::Divergent);
    }
}
