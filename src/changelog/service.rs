use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::repository::GameStateRepository;
use crate::lobby::GameReady;
use crate::model::{GameState, Move};
use crate::stream::{decode, GameStateRecord, MoveMade, StreamMessage, Topics};

/// Per-game left fold over accepted-move events. Fold steps for one game
/// arrive in the order the judge accepted them (per-partition ordering);
/// the applied-offset check absorbs redelivery.
pub struct ChangelogService {
    repo: GameStateRepository,
    topics: Arc<Topics>,
}

impl ChangelogService {
    pub fn new(repo: GameStateRepository, topics: Arc<Topics>) -> Self {
        Self { repo, topics }
    }

    /// One fold step: a pure state transition, no I/O.
    pub fn fold(state: &mut GameState, ev: &MoveMade) {
        state.moves.push(Move {
            player: ev.player,
            coord: ev.coord,
            turn: state.turn,
        });
        if let Some(coord) = ev.coord {
            state.board.pieces.insert(coord, ev.player);
            for captured in &ev.captured {
                state.board.pieces.remove(captured);
            }
            state.captures.credit(ev.player, ev.captured.len() as u16);
        }
        state.player_up = ev.player.other();
        state.turn += 1;
    }

    pub async fn handle_game_ready(&self, ev: &GameReady) {
        if self.repo.seed(&ev.game_id, ev.board_size).await {
            info!(game_id = %ev.game_id, board_size = ev.board_size, "seeded new game");
        } else {
            debug!(game_id = %ev.game_id, "duplicate seed ignored");
        }
    }

    /// Fold one accepted move, identified by its position in the log.
    /// Returns the updated state, or `None` for an already-applied record.
    pub async fn handle_move_made(&self, offset: u64, ev: &MoveMade) -> Option<GameState> {
        let (mut state, applied) = self.repo.fetch(&ev.game_id).await;
        if applied.is_some_and(|a| offset <= a) {
            debug!(game_id = %ev.game_id, offset, "already folded, skipping");
            return None;
        }

        Self::fold(&mut state, ev);
        self.repo.store(&ev.game_id, state.clone(), offset).await;
        info!(
            game_id = %ev.game_id,
            turn = state.turn,
            player_up = %state.player_up,
            "game state updated"
        );
        Some(state)
    }

    /// Spawn the consume loops: seeds from the lobby and fold steps from
    /// the judge's accepted moves.
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let seeds = {
            let service = self.clone();
            tokio::spawn(async move {
                let mut sub = service.topics.lobby_ev.subscribe_from(0).await;
                while let Some(record) = sub.recv().await {
                    match decode(&record.data) {
                        Ok(StreamMessage::GameReady(ev)) => {
                            service.handle_game_ready(&ev).await;
                        }
                        Ok(StreamMessage::CreateGame(ev)) => {
                            if let Some(game_id) = &ev.game_id {
                                if service.repo.seed(game_id, ev.board_size).await {
                                    info!(game_id = %game_id, "seeded game from create request");
                                }
                            }
                        }
                        // Joins carry no board size; the GameReady that
                        // follows does the seeding.
                        Ok(StreamMessage::JoinPrivateGame(ev)) => {
                            debug!(game_id = %ev.game_id, "join event needs no seed")
                        }
                        Ok(other) => {
                            warn!(kind = other.kind(), "unexpected message on lobby_ev")
                        }
                        Err(e) => warn!(error = %e, "discarding undecodable record"),
                    }
                }
                info!("changelog seed loop ended");
            })
        };

        let folds = tokio::spawn(async move {
            let mut sub = self.topics.move_made_ev.subscribe_from(0).await;
            while let Some(record) = sub.recv().await {
                match decode(&record.data) {
                    Ok(StreamMessage::MoveMade(ev)) => {
                        if let Some(state) = self.handle_move_made(record.offset, &ev).await {
                            let changelog_entry = StreamMessage::GameState(GameStateRecord {
                                game_id: ev.game_id.clone(),
                                state,
                            });
                            if let Err(e) =
                                self.topics.game_states_changelog.publish(&changelog_entry).await
                            {
                                error!(error = %e, "could not publish game state changelog");
                            }
                        }
                    }
                    Ok(other) => {
                        warn!(kind = other.kind(), "unexpected message on move_made_ev")
                    }
                    Err(e) => warn!(error = %e, "discarding undecodable record"),
                }
            }
            info!("changelog fold loop ended");
        });

        vec![seeds, folds]
    }
}
