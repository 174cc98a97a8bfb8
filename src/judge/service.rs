use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::changelog::GameStateRepository;
use crate::model::{EventId, GameState};
use crate::rules;
use crate::shared::CoreError;
use crate::stream::{decode, MakeMoveCommand, MoveMade, MoveRejected, StreamMessage, Topics};

#[derive(Debug, Clone, PartialEq)]
pub enum Judgement {
    Accepted(MoveMade),
    Rejected(MoveRejected),
}

/// Stateless validator keyed by game: reads the current materialized
/// state, applies the rules engine, and emits the outcome event. Board
/// and turn mutation belong to the changelog service, not here.
pub struct JudgeService {
    store: GameStateRepository,
    topics: Arc<Topics>,
}

impl JudgeService {
    pub fn new(store: GameStateRepository, topics: Arc<Topics>) -> Self {
        Self { store, topics }
    }

    /// Pure decision: wrong player, out-of-bounds and occupied points are
    /// rejected; a pass is always legal for the player on turn.
    pub fn judge(cmd: &MakeMoveCommand, state: &GameState) -> Judgement {
        if Self::is_legal(cmd, state) {
            let captured = cmd
                .coord
                .map(|placement| {
                    rules::captures_for(cmd.player, placement, &state.board)
                        .into_iter()
                        .collect()
                })
                .unwrap_or_default();

            Judgement::Accepted(MoveMade {
                game_id: cmd.game_id.clone(),
                reply_to: cmd.req_id.clone(),
                event_id: EventId::new(),
                player: cmd.player,
                coord: cmd.coord,
                captured,
            })
        } else {
            Judgement::Rejected(MoveRejected {
                game_id: cmd.game_id.clone(),
                reply_to: cmd.req_id.clone(),
                player: cmd.player,
                coord: cmd.coord,
            })
        }
    }

    fn is_legal(cmd: &MakeMoveCommand, state: &GameState) -> bool {
        if cmd.player != state.player_up {
            return false;
        }
        match cmd.coord {
            None => true,
            Some(coord) => {
                state.board.contains(coord) && !state.board.pieces.contains_key(&coord)
            }
        }
    }

    pub async fn handle_make_move(&self, cmd: &MakeMoveCommand) -> Result<(), CoreError> {
        // Unseeded games judge against a fresh default state; the seed
        // event may still be in flight on another topic.
        let state = self.store.get(&cmd.game_id).await.unwrap_or_default();

        let outcome = match Self::judge(cmd, &state) {
            Judgement::Accepted(mm) => {
                info!(game_id = %cmd.game_id, player = %cmd.player, "move accepted");
                StreamMessage::MoveMade(mm)
            }
            Judgement::Rejected(mr) => {
                info!(
                    game_id = %cmd.game_id,
                    player = %cmd.player,
                    coord = ?cmd.coord,
                    "move rejected"
                );
                StreamMessage::MoveRejected(mr)
            }
        };

        let topic = match outcome {
            StreamMessage::MoveMade(_) => &self.topics.move_made_ev,
            _ => &self.topics.move_rejected_ev,
        };
        topic.publish(&outcome).await?;
        Ok(())
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut sub = self.topics.make_move_cmd.subscribe_from(0).await;
            while let Some(record) = sub.recv().await {
                match decode(&record.data) {
                    Ok(StreamMessage::MakeMove(cmd)) => {
                        if let Err(e) = self.handle_make_move(&cmd).await {
                            error!(error = %e, "could not publish judgement");
                        }
                    }
                    Ok(other) => {
                        warn!(kind = other.kind(), "unexpected message on make_move_cmd")
                    }
                    Err(e) => warn!(error = %e, "discarding undecodable record"),
                }
            }
            info!("judge loop ended");
        })
    }
}
