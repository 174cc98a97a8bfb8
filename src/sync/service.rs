use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::classify::{classify, server_player_up, server_turn, SyncStatus};
use super::pending::PendingRequests;
use crate::model::Move;
use crate::shared::CoreError;
use crate::stream::{
    decode, HistoryProvided, MakeMoveCommand, MoveMade, ReqSync, StreamMessage, SyncReply, Topics,
};

/// How long a sync request may wait on its history fetch or corrective
/// move before the join is abandoned.
const JOIN_WINDOW: Duration = Duration::from_secs(10);
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Reconciles a client's claimed game state against the authoritative
/// history. Only the client-ahead case requires a corrective write (a
/// human move must not be lost); every other divergence is resolved by
/// the client adopting the server view.
pub struct SyncService {
    pending: PendingRequests,
    topics: Arc<Topics>,
}

impl SyncService {
    pub fn new(topics: Arc<Topics>) -> Self {
        Self {
            pending: PendingRequests::new(JOIN_WINDOW),
            topics,
        }
    }

    /// Kick off the history fetch for a claim and park the request until
    /// the answer arrives.
    pub async fn handle_req_sync(&self, req: &ReqSync) -> Result<(), CoreError> {
        info!(game_id = %req.game_id, turn = req.turn, "sync requested");

        let fetch = StreamMessage::ProvideHistory(crate::stream::ProvideHistory {
            game_id: req.game_id.clone(),
            req_id: req.req_id.clone(),
        });
        self.topics.provide_history_cmd.publish(&fetch).await?;
        self.pending.park_awaiting_history(req.clone()).await;
        Ok(())
    }

    /// Join the fetched history against the parked claim and classify.
    pub async fn handle_history_provided(&self, hp: &HistoryProvided) -> Result<(), CoreError> {
        let req = match self
            .pending
            .take_awaiting_history(&hp.game_id, &hp.reply_to)
            .await
        {
            Some(req) => req,
            // Not ours (or already expired); other consumers may care.
            None => return Ok(()),
        };

        match classify(&req, &hp.moves) {
            SyncStatus::ClientAhead => {
                // classify() only returns ClientAhead when last_move is present
                let missed = match &req.last_move {
                    Some(m) => m.clone(),
                    None => {
                        warn!(game_id = %req.game_id, "client-ahead claim without a move");
                        return Ok(());
                    }
                };
                info!(
                    game_id = %req.game_id,
                    player = %missed.player,
                    "replaying unrecorded client move"
                );

                let make_move = StreamMessage::MakeMove(MakeMoveCommand {
                    game_id: req.game_id.clone(),
                    req_id: req.req_id.clone(),
                    player: missed.player,
                    coord: missed.coord,
                });
                // Park before publishing: the judge may answer before
                // this handler regains control, and the resulting
                // MoveMade must find the entry. A stale entry from a
                // failed publish is swept out.
                self.pending
                    .park_awaiting_move(req, hp.moves.clone())
                    .await;
                self.topics.make_move_cmd.publish(&make_move).await?;
                Ok(())
            }
            status @ (SyncStatus::InSync | SyncStatus::ServerAhead | SyncStatus::Divergent) => {
                // The server view is always a safe answer: a caught-up
                // client sees a no-op, a lagging client catches up, and a
                // bogus claim gets overwritten.
                info!(game_id = %req.game_id, ?status, "replying with server view");
                self.reply(SyncReply {
                    session_id: req.session_id.clone(),
                    reply_to: req.req_id.clone(),
                    game_id: req.game_id.clone(),
                    player_up: server_player_up(&hp.moves),
                    turn: server_turn(&hp.moves),
                    moves: hp.moves.clone(),
                })
                .await
            }
        }
    }

    /// Completion of a corrective move issued on a client's behalf.
    pub async fn handle_move_made(&self, mm: &MoveMade) -> Result<(), CoreError> {
        let (req, history) = match self
            .pending
            .take_awaiting_move(&mm.game_id, &mm.reply_to)
            .await
        {
            Some(found) => found,
            None => return Ok(()),
        };

        let turn = server_turn(&history);
        let mut moves = history;
        moves.push(Move {
            player: mm.player,
            coord: mm.coord,
            turn,
        });

        info!(game_id = %req.game_id, turn, "corrective move recorded, replying");
        self.reply(SyncReply {
            session_id: req.session_id.clone(),
            reply_to: req.req_id.clone(),
            game_id: req.game_id.clone(),
            player_up: mm.player.other(),
            turn: turn + 1,
            moves,
        })
        .await
    }

    async fn reply(&self, reply: SyncReply) -> Result<(), CoreError> {
        self.topics
            .sync_reply_ev
            .publish(&StreamMessage::SyncReply(reply))
            .await?;
        Ok(())
    }

    /// Spawn the consume loops plus the correlation-table sweep.
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let claims = {
            let service = self.clone();
            tokio::spawn(async move {
                let mut sub = service.topics.req_sync_cmd.subscribe_from(0).await;
                while let Some(record) = sub.recv().await {
                    match decode(&record.data) {
                        Ok(StreamMessage::ReqSync(req)) => {
                            if let Err(e) = service.handle_req_sync(&req).await {
                                error!(error = %e, "could not start sync round");
                            }
                        }
                        Ok(other) => {
                            warn!(kind = other.kind(), "unexpected message on req_sync_cmd")
                        }
                        Err(e) => warn!(error = %e, "discarding undecodable record"),
                    }
                }
                info!("sync claim loop ended");
            })
        };

        let histories = {
            let service = self.clone();
            tokio::spawn(async move {
                let mut sub = service.topics.history_provided_ev.subscribe_from(0).await;
                while let Some(record) = sub.recv().await {
                    match decode(&record.data) {
                        Ok(StreamMessage::HistoryProvided(hp)) => {
                            if let Err(e) = service.handle_history_provided(&hp).await {
                                error!(error = %e, "could not answer sync claim");
                            }
                        }
                        Ok(other) => warn!(
                            kind = other.kind(),
                            "unexpected message on history_provided_ev"
                        ),
                        Err(e) => warn!(error = %e, "discarding undecodable record"),
                    }
                }
                info!("sync history loop ended");
            })
        };

        let moves = {
            let service = self.clone();
            tokio::spawn(async move {
                let mut sub = service.topics.move_made_ev.subscribe_from(0).await;
                while let Some(record) = sub.recv().await {
                    match decode(&record.data) {
                        Ok(StreamMessage::MoveMade(mm)) => {
                            if let Err(e) = service.handle_move_made(&mm).await {
                                error!(error = %e, "could not finish sync round");
                            }
                        }
                        Ok(other) => {
                            warn!(kind = other.kind(), "unexpected message on move_made_ev")
                        }
                        Err(e) => warn!(error = %e, "discarding undecodable record"),
                    }
                }
                info!("sync move loop ended");
            })
        };

        let sweep = self.pending.clone().start_sweep(SWEEP_INTERVAL);

        vec![claims, histories, moves, sweep]
    }
}
