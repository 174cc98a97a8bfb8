use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::changelog::GameStateRepository;
use crate::model::EventId;
use crate::shared::CoreError;
use crate::stream::{decode, HistoryProvided, ProvideHistory, StreamMessage, Topics};

/// Answers "give me the full move history for game X" from the
/// materialized store. A request for an unknown game gets no reply;
/// the requester retries on its own schedule.
pub struct HistoryService {
    store: GameStateRepository,
    topics: Arc<Topics>,
}

impl HistoryService {
    pub fn new(store: GameStateRepository, topics: Arc<Topics>) -> Self {
        Self { store, topics }
    }

    pub async fn handle_provide_history(&self, cmd: &ProvideHistory) -> Result<(), CoreError> {
        let state = self
            .store
            .get(&cmd.game_id)
            .await
            .ok_or_else(|| CoreError::GameNotFound(cmd.game_id.clone()))?;

        let reply = HistoryProvided {
            game_id: cmd.game_id.clone(),
            reply_to: cmd.req_id.clone(),
            event_id: EventId::new(),
            moves: state.moves,
            epoch_millis: Utc::now().timestamp_millis() as u64,
        };
        info!(game_id = %cmd.game_id, moves = reply.moves.len(), "history provided");
        self.topics
            .history_provided_ev
            .publish(&StreamMessage::HistoryProvided(reply))
            .await?;
        Ok(())
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut sub = self.topics.provide_history_cmd.subscribe_from(0).await;
            while let Some(record) = sub.recv().await {
                match decode(&record.data) {
                    Ok(StreamMessage::ProvideHistory(cmd)) => {
                        if let Err(e) = self.handle_provide_history(&cmd).await {
                            warn!(error = %e, "history request failed");
                        }
                    }
                    Ok(other) => {
                        warn!(kind = other.kind(), "unexpected message on provide_history_cmd")
                    }
                    Err(e) => warn!(error = %e, "discarding undecodable record"),
                }
            }
            info!("history loop ended");
        })
    }
}
