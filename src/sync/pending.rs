use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info};

use crate::model::{GameId, Move, ReqId};
use crate::stream::ReqSync;

/// What a parked request is waiting on.
#[derive(Debug, Clone)]
enum Stage {
    /// The history fetch round trip is still out.
    AwaitingHistory,
    /// The corrective move was issued; waiting for its `MoveMade`.
    /// Carries the history snapshot the eventual reply is built from.
    AwaitingMove { history: Vec<Move> },
}

#[derive(Debug, Clone)]
struct Pending {
    req: ReqSync,
    stage: Stage,
    deadline: Instant,
}

/// Correlation table for in-flight sync requests, keyed by game and
/// request ID. Entries that outlive the join window are swept out; the
/// client retries on its own periodic schedule, so expiry is silent.
#[derive(Clone)]
pub struct PendingRequests {
    entries: Arc<RwLock<HashMap<(GameId, ReqId), Pending>>>,
    ttl: Duration,
}

impl PendingRequests {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn park_awaiting_history(&self, req: ReqSync) {
        self.park(req, Stage::AwaitingHistory).await
    }

    pub async fn park_awaiting_move(&self, req: ReqSync, history: Vec<Move>) {
        self.park(req, Stage::AwaitingMove { history }).await
    }

    async fn park(&self, req: ReqSync, stage: Stage) {
        let key = (req.game_id.clone(), req.req_id.clone());
        let pending = Pending {
            req,
            stage,
            deadline: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key, pending);
    }

    pub async fn take_awaiting_history(
        &self,
        game_id: &GameId,
        req_id: &ReqId,
    ) -> Option<ReqSync> {
        let mut entries = self.entries.write().await;
        let key = (game_id.clone(), req_id.clone());
        match entries.get(&key).map(|p| &p.stage) {
            Some(Stage::AwaitingHistory) => entries.remove(&key).map(|p| p.req),
            _ => None,
        }
    }

    pub async fn take_awaiting_move(
        &self,
        game_id: &GameId,
        req_id: &ReqId,
    ) -> Option<(ReqSync, Vec<Move>)> {
        let mut entries = self.entries.write().await;
        let key = (game_id.clone(), req_id.clone());
        match entries.get(&key).map(|p| &p.stage) {
            Some(Stage::AwaitingMove { .. }) => entries.remove(&key).map(|p| match p.stage {
                Stage::AwaitingMove { history } => (p.req, history),
                Stage::AwaitingHistory => unreachable!("stage checked above"),
            }),
            _ => None,
        }
    }

    /// Drop every entry past its deadline. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, pending| pending.deadline > now);
        let expired = before - entries.len();
        if expired > 0 {
            debug!(expired, "expired pending sync requests");
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Periodic sweep of the correlation table.
    pub fn start_sweep(self, every: Duration) -> JoinHandle<()> {
        info!(every_ms = every.as_millis() as u64, "starting pending request sweep");
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Player, SessionId};

    fn req() -> ReqSync {
        ReqSync {
            session_id: SessionId::new(),
            req_id: ReqId::new(),
            game_id: GameId::new(),
            player_up: Player::Black,
            turn: 1,
            last_move: None,
        }
    }

    #[tokio::test]
    async fn park_and_take_round_trip() {
        let pending = PendingRequests::new(Duration::from_secs(5));
        let parked = req();

        pending.park_awaiting_history(parked.clone()).await;
        let taken = pending
            .take_awaiting_history(&parked.game_id, &parked.req_id)
            .await;
        assert_eq!(taken, Some(parked.clone()));

        // Entry is consumed
        assert!(pending
            .take_awaiting_history(&parked.game_id, &parked.req_id)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn take_respects_stage() {
        let pending = PendingRequests::new(Duration::from_secs(5));
        let parked = req();

        pending.park_awaiting_history(parked.clone()).await;

        // A MoveMade correlation must not consume a history-stage entry
        assert!(pending
            .take_awaiting_move(&parked.game_id, &parked.req_id)
            .await
            .is_none());
        assert_eq!(pending.len().await, 1);
    }

    #[tokio::test]
    async fn awaiting_move_carries_history() {
        let pending = PendingRequests::new(Duration::from_secs(5));
        let parked = req();
        let history = vec![Move {
            player: Player::Black,
            coord: None,
            turn: 1,
        }];

        pending
            .park_awaiting_move(parked.clone(), history.clone())
            .await;

        let (taken, snapshot) = pending
            .take_awaiting_move(&parked.game_id, &parked.req_id)
            .await
            .expect("entry");
        assert_eq!(taken, parked);
        assert_eq!(snapshot, history);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_expires_old_entries() {
        let pending = PendingRequests::new(Duration::from_millis(100));
        pending.park_awaiting_history(req()).await;

        assert_eq!(pending.sweep().await, 0);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(pending.sweep().await, 1);
        assert!(pending.is_empty().await);
    }
}
