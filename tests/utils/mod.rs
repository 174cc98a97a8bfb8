// Shared integration-test harness: runs every service over a fresh set
// of in-process topics and gives tests typed helpers for driving games
// and observing replies.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use kifu::changelog::{ChangelogService, GameStateRepository};
use kifu::history::HistoryService;
use kifu::judge::JudgeService;
use kifu::lobby::GameReady;
use kifu::model::{
    Coord, EventId, GameId, Move, Player, ReqId, SessionId, DEFAULT_BOARD_SIZE,
};
use kifu::stream::{
    decode, MakeMoveCommand, ReqSync, StreamMessage, Subscription, SyncReply, Topics,
};
use kifu::sync::SyncService;

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

pub struct TestCore {
    pub topics: Arc<Topics>,
    pub store: GameStateRepository,
    tasks: Vec<JoinHandle<()>>,
}

impl TestCore {
    /// Spin up the whole pipeline on fresh topics.
    pub fn start() -> Self {
        let topics = Topics::new();
        let store = GameStateRepository::new();

        let mut tasks = Vec::new();
        tasks.extend(Arc::new(ChangelogService::new(store.clone(), topics.clone())).start());
        tasks.push(Arc::new(JudgeService::new(store.clone(), topics.clone())).start());
        tasks.push(Arc::new(HistoryService::new(store.clone(), topics.clone())).start());
        tasks.extend(Arc::new(SyncService::new(topics.clone())).start());

        Self {
            topics,
            store,
            tasks,
        }
    }

    /// Announce a ready game and wait for the seed to land in the store.
    pub async fn seed_game(&self) -> GameId {
        let game_id = GameId::new();
        let ready = StreamMessage::GameReady(GameReady {
            game_id: game_id.clone(),
            sessions: (SessionId::new(), SessionId::new()),
            event_id: EventId::new(),
            board_size: DEFAULT_BOARD_SIZE,
        });
        self.topics
            .lobby_ev
            .publish(&ready)
            .await
            .expect("publish game ready");

        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.store.get(&game_id).await.is_none() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "game was never seeded"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        game_id
    }

    /// Submit a move and wait until the changelog has folded it.
    pub async fn play(&self, game_id: &GameId, player: Player, coord: Coord) {
        let mut changelog = self.topics.game_states_changelog.subscribe().await;

        let cmd = StreamMessage::MakeMove(MakeMoveCommand {
            game_id: game_id.clone(),
            req_id: ReqId::new(),
            player,
            coord: Some(coord),
        });
        self.topics
            .make_move_cmd
            .publish(&cmd)
            .await
            .expect("publish move");

        loop {
            match next_message(&mut changelog).await {
                StreamMessage::GameState(record) if record.game_id == *game_id => {
                    if record.state.moves.last().and_then(|m| m.coord) == Some(coord) {
                        return;
                    }
                }
                _ => continue,
            }
        }
    }

    /// Standard opening used across the reconciliation scenarios.
    pub async fn play_two_moves(&self, game_id: &GameId) -> Vec<Move> {
        self.play(game_id, Player::Black, Coord::of(4, 4)).await;
        self.play(game_id, Player::White, Coord::of(10, 10)).await;
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

    /// Send a sync claim and wait for the reply correlated to it.
    pub async fn request_sync(&self, req: ReqSync) -> SyncReply {
        let mut replies = self.topics.sync_reply_ev.subscribe().await;

        self.topics
            .req_sync_cmd
            .publish(&StreamMessage::ReqSync(req.clone()))
            .await
            .expect("publish sync request");

        loop {
            match next_message(&mut replies).await {
                StreamMessage::SyncReply(reply) if reply.reply_to == req.req_id => return reply,
                _ => continue,
            }
        }
    }
}

impl Drop for TestCore {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub async fn next_message(sub: &mut Subscription) -> StreamMessage {
    let record = tokio::time::timeout(RECV_TIMEOUT, sub.recv())
        .await
        .expect("timed out waiting for a record")
        .expect("topic closed");
    decode(&record.data).expect("decode")
}

pub fn sync_claim(
    game_id: &GameId,
    turn: u32,
    player_up: Player,
    last_move: Option<Move>,
) -> ReqSync {
    ReqSync {
        session_id: SessionId::new(),
        req_id: ReqId::new(),
        game_id: game_id.clone(),
        player_up,
        turn,
        last_move,
    }
}
