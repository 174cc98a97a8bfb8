// In-process stand-in for an ordered, partitioned, replayable append log
// (a message broker with per-partition ordering and at-least-once
// delivery). Every topic keeps its full record list for replay and
// notifies live subscribers over a broadcast channel.

use super::codec::{encode, CodecError};
use super::messages::StreamMessage;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

const LIVE_CHANNEL_CAPACITY: usize = 256;

/// One entry in a topic. `offset` is the record's position in the topic,
/// assigned at append time; consumers dedupe on it.
#[derive(Debug, Clone)]
pub struct Record {
    pub offset: u64,
    pub key: String,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct Topic {
    name: &'static str,
    records: Arc<RwLock<Vec<Record>>>,
    live: broadcast::Sender<Record>,
}

impl Topic {
    pub fn new(name: &'static str) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            name,
            records: Arc::new(RwLock::new(Vec::new())),
            live,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append raw bytes under a partition key. Returns the record's offset.
    pub async fn append(&self, key: String, data: Vec<u8>) -> u64 {
        let mut records = self.records.write().await;
        let offset = records.len() as u64;
        let record = Record { offset, key, data };
        records.push(record.clone());
        // Send while holding the write lock so a subscriber snapshotting
        // the backlog can never miss a record in between.
        if self.live.send(record).is_err() {
            debug!(topic = self.name, offset, "record appended with no live subscribers");
        }
        offset
    }

    /// Encode a message and append it, keyed on the message's partition key.
    pub async fn publish(&self, message: &StreamMessage) -> Result<u64, CodecError> {
        let data = encode(message)?;
        let offset = self.append(message.key(), data).await;
        debug!(topic = self.name, kind = message.kind(), offset, "published");
        Ok(offset)
    }

    /// Subscribe starting at `offset`: already-appended records are
    /// replayed first, then live records follow without gaps.
    pub async fn subscribe_from(&self, offset: u64) -> Subscription {
        let records = self.records.read().await;
        let backlog: VecDeque<Record> = records
            .iter()
            .filter(|r| r.offset >= offset)
            .cloned()
            .collect();
        let rx = self.live.subscribe();
        drop(records);
        Subscription {
            topic: self.name,
            records: Arc::clone(&self.records),
            backlog,
            next_offset: offset,
            rx,
        }
    }

    /// Subscribe to records appended from now on.
    pub async fn subscribe(&self) -> Subscription {
        let len = self.records.read().await.len() as u64;
        self.subscribe_from(len).await
    }
}

pub struct Subscription {
    topic: &'static str,
    records: Arc<RwLock<Vec<Record>>>,
    backlog: VecDeque<Record>,
    next_offset: u64,
    rx: broadcast::Receiver<Record>,
}

impl Subscription {
    /// Next record in offset order. A lagged live channel is recovered by
    /// re-reading the log from the last delivered offset, so no record is
    /// ever skipped. `None` once the topic is gone and the backlog is
    /// drained.
    pub async fn recv(&mut self) -> Option<Record> {
        loop {
            if let Some(record) = self.backlog.pop_front() {
                self.next_offset = record.offset + 1;
                return Some(record);
            }
            match self.rx.recv().await {
                Ok(record) => {
                    // A backlog rebuild may already have delivered it
                    if record.offset < self.next_offset {
                        continue;
                    }
                    self.next_offset = record.offset + 1;
                    return Some(record);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(topic = self.topic, missed, "subscription lagged, replaying from the log");
                    let records = self.records.read().await;
                    self.backlog = records
                        .iter()
                        .filter(|r| r.offset >= self.next_offset)
                        .cloned()
                        .collect();
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// The named topics the core reads and writes.
pub struct Topics {
    pub make_move_cmd: Topic,
    pub move_made_ev: Topic,
    pub move_rejected_ev: Topic,
    pub provide_history_cmd: Topic,
    pub history_provided_ev: Topic,
    pub req_sync_cmd: Topic,
    pub sync_reply_ev: Topic,
    pub lobby_ev: Topic,
    pub game_states_changelog: Topic,
}

impl Topics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            make_move_cmd: Topic::new("make_move_cmd"),
            move_made_ev: Topic::new("move_made_ev"),
            move_rejected_ev: Topic::new("move_rejected_ev"),
            provide_history_cmd: Topic::new("provide_history_cmd"),
            history_provided_ev: Topic::new("history_provided_ev"),
            req_sync_cmd: Topic::new("req_sync_cmd"),
            sync_reply_ev: Topic::new("sync_reply_ev"),
            lobby_ev: Topic::new("lobby_ev"),
            game_states_changelog: Topic::new("game_states_changelog"),
        })
    }
}
