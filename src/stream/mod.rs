// Stream infrastructure: the message schemas that travel over the log,
// the JSON codec applied at the log boundary, and the in-process ordered,
// partitioned, replayable append log the services communicate through.

pub use codec::{decode, encode, CodecError};
pub use log::{Record, Subscription, Topic, Topics};
pub use messages::{
    GameStateRecord, HistoryProvided, MakeMoveCommand, MoveMade, MoveRejected, ProvideHistory,
    ReqSync, StreamMessage, SyncReply,
};

mod codec;
mod log;
mod messages;
