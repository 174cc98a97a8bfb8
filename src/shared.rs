use thiserror::Error;

use crate::model::GameId;
use crate::stream::CodecError;

/// Failure taxonomy for the core services. Everything here is recoverable
/// at the stream-processing level: the per-partition loop logs and moves
/// on. Losing the log itself is fatal to the process, which restarts and
/// replays from its last committed offset.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("game not found: {0}")]
    GameNotFound(GameId),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
