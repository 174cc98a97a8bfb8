// JSON codec applied at the log boundary. Records carry an explicit
// schema version; anything undecodable or mis-versioned is a recoverable
// error that consumers log and skip.

use super::messages::StreamMessage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (expected {expected})")]
    Version { found: u8, expected: u8 },
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    #[serde(flatten)]
    message: StreamMessage,
}

pub fn encode(message: &StreamMessage) -> Result<Vec<u8>, CodecError> {
    let envelope = Envelope {
        v: SCHEMA_VERSION,
        message: message.clone(),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

pub fn decode(data: &[u8]) -> Result<StreamMessage, CodecError> {
    let envelope: Envelope = serde_json::from_slice(data)?;
    if envelope.v != SCHEMA_VERSION {
        return Err(CodecError::Version {
            found: envelope.v,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(envelope.message)
}
