// The judge turns unvalidated move commands into authoritative outcomes:
// exactly one `MoveMade` or `MoveRejected` per request.

pub use service::{Judgement, JudgeService};

mod service;
