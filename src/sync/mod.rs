// Reconciliation between a client's claimed view of a game and the
// server's authoritative history: a four-way classification, a pending
// request table with expiry, and the service that joins it all together.

pub use classify::{classify, server_player_up, server_turn, SyncStatus};
pub use pending::PendingRequests;
pub use service::SyncService;

mod classify;
mod pending;
mod service;
