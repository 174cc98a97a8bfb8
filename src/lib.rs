// Game state consistency core: a judge validating moves against Go
// rules, an event-sourced changelog materializing game state, a history
// provider, and a sync reconciler, all communicating over in-process
// ordered topics.

pub mod changelog;
pub mod history;
pub mod judge;
pub mod lobby;
pub mod model;
pub mod rules;
pub mod shared;
pub mod stream;
pub mod sync;

// Re-export commonly used types for easier access in tests
pub use changelog::{ChangelogService, GameStateRepository};
pub use history::HistoryService;
pub use judge::{JudgeService, Judgement};
pub use shared::CoreError;
pub use stream::{decode, encode, StreamMessage, Topics};
pub use sync::{classify, SyncService, SyncStatus};
