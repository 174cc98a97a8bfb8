// The changelog service owns the materialized per-game state: it folds
// accepted moves into `GameState`, republishes every transition, and
// exposes the keyed store everyone else reads.

pub use repository::GameStateRepository;
pub use service::ChangelogService;

mod repository;
mod service;
