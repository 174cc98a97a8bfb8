// On-demand full-history answers, read from the aggregated state store.

pub use service::HistoryService;

mod service;
