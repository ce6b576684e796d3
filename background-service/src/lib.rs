//! The crawl loop: incremental collection per board, keyword extraction and
//! archiving, driven by a periodic scheduler.

pub mod collector;
pub mod pipeline;
pub mod scheduler;


pub use collector::{Collection, IncrementalCollector, DEFAULT_CURSOR_DEPTH, DEFAULT_PAGE_DELAY};
pub use pipeline::{BoardPipeline, PipelineReport};
pub use scheduler::{merge_rules, BackgroundService, InFlightBoards, InFlightGuard, ServiceState};
