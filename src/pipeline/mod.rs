//! Progress reporting and background orchestration of a ranking run

pub mod progress;
pub mod orchestrator;

pub use orchestrator::{PipelineEvent, PipelineHandle, RankingOutcome, RankingPipeline, RankingRequest};
pub use progress::ProgressReporter;
