//! The debate: three analysts in parallel, then the adjudicator

pub mod orchestrator;
pub mod transcript;
pub mod verdict;

pub use orchestrator::{DebateOrchestrator, PipelineState};
pub use transcript::{AgentRole, DebateRecord, DebateTranscript};
pub use verdict::{Classification, SubScores, Verdict, XaiRationale};
