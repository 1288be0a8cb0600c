//! 安全检查：流水线与模型判定的检查

pub mod judged;
pub mod pipeline;

pub use judged::{ModelJudgedCheck, JAILBREAK_CHECK, RELEVANCE_CHECK};
pub use pipeline::{PipelineOutcome, SafetyCheck, SafetyCheckResult, SafetyPipeline, SafetyPolicy};
