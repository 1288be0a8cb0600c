//! 专员执行循环：模型 -> 动作 -> 转接

pub mod loop_;

pub use loop_::{SpecialistLoop, TurnRun, DEFAULT_MAX_STEPS};
