//! Airdesk - 航空客服多专员编排引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排引擎、会话状态、错误与恢复、会话存储、服务门面
//! - **guardrails**: 安全检查流水线与模型判定的检查
//! - **llm**: 模型能力抽象与实现（OpenAI 兼容 / DeepSeek / 规则 / 脚本）
//! - **memory**: 共享上下文与滚动对话
//! - **observability**: 日志初始化
//! - **react**: 专员执行循环
//! - **specialists**: 专员定义、转接钩子、注册表与航空客服配置表
//! - **tools**: 动作注册表、执行器与航空客服动作
//! - **trace**: 事件、事件记录器与上下文回放

pub mod config;
pub mod core;
pub mod guardrails;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod specialists;
pub mod tools;
pub mod trace;

pub use crate::core::{AirlineDesk, ConversationState, Engine, EngineError, TurnOutcome, TurnReport};
pub use crate::trace::{Event, EventKind};
