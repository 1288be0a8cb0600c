//! 专员：定义、转接钩子、校验过的注册表与航空客服配置表

pub mod airline;
pub mod hooks;
pub mod registry;
pub mod specialist;

pub use hooks::{airline_hooks, HookRegistry, TransferHook};
pub use registry::SpecialistRegistry;
pub use specialist::{InstructionRenderer, Specialist, TransferEdge};
