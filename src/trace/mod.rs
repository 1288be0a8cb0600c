//! 事件追踪：事件类型、记录器与上下文回放

pub mod event;
pub mod recorder;

pub use event::{Event, EventKind};
pub use recorder::{replay, EventRecorder, TurnArtifact};
