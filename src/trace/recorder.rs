//! 事件记录器
//!
//! 按生成顺序把一轮的执行产物转成事件：消息、转接（附带钩子调用）、动作调用与结果；
//! 最后对比轮前轮后的上下文，若有变化追加一条 context_update，归属本轮最终专员。

use serde_json::Value;

use crate::memory::SharedContext;
use crate::trace::{Event, EventKind};

/// 专员循环产生的原始产物
#[derive(Debug, Clone, PartialEq)]
pub enum TurnArtifact {
    Message {
        agent: String,
        content: String,
    },
    Invocation {
        agent: String,
        call_id: String,
        name: String,
        arguments: Value,
    },
    Result {
        agent: String,
        call_id: String,
        name: String,
        output: Value,
        is_error: bool,
    },
    Transfer {
        from: String,
        to: String,
        /// 转接时执行的钩子名称
        hook: Option<String>,
    },
}

/// 纯函数：不读写任何会话状态
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRecorder;

impl EventRecorder {
    /// 返回本轮事件与最终专员
    pub fn record(
        artifacts: &[TurnArtifact],
        start_agent: &str,
        before: &SharedContext,
        after: &SharedContext,
    ) -> (Vec<Event>, String) {
        let mut events = Vec::with_capacity(artifacts.len() + 1);
        let mut agent = start_agent.to_string();

        for artifact in artifacts {
            match artifact {
                TurnArtifact::Message { agent: a, content } => {
                    events.push(Event::new(a, EventKind::Message {
                        content: content.clone(),
                    }));
                }
                TurnArtifact::Invocation {
                    agent: a,
                    call_id,
                    name,
                    arguments,
                } => {
                    events.push(Event::new(a, EventKind::ActionInvocation {
                        call_id: call_id.clone(),
                        tool: name.clone(),
                        args: arguments.clone(),
                    }));
                }
                TurnArtifact::Result {
                    agent: a,
                    call_id,
                    name,
                    output,
                    is_error,
                } => {
                    events.push(Event::new(a, EventKind::ActionResult {
                        call_id: call_id.clone(),
                        tool: name.clone(),
                        output: output.clone(),
                        is_error: *is_error,
                    }));
                }
                TurnArtifact::Transfer { from, to, hook } => {
                    events.push(Event::new(from, EventKind::Transfer {
                        from: from.clone(),
                        to: to.clone(),
                    }));
                    if let Some(hook) = hook {
                        events.push(Event::new(to, EventKind::ActionInvocation {
                            call_id: format!("hook_{}", uuid::Uuid::new_v4().simple()),
                            tool: hook.clone(),
                            args: Value::Object(Default::default()),
                        }));
                    }
                    agent = to.clone();
                }
            }
        }

        let changes = SharedContext::diff(before, after);
        if !changes.is_empty() {
            events.push(Event::new(&agent, EventKind::ContextUpdate { changes }));
        }
        (events, agent)
    }
}

/// 从基线上下文开始按序应用 context_update 事件，重建最终上下文
pub fn replay(baseline: &SharedContext, events: &[Event]) -> Result<SharedContext, serde_json::Error> {
    let mut ctx = baseline.clone();
    for ev in events {
        if let EventKind::ContextUpdate { changes } = &ev.kind {
            ctx.apply_changes(changes)?;
        }
    }
    Ok(ctx)
}
