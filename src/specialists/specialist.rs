//! 专员定义：名称、指令渲染、绑定动作、安全检查与转接边

use serde::Serialize;

use crate::memory::SharedContext;

/// 指令渲染：只读上下文
pub type InstructionRenderer = fn(&SharedContext) -> String;

/// 转接边：目标专员与可选的钩子 id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEdge {
    pub target: String,
    pub on_transfer: Option<String>,
}

/// 专员：进程启动时静态定义，不随会话创建或销毁
#[derive(Debug, Clone)]
pub struct Specialist {
    pub name: String,
    /// 供其他专员决定是否转接时参考
    pub description: String,
    pub instructions: InstructionRenderer,
    pub actions: Vec<String>,
    /// 按声明顺序执行
    pub safety_checks: Vec<String>,
    pub transfers: Vec<TransferEdge>,
}

impl Specialist {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: InstructionRenderer,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions,
            actions: Vec::new(),
            safety_checks: Vec::new(),
            transfers: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: &[&str]) -> Self {
        self.actions.extend(actions.iter().map(|a| a.to_string()));
        self
    }

    pub fn with_safety_checks(mut self, checks: &[&str]) -> Self {
        self.safety_checks.extend(checks.iter().map(|c| c.to_string()));
        self
    }

    pub fn transfer_to(mut self, target: impl Into<String>) -> Self {
        self.transfers.push(TransferEdge {
            target: target.into(),
            on_transfer: None,
        });
        self
    }

    pub fn transfer_with_hook(mut self, target: impl Into<String>, hook: impl Into<String>) -> Self {
        self.transfers.push(TransferEdge {
            target: target.into(),
            on_transfer: Some(hook.into()),
        });
        self
    }

    pub fn render(&self, ctx: &SharedContext) -> String {
        (self.instructions)(ctx)
    }

    pub fn edge(&self, target: &str) -> Option<&TransferEdge> {
        self.transfers.iter().find(|e| e.target == target)
    }

    pub fn binds(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    pub fn target_names(&self) -> Vec<String> {
        self.transfers.iter().map(|e| e.target.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greet(ctx: &SharedContext) -> String {
        format!("Hello {}", ctx.passenger_name.as_deref().unwrap_or("there"))
    }

    #[test]
    fn test_builder_and_lookup() {
        let s = Specialist::new("A", "first", greet)
            .with_actions(&["x"])
            .with_safety_checks(&["c1", "c2"])
            .transfer_to("B")
            .transfer_with_hook("C", "h");
        assert!(s.binds("x"));
        assert!(!s.binds("y"));
        assert_eq!(s.edge("C").and_then(|e| e.on_transfer.as_deref()), Some("h"));
        assert!(s.edge("D").is_none());
        assert_eq!(s.target_names(), vec!["B", "C"]);
        assert_eq!(s.safety_checks, vec!["c1", "c2"]);
    }

    #[test]
    fn test_render_reads_context() {
        let s = Specialist::new("A", "", greet);
        let ctx = SharedContext {
            passenger_name: Some("Ann".into()),
            ..Default::default()
        };
        assert_eq!(s.render(&ctx), "Hello Ann");
        assert_eq!(s.render(&SharedContext::default()), "Hello there");
    }
}
