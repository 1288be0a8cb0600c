//! 专员注册表：启动时加载一次的静态配置表
//!
//! build 时校验：名称唯一、入口存在、转接目标与钩子存在、动作与安全检查已注册、
//! 每个专员都有路径回到入口。任一不满足即失败，之后只读。

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::core::RegistryError;
use crate::guardrails::SafetyPipeline;
use crate::specialists::{HookRegistry, Specialist, TransferEdge, TransferHook};
use crate::tools::ActionRegistry;

#[derive(Debug, Clone)]
pub struct SpecialistRegistry {
    specialists: BTreeMap<String, Specialist>,
    /// 声明顺序（用于快照展示）
    order: Vec<String>,
    entry: String,
    hooks: HookRegistry,
}

impl SpecialistRegistry {
    pub fn build(
        specialists: Vec<Specialist>,
        entry: &str,
        hooks: HookRegistry,
        actions: &ActionRegistry,
        checks: &SafetyPipeline,
    ) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        let mut order = Vec::with_capacity(specialists.len());
        for s in specialists {
            if map.contains_key(&s.name) {
                return Err(RegistryError::DuplicateSpecialist(s.name));
            }
            order.push(s.name.clone());
            map.insert(s.name.clone(), s);
        }
        if !map.contains_key(entry) {
            return Err(RegistryError::MissingEntry(entry.to_string()));
        }

        for s in map.values() {
            for edge in &s.transfers {
                if !map.contains_key(&edge.target) {
                    return Err(RegistryError::UnknownTarget {
                        from: s.name.clone(),
                        target: edge.target.clone(),
                    });
                }
                if let Some(hook) = &edge.on_transfer {
                    if !hooks.contains(hook) {
                        return Err(RegistryError::UnknownHook {
                            from: s.name.clone(),
                            hook: hook.clone(),
                        });
                    }
                }
            }
            if let Some(action) = s.actions.iter().find(|a| !actions.contains(a)) {
                return Err(RegistryError::UnknownAction {
                    specialist: s.name.clone(),
                    action: action.clone(),
                });
            }
            if let Some(check) = s.safety_checks.iter().find(|c| !checks.contains(c)) {
                return Err(RegistryError::UnknownSafetyCheck {
                    specialist: s.name.clone(),
                    check: check.clone(),
                });
            }
        }

        let reaching = reaching_entry(&map, entry);
        if let Some(stuck) = order.iter().find(|n| !reaching.contains(n.as_str())) {
            return Err(RegistryError::EntryUnreachable(stuck.clone()));
        }

        Ok(Self {
            specialists: map,
            order,
            entry: entry.to_string(),
            hooks,
        })
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn get(&self, name: &str) -> Option<&Specialist> {
        self.specialists.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specialists.contains_key(name)
    }

    /// 按声明顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Specialist> {
        self.order.iter().filter_map(|n| self.specialists.get(n))
    }

    pub fn hook(&self, id: &str) -> Option<&TransferHook> {
        self.hooks.get(id)
    }

    /// from 到 target 的转接边；不允许时返回 None
    pub fn edge(&self, from: &str, target: &str) -> Option<&TransferEdge> {
        self.specialists.get(from)?.edge(target)
    }
}

/// 反向 BFS：能沿转接边到达入口的专员集合（含入口自身）
fn reaching_entry<'a>(map: &'a BTreeMap<String, Specialist>, entry: &'a str) -> BTreeSet<&'a str> {
    let mut reverse: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for s in map.values() {
        for edge in &s.transfers {
            reverse.entry(edge.target.as_str()).or_default().push(s.name.as_str());
        }
    }

    let mut seen = BTreeSet::from([entry]);
    let mut queue = VecDeque::from([entry]);
    while let Some(node) = queue.pop_front() {
        for &pred in reverse.get(node).into_iter().flatten() {
            if seen.insert(pred) {
                queue.push_back(pred);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SharedContext;

    fn blank(_: &SharedContext) -> String {
        String::new()
    }

    fn build(specs: Vec<Specialist>) -> Result<SpecialistRegistry, RegistryError> {
        let mut hooks = HookRegistry::new();
        hooks.register("h", |_| {});
        SpecialistRegistry::build(
            specs,
            "Triage",
            hooks,
            &ActionRegistry::new(),
            &SafetyPipeline::default(),
        )
    }

    #[test]
    fn test_valid_cycle() {
        let reg = build(vec![
            Specialist::new("Triage", "", blank).transfer_with_hook("FAQ", "h"),
            Specialist::new("FAQ", "", blank).transfer_to("Triage"),
        ])
        .unwrap();
        assert_eq!(reg.entry(), "Triage");
        assert_eq!(
            reg.edge("Triage", "FAQ").and_then(|e| e.on_transfer.as_deref()),
            Some("h")
        );
        assert!(reg.edge("FAQ", "FAQ").is_none());
        let names: Vec<_> = reg.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Triage", "FAQ"]);
    }

    #[test]
    fn test_dead_end_specialist_rejected() {
        let err = build(vec![
            Specialist::new("Triage", "", blank).transfer_to("Booking"),
            Specialist::new("Booking", "", blank),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::EntryUnreachable("Booking".into()));
    }

    #[test]
    fn test_indirect_path_back_is_enough() {
        build(vec![
            Specialist::new("Triage", "", blank).transfer_to("A"),
            Specialist::new("A", "", blank).transfer_to("B"),
            Specialist::new("B", "", blank).transfer_to("Triage"),
        ])
        .unwrap();
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            build(vec![Specialist::new("Other", "", blank)]),
            Err(RegistryError::MissingEntry(_))
        ));
        assert!(matches!(
            build(vec![
                Specialist::new("Triage", "", blank),
                Specialist::new("Triage", "", blank)
            ]),
            Err(RegistryError::DuplicateSpecialist(_))
        ));
        assert!(matches!(
            build(vec![Specialist::new("Triage", "", blank).transfer_to("Ghost")]),
            Err(RegistryError::UnknownTarget { .. })
        ));
        assert!(matches!(
            build(vec![Specialist::new("Triage", "", blank).transfer_with_hook("Triage", "nope")]),
            Err(RegistryError::UnknownHook { .. })
        ));
        assert!(matches!(
            build(vec![Specialist::new("Triage", "", blank).with_actions(&["fly"])]),
            Err(RegistryError::UnknownAction { .. })
        ));
        assert!(matches!(
            build(vec![Specialist::new("Triage", "", blank).with_safety_checks(&["Relevance"])]),
            Err(RegistryError::UnknownSafetyCheck { .. })
        ));
    }
}
