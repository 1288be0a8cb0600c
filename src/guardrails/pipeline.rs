//! 安全检查流水线
//!
//! 每个检查只判定最新一条用户消息；任一检查失败即触发（tripped），引擎跳过本轮专员执行。
//! 检查自身出错时按通过处理（fail open），并把原因写入 rationale。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::llm::{CapabilityError, Judgment};
use crate::memory::SharedContext;

/// 安全检查 trait：必须有显式名称
#[async_trait]
pub trait SafetyCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self, input: &str, ctx: &SharedContext) -> Result<Judgment, CapabilityError>;
}

/// 评估策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPolicy {
    /// 全部检查并发评估，报告真实结果；被拦截时其余通过的检查保留各自的判定理由，不清空
    #[default]
    EvaluateAll,
    /// 顺序评估，首个失败后其余检查记为推定通过（evaluated = false）
    StopAtFirstFailure,
}

/// 单个检查的审计记录；记录后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheckResult {
    pub id: String,
    pub name: String,
    pub input: String,
    pub passed: bool,
    pub rationale: String,
    pub timestamp: i64,
    /// false 表示因短路未实际评估
    pub evaluated: bool,
}

impl SafetyCheckResult {
    fn new(name: &str, input: &str, passed: bool, rationale: String, evaluated: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            input: input.to_string(),
            passed,
            rationale,
            timestamp: chrono::Utc::now().timestamp_millis(),
            evaluated,
        }
    }
}

/// 流水线结果：结果顺序与声明顺序一致
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Passed(Vec<SafetyCheckResult>),
    Tripped {
        failed_check: String,
        results: Vec<SafetyCheckResult>,
    },
}

impl PipelineOutcome {
    pub fn results(&self) -> &[SafetyCheckResult] {
        match self {
            PipelineOutcome::Passed(r) => r,
            PipelineOutcome::Tripped { results, .. } => results,
        }
    }

    pub fn into_results(self) -> Vec<SafetyCheckResult> {
        match self {
            PipelineOutcome::Passed(r) => r,
            PipelineOutcome::Tripped { results, .. } => results,
        }
    }

    pub fn is_tripped(&self) -> bool {
        matches!(self, PipelineOutcome::Tripped { .. })
    }
}

/// 流水线：按名称持有全部检查，按专员声明的顺序执行其中一部分
#[derive(Clone, Default)]
pub struct SafetyPipeline {
    checks: BTreeMap<String, Arc<dyn SafetyCheck>>,
    policy: SafetyPolicy,
}

impl SafetyPipeline {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            checks: BTreeMap::new(),
            policy,
        }
    }

    pub fn register(&mut self, check: impl SafetyCheck + 'static) {
        self.checks.insert(check.name().to_string(), Arc::new(check));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    pub fn check_names(&self) -> Vec<String> {
        self.checks.keys().cloned().collect()
    }

    pub fn policy(&self) -> SafetyPolicy {
        self.policy
    }

    /// 单个检查：出错或未注册时 fail open
    async fn evaluate_one(&self, name: &str, input: &str, ctx: &SharedContext) -> SafetyCheckResult {
        let judged = match self.checks.get(name) {
            Some(check) => check.evaluate(input, ctx).await,
            None => Err(CapabilityError::Transport(format!("unknown check '{name}'"))),
        };
        match judged {
            Ok(j) => SafetyCheckResult::new(name, input, j.verdict, j.reasoning, true),
            Err(e) => {
                tracing::warn!(check = name, error = %e, "Safety check failed to evaluate, treating as passed");
                SafetyCheckResult::new(name, input, true, format!("check unavailable: {e}"), true)
            }
        }
    }

    /// 对最新用户消息运行给定检查
    pub async fn run(&self, names: &[String], input: &str, ctx: &SharedContext) -> PipelineOutcome {
        let results = match self.policy {
            SafetyPolicy::EvaluateAll => {
                join_all(names.iter().map(|n| self.evaluate_one(n, input, ctx))).await
            }
            SafetyPolicy::StopAtFirstFailure => {
                let mut results = Vec::with_capacity(names.len());
                let mut tripped = false;
                for n in names {
                    if tripped {
                        results.push(SafetyCheckResult::new(n, input, true, String::new(), false));
                        continue;
                    }
                    let r = self.evaluate_one(n, input, ctx).await;
                    tripped = !r.passed;
                    results.push(r);
                }
                results
            }
        };

        match results.iter().find(|r| !r.passed) {
            Some(failed) => {
                let failed_check = failed.name.clone();
                tracing::info!(check = %failed_check, "Safety check tripped");
                PipelineOutcome::Tripped {
                    failed_check,
                    results,
                }
            }
            None => PipelineOutcome::Passed(results),
        }
    }
}
