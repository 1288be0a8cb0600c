//! 脚本模型（用于测试，无需 API）
//!
//! 按顺序回放预设的 generate 回复与 judge 判定，并记录每次请求，便于断言引擎传给模型的内容。

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::llm::{CapabilityError, GenerateRequest, Judgment, ModelCapability, ModelResponse};
use crate::memory::Item;

/// 一次 generate 请求的记录
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub specialist: String,
    pub instructions: String,
    pub transcript: Vec<Item>,
    pub action_names: Vec<String>,
    pub transfer_targets: Vec<String>,
}

/// 脚本模型：generate 依次弹出预设回复；judge 依次弹出预设判定，用完后默认通过
#[derive(Debug, Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<ModelResponse, CapabilityError>>>,
    judgments: Mutex<VecDeque<Result<Judgment, CapabilityError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    judged_inputs: Mutex<Vec<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: ModelResponse) -> Self {
        lock(&self.responses).push_back(Ok(response));
        self
    }

    pub fn respond_items(self, items: Vec<Item>) -> Self {
        self.respond(ModelResponse::new(items))
    }

    pub fn respond_error(self, err: CapabilityError) -> Self {
        lock(&self.responses).push_back(Err(err));
        self
    }

    pub fn judge_with(self, judgment: Judgment) -> Self {
        lock(&self.judgments).push_back(Ok(judgment));
        self
    }

    pub fn judge_error(self, err: CapabilityError) -> Self {
        lock(&self.judgments).push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn judged_inputs(&self) -> Vec<String> {
        lock(&self.judged_inputs).clone()
    }

    pub fn remaining_responses(&self) -> usize {
        lock(&self.responses).len()
    }
}

#[async_trait]
impl ModelCapability for ScriptedModel {
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<ModelResponse, CapabilityError> {
        lock(&self.requests).push(RecordedRequest {
            specialist: request.specialist.to_string(),
            instructions: request.instructions.to_string(),
            transcript: request.transcript.to_vec(),
            action_names: request.actions.iter().map(|a| a.name.clone()).collect(),
            transfer_targets: request.transfers.iter().map(|t| t.name.clone()).collect(),
        });
        lock(&self.responses)
            .pop_front()
            .unwrap_or(Err(CapabilityError::Exhausted))
    }

    async fn judge(&self, _instructions: &str, input: &str) -> Result<Judgment, CapabilityError> {
        lock(&self.judged_inputs).push(input.to_string());
        lock(&self.judgments)
            .pop_front()
            .unwrap_or_else(|| Ok(Judgment::pass("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(transcript: &'a [Item]) -> GenerateRequest<'a> {
        GenerateRequest {
            specialist: "Triage Agent",
            instructions: "route",
            transcript,
            actions: &[],
            transfers: &[],
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let model = ScriptedModel::new()
            .respond(ModelResponse::message("one"))
            .respond(ModelResponse::message("two"));
        let transcript = vec![Item::user("hi")];
        assert_eq!(model.generate(&request(&transcript)).await.unwrap(), ModelResponse::message("one"));
        assert_eq!(model.generate(&request(&transcript)).await.unwrap(), ModelResponse::message("two"));
        assert_eq!(
            model.generate(&request(&transcript)).await,
            Err(CapabilityError::Exhausted)
        );
        assert_eq!(model.requests().len(), 3);
        assert_eq!(model.requests()[0].specialist, "Triage Agent");
    }

    #[tokio::test]
    async fn test_judgments_default_to_pass() {
        let model = ScriptedModel::new().judge_with(Judgment::fail("off topic"));
        assert!(!model.judge("i", "poem").await.unwrap().verdict);
        assert!(model.judge("i", "seat").await.unwrap().verdict);
        assert_eq!(model.judged_inputs(), vec!["poem", "seat"]);
    }
}
