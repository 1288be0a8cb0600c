//! 共享上下文：专员之间共用的订单 / 航班 / 座位 / 理赔字段
//!
//! 所有字段可选、初始为空，由动作或转接钩子按需填充。
//! 每轮结束时将前后快照按字段比较，得到 context_update 事件的变更表。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 字段名 -> 新值（字段被清空时为 null）
pub type ContextChanges = BTreeMap<String, Value>;

/// 单个会话独占的可变记录；只有动作与转接钩子可以修改
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedContext {
    pub passenger_name: Option<String>,
    pub account_number: Option<String>,
    pub confirmation_number: Option<String>,
    pub flight_number: Option<String>,
    pub seat_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub baggage_claim_id: Option<String>,
    pub compensation_case_id: Option<String>,
    pub vouchers: Option<Vec<String>>,
    pub special_service_note: Option<String>,
    /// 内部场景标记，不对外展示
    pub scenario: Option<String>,
}

/// 快照中不对外展示的字段
const INTERNAL_FIELDS: &[&str] = &["scenario"];

impl SharedContext {
    /// 新会话的初始上下文：生成 8 位账号并填入演示乘客
    pub fn initial() -> Self {
        Self {
            passenger_name: Some("John Doe".to_string()),
            account_number: Some(generate_digits(8)),
            ..Self::default()
        }
    }

    /// 全部字段（含空字段）的有序映射，用于比较与序列化
    pub fn to_fields(&self) -> BTreeMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }

    /// 与 before 比较，返回值发生变化的字段及其新值；不多不少
    pub fn diff(before: &SharedContext, after: &SharedContext) -> ContextChanges {
        let old = before.to_fields();
        after
            .to_fields()
            .into_iter()
            .filter(|(k, v)| old.get(k) != Some(v))
            .collect()
    }

    /// 将变更表写回上下文（用于事件回放）；未知字段或类型不符时返回错误
    pub fn apply_changes(&mut self, changes: &ContextChanges) -> Result<(), serde_json::Error> {
        let mut fields = self.to_fields();
        for (k, v) in changes {
            fields.insert(k.clone(), v.clone());
        }
        let map: serde_json::Map<String, Value> = fields.into_iter().collect();
        *self = serde_json::from_value(Value::Object(map))?;
        Ok(())
    }

    /// 对外展示用的视图（去掉内部字段）
    pub fn public_view(&self) -> BTreeMap<String, Value> {
        let mut fields = self.to_fields();
        for f in INTERNAL_FIELDS {
            fields.remove(*f);
        }
        fields
    }
}

/// 仅在字段为空时写入；已有值永不覆盖
pub fn fill_if_absent(slot: &mut Option<String>, make: impl FnOnce() -> String) {
    if slot.as_deref().map_or(true, str::is_empty) {
        *slot = Some(make());
    }
}

/// 6 位大写字母数字确认码
pub fn generate_confirmation_code() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(6)
        .collect()
}

/// 航班号，如 FLT-123
pub fn generate_flight_number() -> String {
    format!("FLT-{}", generate_digits(3))
}

/// 生成 n 位十进制数字串（首位非 0）
pub fn generate_digits(n: usize) -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    (0..n)
        .map(|i| {
            let b = bytes[i % bytes.len()];
            let d = if i == 0 { 1 + b % 9 } else { b % 10 };
            char::from(b'0' + d)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_reports_exactly_changed_fields() {
        let before = SharedContext {
            passenger_name: Some("Ann".into()),
            seat_number: Some("12A".into()),
            ..Default::default()
        };
        let mut after = before.clone();
        after.seat_number = Some("14C".into());
        after.flight_number = Some("FLT-100".into());

        let changes = SharedContext::diff(&before, &after);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["seat_number"], Value::from("14C"));
        assert_eq!(changes["flight_number"], Value::from("FLT-100"));
    }

    #[test]
    fn test_diff_empty_when_unchanged() {
        let ctx = SharedContext::initial();
        assert!(SharedContext::diff(&ctx, &ctx.clone()).is_empty());
    }

    #[test]
    fn test_diff_reports_cleared_field_as_null() {
        let before = SharedContext {
            baggage_claim_id: Some("BG-1".into()),
            ..Default::default()
        };
        let changes = SharedContext::diff(&before, &SharedContext::default());
        assert_eq!(changes["baggage_claim_id"], Value::Null);
    }

    #[test]
    fn test_apply_changes_reconstructs_target() {
        let before = SharedContext::initial();
        let mut after = before.clone();
        after.vouchers = Some(vec!["MEAL-15".into()]);
        after.confirmation_number = Some("ABC123".into());

        let mut replayed = before.clone();
        replayed
            .apply_changes(&SharedContext::diff(&before, &after))
            .unwrap();
        assert_eq!(replayed, after);
    }

    #[test]
    fn test_apply_changes_rejects_bad_type() {
        let mut ctx = SharedContext::default();
        let mut changes = ContextChanges::new();
        changes.insert("vouchers".into(), Value::from(3));
        assert!(ctx.apply_changes(&changes).is_err());
    }

    #[test]
    fn test_fill_if_absent_never_overwrites() {
        let mut slot = Some("KEEP01".to_string());
        fill_if_absent(&mut slot, || "NEW".to_string());
        assert_eq!(slot.as_deref(), Some("KEEP01"));

        let mut empty = None;
        fill_if_absent(&mut empty, || "NEW".to_string());
        assert_eq!(empty.as_deref(), Some("NEW"));
    }

    #[test]
    fn test_generators_shape() {
        let code = generate_confirmation_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

        let acct = generate_digits(8);
        assert_eq!(acct.len(), 8);
        assert!(!acct.starts_with('0'));
        assert!(generate_flight_number().starts_with("FLT-"));
    }

    #[test]
    fn test_public_view_hides_scenario() {
        let ctx = SharedContext {
            scenario: Some("delayed".into()),
            ..Default::default()
        };
        let view = ctx.public_view();
        assert!(!view.contains_key("scenario"));
        assert!(view.contains_key("seat_number"));
    }
}
