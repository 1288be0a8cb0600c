//! 转接钩子：转接时执行一次，为目标专员补齐上下文字段
//!
//! 钩子只做 fill-if-absent，已有值永不覆盖，因此重复执行结果不变。

use std::collections::BTreeMap;

use crate::memory::context::{generate_confirmation_code, generate_flight_number};
use crate::memory::{fill_if_absent, SharedContext};

pub type HookFn = fn(&mut SharedContext);

/// 具名钩子；名称会作为事件中的动作名出现
#[derive(Debug, Clone, Copy)]
pub struct TransferHook {
    pub name: &'static str,
    pub apply: HookFn,
}

pub const SEAT_BOOKING_HOOK: &str = "on_seat_booking_handoff";
pub const CANCELLATION_HOOK: &str = "on_cancellation_handoff";
pub const COMPENSATION_HOOK: &str = "on_compensation_handoff";

/// 钩子表：HookId -> 钩子
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: BTreeMap<String, TransferHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, apply: HookFn) {
        self.hooks.insert(name.to_string(), TransferHook { name, apply });
    }

    pub fn get(&self, id: &str) -> Option<&TransferHook> {
        self.hooks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.hooks.contains_key(id)
    }
}

/// 改座前需要航班与订单
pub fn on_seat_booking_handoff(ctx: &mut SharedContext) {
    fill_if_absent(&mut ctx.flight_number, generate_flight_number);
    fill_if_absent(&mut ctx.confirmation_number, generate_confirmation_code);
}

/// 取消前需要订单与航班
pub fn on_cancellation_handoff(ctx: &mut SharedContext) {
    fill_if_absent(&mut ctx.confirmation_number, generate_confirmation_code);
    fill_if_absent(&mut ctx.flight_number, generate_flight_number);
}

/// 补偿工单挂在订单上
pub fn on_compensation_handoff(ctx: &mut SharedContext) {
    fill_if_absent(&mut ctx.confirmation_number, generate_confirmation_code);
    fill_if_absent(&mut ctx.flight_number, generate_flight_number);
}

pub fn airline_hooks() -> HookRegistry {
    let mut hooks = HookRegistry::new();
    hooks.register(SEAT_BOOKING_HOOK, on_seat_booking_handoff);
    hooks.register(CANCELLATION_HOOK, on_cancellation_handoff);
    hooks.register(COMPENSATION_HOOK, on_compensation_handoff);
    hooks
}
