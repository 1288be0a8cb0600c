//! 动作参数 JSON Schema 生成（schemars 自动生成）
//!
//! 动作的参数结构体 derive JsonSchema，由此得到注入给模型的参数说明。

use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// 返回参数类型 T 的 JSON Schema
pub fn args_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Args {
        /// 座位号
        seat: String,
    }

    #[test]
    fn test_schema_lists_properties() {
        let schema = args_schema::<Args>();
        assert!(schema["properties"]["seat"].is_object());
        assert_eq!(schema["required"][0], "seat");
    }
}
