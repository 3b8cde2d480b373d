//! Offender 汇总 - 业务能力层
//!
//! 为归档生成精简记录：合并所有工具的 offenders，并去掉原始响应体等字节负载。

use crate::models::{AuditResult, OrderedMap};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// 一定是字节负载的字段名
const BYTE_PAYLOAD_KEYS: &[&str] = &["bodyBuffer"];

/// 归档记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffenderSummary {
    pub url: String,
    pub name: String,
    pub offenders: OrderedMap<JsonValue>,
}

/// 汇总单个结果的 offenders
///
/// 按类别浅合并，同名类别后出现的工具覆盖先出现的工具（与指标合并策略一致）。
pub fn summarize(result: &AuditResult) -> OffenderSummary {
    let mut offenders = OrderedMap::new();
    for (_, tool) in result.tools_results.iter() {
        for (category, entries) in tool.offenders.iter() {
            let mut entries = entries.clone();
            strip_byte_payloads(&mut entries);
            offenders.insert(category, entries);
        }
    }

    OffenderSummary {
        url: result.url().to_string(),
        name: result.label().to_string(),
        offenders,
    }
}

/// 汇总整个批次
pub fn summarize_batch(results: &[AuditResult]) -> Vec<OffenderSummary> {
    results.iter().map(summarize).collect()
}

/// 递归删除字节负载字段，其他字段保持不变
pub fn strip_byte_payloads(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            map.retain(|key, v| !(BYTE_PAYLOAD_KEYS.contains(&key.as_str()) || is_byte_buffer(v)));
            for v in map.values_mut() {
                strip_byte_payloads(v);
            }
        }
        JsonValue::Array(items) => {
            for item in items.iter_mut() {
                strip_byte_payloads(item);
            }
        }
        _ => {}
    }
}

/// 序列化后的字节缓冲区形如 `{"type": "Buffer", "data": [...]}`
fn is_byte_buffer(value: &JsonValue) -> bool {
    value.get("type").and_then(JsonValue::as_str) == Some("Buffer")
        && value.get("data").is_some_and(JsonValue::is_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditOptions, ToolOutput};
    use serde_json::json;

    #[test]
    fn test_byte_buffer_removed_other_fields_intact() {
        let entry = json!({
            "url": "https://a.com/big.js",
            "weightCheck": {
                "bodySize": 120000,
                "bodyBuffer": {"type": "Buffer", "data": [1, 2, 3]},
                "isOptimized": false
            },
            "body": {"type": "Buffer", "data": [4, 5]}
        });
        let tool = ToolOutput::default().with_offenders("fileMinification", json!([entry]));
        let result = AuditResult::new("https://a.com", AuditOptions::default())
            .with_tool("redownload", tool);

        let summary = summarize(&result);
        let archived = &summary.offenders.get("fileMinification").unwrap()[0];
        assert_eq!(
            archived,
            &json!({
                "url": "https://a.com/big.js",
                "weightCheck": {"bodySize": 120000, "isOptimized": false}
            })
        );
    }

    #[test]
    fn test_later_tool_wins_per_category() {
        let result = AuditResult::new("https://a.com", AuditOptions::default())
            .with_tool(
                "phantomas",
                ToolOutput::default()
                    .with_offenders("DOMelementsCount", json!({"count": 1}))
                    .with_offenders("jsErrors", json!(["x is undefined"])),
            )
            .with_tool(
                "domAnalysis",
                ToolOutput::default().with_offenders("DOMelementsCount", json!({"count": 2})),
            );

        let summary = summarize(&result);
        assert_eq!(summary.offenders.len(), 2);
        assert_eq!(summary.offenders.get("DOMelementsCount"), Some(&json!({"count": 2})));
        assert_eq!(summary.offenders.get("jsErrors"), Some(&json!(["x is undefined"])));
    }

    #[test]
    fn test_summary_serializes_url_name_offenders() {
        let mut result = AuditResult::new("https://a.com", AuditOptions::default());
        result.params.name = Some("home".to_string());
        let value = serde_json::to_value(summarize_batch(&[result])).unwrap();
        assert_eq!(value, json!([{"url": "https://a.com", "name": "home", "offenders": {}}]));
    }

    #[test]
    fn test_source_result_not_mutated() {
        let tool = ToolOutput::default()
            .with_offenders("big", json!([{"bodyBuffer": {"type": "Buffer", "data": []}}]));
        let result = AuditResult::new("https://a.com", AuditOptions::default()).with_tool("t", tool);
        let _ = summarize(&result);
        let untouched = result.tools_results.get("t").unwrap().offenders.get("big").unwrap();
        assert!(untouched[0].get("bodyBuffer").is_some());
    }
}
