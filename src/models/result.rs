//! 分析引擎返回的结果结构
//!
//! 除 `toolsResults` 外，引擎结果对本系统是不透明的：未知字段通过 `extra`
//! 原样保留，JSON 报告可以完整输出。

use super::ordered_map::OrderedMap;
use super::request::AuditOptions;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// 单个指标值
///
/// 每个值只在反序列化时判定一次类型，后续按枚举匹配处理。
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    /// 数组、对象等不应出现在指标里的形状
    Unexpected(JsonValue),
}

impl MetricValue {
    /// 类型名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            MetricValue::Number(_) => "number",
            MetricValue::String(_) => "string",
            MetricValue::Boolean(_) => "boolean",
            MetricValue::Null => "null",
            MetricValue::Unexpected(JsonValue::Array(_)) => "array",
            MetricValue::Unexpected(JsonValue::Object(_)) => "object",
            MetricValue::Unexpected(_) => "unknown",
        }
    }
}

impl From<JsonValue> for MetricValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => MetricValue::Null,
            JsonValue::Bool(b) => MetricValue::Boolean(b),
            JsonValue::String(s) => MetricValue::String(s),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => MetricValue::Number(f),
                None => MetricValue::Unexpected(JsonValue::Number(n)),
            },
            other => MetricValue::Unexpected(other),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::String(value.to_string())
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Boolean(value)
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // 整数值按整数输出，避免 JSON 报告里出现 "12.0"
            MetricValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            MetricValue::Number(n) => serializer.serialize_f64(*n),
            MetricValue::String(s) => serializer.serialize_str(s),
            MetricValue::Boolean(b) => serializer.serialize_bool(*b),
            MetricValue::Null => serializer.serialize_unit(),
            MetricValue::Unexpected(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(MetricValue::from)
    }
}

/// 单个工具的输出
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolOutput {
    #[serde(default)]
    pub metrics: OrderedMap<MetricValue>,
    #[serde(default)]
    pub offenders: OrderedMap<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ToolOutput {
    pub fn with_metric(mut self, name: &str, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(name, value.into());
        self
    }

    pub fn with_offenders(mut self, category: &str, entries: JsonValue) -> Self {
        self.offenders.insert(category, entries);
        self
    }
}

/// 请求参数回显
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AuditParams {
    pub url: String,
    /// 批量文件中的标签，由批量运行器写入
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: AuditOptions,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// 单个 URL 的分析结果
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AuditResult {
    pub params: AuditParams,
    #[serde(rename = "toolsResults", default)]
    pub tools_results: OrderedMap<ToolOutput>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AuditResult {
    pub fn new(url: impl Into<String>, options: AuditOptions) -> Self {
        Self {
            params: AuditParams {
                url: url.into(),
                name: None,
                options,
                extra: Map::new(),
            },
            tools_results: OrderedMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_tool(mut self, name: &str, output: ToolOutput) -> Self {
        self.tools_results.insert(name, output);
        self
    }

    pub fn url(&self) -> &str {
        &self.params.url
    }

    /// 标签名，未设置时为空字符串
    pub fn label(&self) -> &str {
        self.params.name.as_deref().unwrap_or("")
    }

    pub fn device(&self) -> &str {
        self.params.options.effective_device()
    }
}

/// 按请求顺序排列的结果集
pub type ResultBatch = Vec<AuditResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_value_classified_once() {
        assert_eq!(MetricValue::from(json!(3)), MetricValue::Number(3.0));
        assert_eq!(MetricValue::from(json!("h2")), MetricValue::String("h2".into()));
        assert_eq!(MetricValue::from(json!(false)), MetricValue::Boolean(false));
        assert_eq!(MetricValue::from(json!(null)), MetricValue::Null);
        assert_eq!(MetricValue::from(json!([1, 2])).kind(), "array");
        assert_eq!(MetricValue::from(json!({"a": 1})).kind(), "object");
    }

    #[test]
    fn test_integer_metrics_keep_integer_form() {
        let tool = ToolOutput::default()
            .with_metric("requests", 12.0)
            .with_metric("ratio", 0.5);
        let text = serde_json::to_string(&tool.metrics).unwrap();
        assert_eq!(text, r#"{"requests":12,"ratio":0.5}"#);
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let raw = json!({
            "params": {"url": "http://a.com", "options": {"device": "desktop"}},
            "toolsResults": {
                "phantomas": {"metrics": {"requests": 3}, "offenders": {}}
            },
            "scoreProfiles": {"generic": {"globalScore": 80}},
            "javascriptExecutionTree": {"children": []}
        });

        let result: AuditResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.device(), "desktop");
        assert_eq!(result.label(), "");
        assert!(result.extra.contains_key("scoreProfiles"));
        assert!(result.extra.contains_key("javascriptExecutionTree"));

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["scoreProfiles"]["generic"]["globalScore"], 80);
        assert_eq!(back["toolsResults"]["phantomas"]["metrics"]["requests"], 3);
    }
}
