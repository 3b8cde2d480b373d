//! 时序数据点

use super::ordered_map::OrderedMap;
use chrono::{DateTime, Utc};

/// 写入 InfluxDB 的 measurement 名称
pub const MEASUREMENT: &str = "YellowLabTools";

/// 字段值，只包含时序数据库能表示的类型
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    String(String),
    Boolean(bool),
}

/// 固定的三个标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTags {
    pub url: String,
    pub device: String,
    /// 批量文件中的标签，可以为空
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub measurement: &'static str,
    pub tags: PointTags,
    pub fields: OrderedMap<FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl TimeSeriesPoint {
    pub fn new(tags: PointTags, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: MEASUREMENT,
            tags,
            fields: OrderedMap::new(),
            timestamp,
        }
    }

    /// 编码为 line protocol；没有字段的点无法写入，返回 None
    ///
    /// 空标签值在 line protocol 中不合法，直接省略。
    pub fn to_line_protocol(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }

        let mut line = escape_measurement(self.measurement);
        for (key, value) in [
            ("url", &self.tags.url),
            ("device", &self.tags.device),
            ("name", &self.tags.name),
        ] {
            if value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(key);
            line.push('=');
            line.push_str(&escape_key(value));
        }

        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| format!("{}={}", escape_key(name), encode_field(value)))
            .collect();
        line.push(' ');
        line.push_str(&fields.join(","));

        if let Some(nanos) = self.timestamp.timestamp_nanos_opt() {
            line.push(' ');
            line.push_str(&nanos.to_string());
        }

        Some(line)
    }
}

fn encode_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

/// 标签键、标签值和字段键的转义
fn escape_key(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
