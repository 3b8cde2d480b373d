//! 数据点构建 - 业务能力层
//!
//! 把一个 URL 的拍平指标转换成时序数据点。每个指标恰好产生一个字段，
//! 或者记录一次丢弃（并写日志），不会同时发生，也不会报错。

use crate::models::{AuditResult, FieldValue, MetricValue, PointTags, TimeSeriesPoint};
use crate::services::metric_extractor::flatten_metrics;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// 默认强制按字符串写入的指标（值形如版本号、协议名，可能被误判为其他类型）
pub static DEFAULT_STRING_FIELDS: phf::Set<&'static str> = phf::phf_set! {
    "jQueryVersion",
    "mainDomainHttpProtocol",
    "mainDomainTlsProtocol",
    "statusCodesTrail",
};

/// 字段被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// NaN 无法写入时序数据库
    NotANumber,
    /// 正负无穷同样无法写入
    NonFinite,
    Null,
    Unexpected(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub name: String,
    pub reason: DropReason,
}

/// 构建结果：数据点 + 被丢弃的字段
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPoint {
    pub point: TimeSeriesPoint,
    pub dropped: Vec<DroppedField>,
}

/// 数据点构建器
///
/// 持有强制字符串字段集合，由调用方显式创建，不使用全局状态。
#[derive(Debug, Clone, Default)]
pub struct PointBuilder {
    extra_string_fields: HashSet<String>,
}

impl PointBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加强制按字符串写入的字段
    pub fn with_string_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_string_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn is_forced_string(&self, name: &str) -> bool {
        DEFAULT_STRING_FIELDS.contains(name) || self.extra_string_fields.contains(name)
    }

    /// 为单个结果构建数据点
    pub fn build(&self, result: &AuditResult, timestamp: DateTime<Utc>) -> BuiltPoint {
        let tags = PointTags {
            url: result.url().to_string(),
            device: result.device().to_string(),
            name: result.label().to_string(),
        };
        let mut point = TimeSeriesPoint::new(tags, timestamp);
        let mut dropped = Vec::new();

        for (name, value) in flatten_metrics(result) {
            match self.coerce(&name, value) {
                Ok(field) => {
                    point.fields.insert(name, field);
                }
                Err(reason) => {
                    debug!("{} 字段被丢弃: {:?}", name, reason);
                    dropped.push(DroppedField { name, reason });
                }
            }
        }

        BuiltPoint { point, dropped }
    }

    fn coerce(&self, name: &str, value: MetricValue) -> Result<FieldValue, DropReason> {
        if self.is_forced_string(name) {
            return match value {
                MetricValue::Number(n) => Ok(FieldValue::String(n.to_string())),
                MetricValue::String(s) => Ok(FieldValue::String(s)),
                MetricValue::Boolean(b) => Ok(FieldValue::String(b.to_string())),
                MetricValue::Null => Err(DropReason::Null),
                other => Err(DropReason::Unexpected(other.kind())),
            };
        }

        match value {
            MetricValue::Number(n) if n.is_nan() => Err(DropReason::NotANumber),
            MetricValue::Number(n) if n.is_infinite() => Err(DropReason::NonFinite),
            MetricValue::Number(n) => Ok(FieldValue::Float(n)),
            MetricValue::String(s) => Ok(FieldValue::String(s)),
            MetricValue::Boolean(b) => Ok(FieldValue::Boolean(b)),
            MetricValue::Null => Err(DropReason::Null),
            other => Err(DropReason::Unexpected(other.kind())),
        }
    }
}
