//! 指标提取 - 业务能力层
//!
//! 把 `toolsResults` 中各工具的 `metrics` 拍平成一个映射。

use crate::models::{AuditResult, MetricValue, OrderedMap};

/// 按工具顺序浅合并所有指标
///
/// 同名指标由后出现的工具覆盖先出现的工具，这是约定行为。
pub fn flatten_metrics(result: &AuditResult) -> OrderedMap<MetricValue> {
    let mut all_metrics = OrderedMap::new();
    for (_, tool) in result.tools_results.iter() {
        all_metrics.extend_from(&tool.metrics);
    }
    all_metrics
}
