//! 批量运行器 - 编排层
//!
//! ## 职责
//!
//! 按顺序把每个请求交给分析引擎，结果按请求顺序收集。
//!
//! ## 规则
//!
//! - 一次只处理一个 URL，上一个完成后才开始下一个
//! - 请求级选项覆盖全局选项
//! - 任何一个 URL 失败，整批立即失败，不重试、不跳过，也不输出部分结果
//! - 本层不设超时

use crate::error::BatchError;
use crate::models::{AuditOptions, AuditRequest, ResultBatch};
use crate::services::AnalysisEngine;
use crate::utils::logging::{log_audit_start, print_final_stats};
use tracing::{error, info};

/// 顺序运行整批审计
pub async fn run_batch<E>(
    engine: &E,
    requests: &[AuditRequest],
    globals: &AuditOptions,
) -> Result<ResultBatch, BatchError>
where
    E: AnalysisEngine + ?Sized,
{
    let total = requests.len();
    let mut results = ResultBatch::with_capacity(total);

    for (idx, request) in requests.iter().enumerate() {
        let index = idx + 1;
        log_audit_start(index, total, &request.url);

        let options = globals.merged_with(&request.options);
        let mut result = match engine.analyze(&request.url, &options).await {
            Ok(result) => result,
            Err(source) => {
                error!("[{}/{}] ❌ 审计失败，整批中止: {}", index, total, source);
                return Err(BatchError {
                    index,
                    url: request.url.clone(),
                    source,
                });
            }
        };

        if request.name.is_some() {
            result.params.name.clone_from(&request.name);
        }
        info!("[{}/{}] ✓ 完成: {}", index, total, request.url);
        results.push(result);
    }

    print_final_stats(results.len(), total);
    Ok(results)
}
