//! 归档写入服务 - 业务能力层
//!
//! 只负责"把 offenders 汇总写成一个 JSON 文件"，不关心流程

use crate::error::{AppError, AppResult};
use crate::services::offender_summarizer::OffenderSummary;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 默认归档路径（相对于当前工作目录）
pub const DEFAULT_ARCHIVE_PATH: &str = "ylt-archive/offenders.json";

/// 归档写入服务
///
/// 职责：
/// - 将整个批次的 offenders 汇总写入单个 JSON 数组文件
/// - 所在目录不存在时自动创建
pub struct ArchiveWriter {
    archive_path: PathBuf,
}

impl ArchiveWriter {
    /// 使用默认路径创建
    pub fn new() -> Self {
        Self {
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.archive_path
    }

    /// 写入归档文件（覆盖已有内容）
    pub async fn write(&self, summaries: &[OffenderSummary]) -> AppResult<()> {
        let path_str = self.archive_path.display().to_string();
        debug!("写入归档: {} | 条目数: {}", path_str, summaries.len());

        if let Some(parent) = self.archive_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::file_write_failed(&path_str, e))?;
            }
        }

        let content = serde_json::to_string_pretty(summaries)?;
        fs::write(&self.archive_path, content)
            .await
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;

        Ok(())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}
