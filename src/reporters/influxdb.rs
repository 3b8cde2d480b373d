//! InfluxDB 报告
//!
//! 每个结果一个数据点，整批一次写入。写入成功后按需归档 offenders。
//! 所有失败都只记录日志，不会让进程崩溃。

use crate::error::SinkError;
use crate::infrastructure::TimeSeriesSink;
use crate::models::AuditResult;
use crate::services::{summarize_batch, ArchiveWriter, PointBuilder};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// 一次 InfluxDB 报告的结果
#[derive(Debug, Default)]
pub struct InfluxOutcome {
    /// 提交的数据点数
    pub points: usize,
    /// 被丢弃的字段总数
    pub dropped_fields: usize,
    /// 写入失败的原因（已记录日志）
    pub write_error: Option<SinkError>,
    /// 归档文件路径（未归档为 None）
    pub archived_to: Option<PathBuf>,
}

impl InfluxOutcome {
    pub fn succeeded(&self) -> bool {
        self.write_error.is_none()
    }
}

/// 构建数据点、批量写入、关闭连接，成功时归档
///
/// `sink` 在所有路径上都会被关闭且只关闭一次。
pub async fn report(
    batch: &[AuditResult],
    mut sink: Box<dyn TimeSeriesSink>,
    builder: &PointBuilder,
    archive: Option<&ArchiveWriter>,
) -> InfluxOutcome {
    let mut outcome = InfluxOutcome::default();

    let points: Vec<_> = batch
        .iter()
        .map(|result| {
            let built = builder.build(result, Utc::now());
            outcome.dropped_fields += built.dropped.len();
            built.point
        })
        .collect();
    outcome.points = points.len();

    sink.write_points(&points);
    info!("📤 提交 {} 个数据点到 InfluxDB", outcome.points);

    if let Err(e) = sink.close().await {
        if e.is_missing_destination() {
            if let SinkError::Unauthorized { bucket, .. } = &e {
                error!("❌ InfluxDB bucket \"{}\" 不存在，或 token 没有写入权限", bucket);
            }
        } else {
            error!("❌ 写入 InfluxDB 失败: {}", e);
        }
        warn!("⚠️ 写入失败，跳过归档");
        outcome.write_error = Some(e);
        return outcome;
    }
    info!("✓ InfluxDB 写入完成");

    if let Some(writer) = archive {
        let summaries = summarize_batch(batch);
        match writer.write(&summaries).await {
            Ok(()) => {
                info!("🗄️ offenders 已归档: {}", writer.path().display());
                outcome.archived_to = Some(writer.path().to_path_buf());
            }
            Err(e) => error!("❌ 归档失败: {}", e),
        }
    } else {
        debug!("未启用归档");
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditOptions, TimeSeriesPoint, ToolOutput};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        points: Vec<TimeSeriesPoint>,
        writes: usize,
        closes: usize,
    }

    struct RecordingSink {
        recorded: Arc<Mutex<Recorded>>,
        fail_with: Option<SinkError>,
    }

    #[async_trait]
    impl TimeSeriesSink for RecordingSink {
        fn write_points(&mut self, points: &[TimeSeriesPoint]) {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.writes += 1;
            recorded.points.extend_from_slice(points);
        }

        async fn close(self: Box<Self>) -> Result<(), SinkError> {
            self.recorded.lock().unwrap().closes += 1;
            match self.fail_with {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    fn sink(fail_with: Option<SinkError>) -> (Box<dyn TimeSeriesSink>, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let sink = RecordingSink {
            recorded: Arc::clone(&recorded),
            fail_with,
        };
        (Box::new(sink), recorded)
    }

    fn batch() -> Vec<AuditResult> {
        let tool = ToolOutput::default()
            .with_metric("requests", 12.0)
            .with_metric("notAvailable", f64::NAN)
            .with_offenders("bigRequests", json!([{"url": "x.js", "bodyBuffer": {"type": "Buffer", "data": [1]}}]));
        vec![
            AuditResult::new("https://a.com", AuditOptions::default()).with_tool("domAnalysis", tool),
            AuditResult::new("https://b.com", AuditOptions::default()),
        ]
    }

    #[tokio::test]
    async fn test_single_batched_write_then_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ArchiveWriter::with_path(dir.path().join("archive/offenders.json"));
        let (sink, recorded) = sink(None);

        let outcome = report(&batch(), sink, &PointBuilder::new(), Some(&archive)).await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.points, 2);
        assert_eq!(outcome.dropped_fields, 1);
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.writes, 1);
        assert_eq!(recorded.closes, 1);
        assert_eq!(recorded.points[0].tags.url, "https://a.com");
        assert_eq!(recorded.points[1].tags.url, "https://b.com");

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(archive.path()).unwrap()).unwrap();
        assert_eq!(written[0]["offenders"]["bigRequests"], json!([{"url": "x.js"}]));
        assert_eq!(outcome.archived_to.as_deref(), Some(archive.path()));
    }

    #[tokio::test]
    async fn test_failed_write_skips_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ArchiveWriter::with_path(dir.path().join("offenders.json"));
        let (sink, recorded) = sink(Some(SinkError::Unauthorized {
            bucket: "missing".to_string(),
            body: String::new(),
        }));

        let outcome = report(&batch(), sink, &PointBuilder::new(), Some(&archive)).await;

        assert!(!outcome.succeeded());
        assert!(outcome.write_error.as_ref().unwrap().is_missing_destination());
        assert_eq!(recorded.lock().unwrap().closes, 1);
        assert!(outcome.archived_to.is_none());
        assert!(!archive.path().exists());
    }

    #[tokio::test]
    async fn test_archive_disabled() {
        let (sink, recorded) = sink(None);
        let outcome = report(&batch(), sink, &PointBuilder::new(), None).await;
        assert!(outcome.succeeded());
        assert!(outcome.archived_to.is_none());
        assert_eq!(recorded.lock().unwrap().closes, 1);
    }
}
