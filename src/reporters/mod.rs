//! 报告输出
//!
//! 三种报告器，每次运行只产出一种：
//! - **JSON**：整批结果，缩进 2 空格，打印到标准输出
//! - **XML**：去掉体积大的部分后渲染并清洗，打印到标准输出
//! - **InfluxDB**：每个结果一个数据点，批量写入，成功后可归档 offenders

pub mod influxdb;
pub mod json;
pub mod xml;

pub use influxdb::{report as report_influxdb, InfluxOutcome};
pub use json::generate as generate_json;
pub use xml::generate as generate_xml;

use crate::config::Config;
use crate::error::{AppResult, ConfigError};
use crate::infrastructure::InfluxClient;
use crate::models::AuditResult;
use crate::services::{ArchiveWriter, PointBuilder};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// 报告格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reporter {
    #[default]
    Json,
    Xml,
    InfluxDb,
}

impl FromStr for Reporter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Reporter::Json),
            "xml" => Ok(Reporter::Xml),
            "influxdb" => Ok(Reporter::InfluxDb),
            other => Err(ConfigError::InvalidParameter {
                name: "reporter".to_string(),
                reason: format!("未知的报告格式 \"{}\"，可选 json / xml / influxdb", other),
            }),
        }
    }
}

impl fmt::Display for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reporter::Json => "json",
            Reporter::Xml => "xml",
            Reporter::InfluxDb => "influxdb",
        };
        f.write_str(name)
    }
}

/// 按配置的报告器输出整批结果
///
/// JSON / XML 返回渲染好的文本，由调用方打印；InfluxDB 直接写入并返回 `None`。
pub async fn dispatch(batch: &[AuditResult], config: &Config) -> AppResult<Option<String>> {
    info!("📝 生成 {} 报告", config.reporter);
    match config.reporter {
        Reporter::Json => {
            let mut out = String::new();
            generate_json(batch, &mut out)?;
            Ok(Some(out))
        }
        Reporter::Xml => {
            let mut out = String::new();
            generate_xml(batch, &mut out)?;
            Ok(Some(out))
        }
        Reporter::InfluxDb => {
            let sink = Box::new(InfluxClient::new(config.influx_settings()?));
            let builder = PointBuilder::new().with_string_fields(config.string_fields.iter().cloned());
            let archive = config
                .archive
                .then(|| ArchiveWriter::with_path(config.archive_path.clone()));
            report_influxdb(batch, sink, &builder, archive.as_ref()).await;
            Ok(None)
        }
    }
}
