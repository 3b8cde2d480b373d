//! InfluxDB 写入客户端 - 基础设施层
//!
//! "先写入，再关闭"：`write_points` 只缓冲，`close` 才真正发送请求。
//! 写入失败只能通过 `close` 的返回值观察到。

use crate::error::SinkError;
use crate::models::TimeSeriesPoint;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};

/// InfluxDB 连接参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxSettings {
    pub hostname: String,
    pub port: u16,
    pub org: String,
    pub token: String,
    pub bucket: String,
}

impl InfluxSettings {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }
}

/// 时序数据写入目标
#[async_trait]
pub trait TimeSeriesSink: Send {
    /// 缓冲数据点
    fn write_points(&mut self, points: &[TimeSeriesPoint]);

    /// 发送缓冲的数据并关闭连接，每个实例只调用一次
    async fn close(self: Box<Self>) -> Result<(), SinkError>;
}

/// InfluxDB v2 客户端
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    settings: InfluxSettings,
    lines: Vec<String>,
}

impl InfluxClient {
    pub fn new(settings: InfluxSettings) -> Self {
        Self::with_base_url(settings.base_url(), settings)
    }

    /// 指定完整的服务地址（测试或反向代理场景）
    pub fn with_base_url(base_url: impl Into<String>, settings: InfluxSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            settings,
            lines: Vec::new(),
        }
    }

    fn write_endpoint(&self) -> String {
        format!("{}/api/v2/write", self.base_url.trim_end_matches('/'))
    }

    /// 已缓冲的行数
    pub fn pending(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl TimeSeriesSink for InfluxClient {
    fn write_points(&mut self, points: &[TimeSeriesPoint]) {
        for point in points {
            match point.to_line_protocol() {
                Some(line) => self.lines.push(line),
                None => warn!("⚠️ {} 没有可写入的字段，跳过该数据点", point.tags.url),
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), SinkError> {
        if self.lines.is_empty() {
            debug!("没有需要写入 InfluxDB 的数据");
            return Ok(());
        }

        let endpoint = self.write_endpoint();
        debug!("写入 {} 行到 {}", self.lines.len(), endpoint);

        let response = self
            .http
            .post(&endpoint)
            .query(&[
                ("org", self.settings.org.as_str()),
                ("bucket", self.settings.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.settings.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(self.lines.join("\n"))
            .send()
            .await
            .map_err(|e| SinkError::Transport {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SinkError::Unauthorized {
                bucket: self.settings.bucket.clone(),
                body,
            });
        }

        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
