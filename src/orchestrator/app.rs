//! 应用主结构 - 编排层
//!
//! 持有配置和浏览器引擎，负责"加载请求 → 顺序审计 → 输出报告"的完整流程，
//! 以及浏览器的关闭。

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{requests_from_input, AuditRequest};
use crate::orchestrator::batch_runner::run_batch;
use crate::reporters;
use crate::services::{AnalysisEngine, BrowserEngine};
use crate::utils::logging::log_startup;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    requests: Vec<AuditRequest>,
    engine: BrowserEngine,
}

impl App {
    /// 初始化应用：先加载审计请求，成功后再启动或连接浏览器
    ///
    /// 输入有误时直接返回错误，不会留下浏览器进程。
    pub async fn initialize(config: Config, input: &str) -> Result<Self> {
        let requests = requests_from_input(input)
            .await
            .with_context(|| format!("无法加载审计请求: {}", input))?;

        let engine = BrowserEngine::start(config.browser_debug_port)
            .await
            .context("浏览器引擎初始化失败")?;
        Ok(Self {
            config,
            requests,
            engine,
        })
    }

    /// 运行应用主逻辑，返回需要打印到标准输出的报告
    ///
    /// 无论成功与否都会关闭浏览器。
    pub async fn run(self) -> Result<Option<String>> {
        let outcome = run_pipeline(&self.engine, &self.requests, &self.config).await;
        self.engine.shutdown().await;

        Ok(outcome?)
    }
}

/// 顺序审计所有请求并按配置输出报告
///
/// 任意 URL 失败时返回错误，不产生任何报告。
pub async fn run_pipeline<E>(engine: &E, requests: &[AuditRequest], config: &Config) -> AppResult<Option<String>>
where
    E: AnalysisEngine + ?Sized,
{
    if requests.is_empty() {
        warn!("⚠️ 没有需要审计的 URL");
    }
    log_startup(config, requests.len());

    let batch = run_batch(engine, requests, &config.options).await?;
    info!("✓ 审计完成，共 {} 个结果", batch.len());

    reporters::dispatch(&batch, config).await
}
