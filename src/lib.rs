//! # ylt-batch
//!
//! 批量审计网页质量，并把结果输出为 JSON / XML 报告或写入 InfluxDB
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page、HTTP 连接），只暴露能力
//! - `JsExecutor` - 单个审计页面的 owner，提供导航 / eval / 截图能力
//! - `InfluxClient` - 缓冲数据点，关闭时一次性写入 InfluxDB
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个结果
//! - `BrowserEngine` - 审计单个 URL
//! - `flatten_metrics` / `PointBuilder` - 指标拍平与类型转换
//! - `summarize` / `ArchiveWriter` - offenders 汇总与归档
//!
//! ### ③ 报告层（Reporters）
//! - `reporters/` - JSON / XML / InfluxDB 三种输出
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 顺序审计，保持请求顺序
//! - `orchestrator/app` - 管理配置、浏览器和报告分发
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod reporters;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AuditOptions, AuditRequest, AuditResult, ResultBatch};
pub use orchestrator::{run_batch, run_pipeline, App};
pub use reporters::Reporter;
pub use services::{AnalysisEngine, BrowserEngine};
