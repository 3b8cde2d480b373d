//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和资源生命周期，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_runner` - 批量运行器
//! - 按请求顺序逐个调用分析引擎
//! - 合并全局选项与请求级选项
//! - 任一 URL 失败即中止整批
//!
//! ### `app` - 应用主结构
//! - 持有配置和浏览器引擎
//! - 加载请求、运行批次、分发报告
//! - 结束时关闭浏览器
//!
//! ## 层次关系
//!
//! ```text
//! app (加载请求 / 管理浏览器)
//!     ↓
//! batch_runner (处理 Vec<AuditRequest>)
//!     ↓
//! services::AnalysisEngine (处理单个 URL)
//!     ↓
//! infrastructure (基础设施：JsExecutor / InfluxClient)
//! ```
//!
//! 报告在整批成功后由 `reporters` 统一输出。

pub mod app;
pub mod batch_runner;

// 重新导出主要类型
pub use app::{run_pipeline, App};
pub use batch_runner::run_batch;
