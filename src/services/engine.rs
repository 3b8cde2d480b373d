//! 分析引擎 - 业务能力层
//!
//! `AnalysisEngine` 是批量运行器唯一依赖的引擎接口：给定 URL 和选项，
//! 返回一个 `AuditResult`。`BrowserEngine` 基于 chromiumoxide 实现，
//! 采集浏览器计时和 DOM 统计两个工具的数据。

use crate::browser;
use crate::error::EngineError;
use crate::infrastructure::JsExecutor;
use crate::models::{AuditOptions, AuditResult, OrderedMap, ToolOutput};
use async_trait::async_trait;
use chromiumoxide::Browser;
use serde_json::json;
use tracing::{debug, info};

/// 外部分析引擎
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn analyze(&self, url: &str, options: &AuditOptions) -> Result<AuditResult, EngineError>;
}

/// 在页面中执行的采集脚本，返回 `{toolName: {metrics, offenders}}`
const COLLECT_SCRIPT: &str = r#"
(() => {
    const BIG_REQUEST_BYTES = 100 * 1024;
    const nav = performance.getEntriesByType('navigation')[0] || {};
    const resources = performance.getEntriesByType('resource');
    const round = (v) => (typeof v === 'number' ? Math.round(v) : null);

    let maxDepth = 0;
    const walk = (node, depth) => {
        if (depth > maxDepth) maxDepth = depth;
        for (const child of node.children) walk(child, depth + 1);
    };
    if (document.documentElement) walk(document.documentElement, 1);

    const totalWeight = resources.reduce((sum, r) => sum + (r.transferSize || 0), 0);
    const bigRequests = resources
        .filter((r) => (r.transferSize || 0) > BIG_REQUEST_BYTES)
        .map((r) => ({ url: r.name, transferSize: r.transferSize, type: r.initiatorType }));

    return {
        browserTiming: {
            metrics: {
                timeToFirstByte: round(nav.responseStart),
                domInteractive: round(nav.domInteractive),
                domContentLoaded: round(nav.domContentLoadedEventEnd),
                domComplete: round(nav.domComplete),
                loadEventEnd: round(nav.loadEventEnd),
                mainDomainHttpProtocol: nav.nextHopProtocol || null,
            },
            offenders: {},
        },
        domAnalysis: {
            metrics: {
                DOMelementsCount: document.getElementsByTagName('*').length,
                DOMelementMaxDepth: maxDepth,
                requests: resources.length + 1,
                totalWeight: totalWeight,
                iframesCount: document.getElementsByTagName('iframe').length,
                imageCount: document.images.length,
                scriptCount: document.scripts.length,
            },
            offenders: { bigRequests: bigRequests },
        },
    };
})()
"#;

/// 设备类型对应的 User-Agent
pub fn user_agent_for(device: &str) -> Option<&'static str> {
    match device {
        "phone" | "mobile" => Some(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
        ),
        "tablet" => Some(
            "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
        ),
        "desktop" | "desktop-hd" => Some(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        ),
        _ => None,
    }
}

/// 解析 "key=value;key2=value2" 形式的存储注入参数，忽略 domain 键
pub fn parse_storage_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key == "domain" {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn storage_script(storage: &str, raw: &str) -> Option<String> {
    let pairs = parse_storage_pairs(raw);
    if pairs.is_empty() {
        return None;
    }
    let statements: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("window.{}.setItem({}, {});", storage, json!(k), json!(v)))
        .collect();
    Some(format!("(() => {{ {} return true; }})()", statements.join(" ")))
}

/// 基于 chromiumoxide 的分析引擎
///
/// 持有唯一的 Browser，每个 URL 使用一个新页面，结束后关闭页面。
pub struct BrowserEngine {
    browser: Browser,
}

impl BrowserEngine {
    /// 有调试端口时连接现有浏览器，否则启动无头浏览器
    pub async fn start(debug_port: Option<u16>) -> Result<Self, EngineError> {
        let browser = match debug_port {
            Some(port) => browser::connect_to_browser(port).await?,
            None => browser::launch_headless_browser().await?,
        };
        Ok(Self { browser })
    }

    /// 关闭浏览器
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("关闭浏览器失败: {}", e);
        }
    }

    async fn audit_page(
        &self,
        executor: &JsExecutor,
        options: &AuditOptions,
    ) -> Result<OrderedMap<ToolOutput>, EngineError> {
        if let Some(user_agent) = user_agent_for(options.effective_device()) {
            executor.set_user_agent(user_agent).await?;
        }
        if let Some(cookie) = &options.cookie {
            executor.set_extra_headers(json!({ "Cookie": cookie })).await?;
        }
        log_unsupported_options(options);

        executor.navigate().await?;

        let mut injected = false;
        for (storage, raw) in [
            ("localStorage", &options.local_storage),
            ("sessionStorage", &options.session_storage),
        ] {
            if let Some(script) = raw.as_deref().and_then(|r| storage_script(storage, r)) {
                executor.eval(script).await?;
                injected = true;
            }
        }
        if injected {
            // 存储注入后重新加载，让页面脚本读到注入的值
            executor.reload().await?;
        }

        if let Some(selector) = &options.wait_for_selector {
            executor.wait_for_selector(selector).await?;
        }

        let tools: OrderedMap<ToolOutput> = executor.eval_as(COLLECT_SCRIPT).await?;

        if let Some(path) = &options.screenshot {
            executor.save_screenshot(path).await?;
            info!("📸 截图已保存: {}", path);
        }

        Ok(tools)
    }
}

#[async_trait]
impl AnalysisEngine for BrowserEngine {
    async fn analyze(&self, url: &str, options: &AuditOptions) -> Result<AuditResult, EngineError> {
        let page = self.browser.new_page("about:blank").await?;
        let executor = JsExecutor::new(page, url);

        let outcome = self.audit_page(&executor, options).await;
        executor.close().await;

        let mut result = AuditResult::new(url, options.clone());
        result.tools_results = outcome?;
        Ok(result)
    }
}

fn log_unsupported_options(options: &AuditOptions) {
    let unsupported = [
        ("proxy", options.proxy.is_some()),
        ("authUser", options.auth_user.is_some()),
        ("authPass", options.auth_pass.is_some()),
        ("blockDomain", options.block_domain.is_some()),
        ("allowDomain", options.allow_domain.is_some()),
        ("noExternals", options.no_externals == Some(true)),
    ];
    for (name, set) in unsupported {
        if set {
            debug!("浏览器引擎不支持选项 {}，已忽略", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agents() {
        assert!(user_agent_for("mobile").unwrap().contains("iPhone"));
        assert_eq!(user_agent_for("phone"), user_agent_for("mobile"));
        assert!(user_agent_for("tablet").unwrap().contains("iPad"));
        assert_eq!(user_agent_for("desktop-hd"), user_agent_for("desktop"));
        assert_eq!(user_agent_for("watch"), None);
    }

    #[test]
    fn test_parse_storage_pairs_skips_domain() {
        assert_eq!(
            parse_storage_pairs("bar=foo; theme = dark ;domain=url;broken"),
            vec![
                ("bar".to_string(), "foo".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ]
        );
    }

    #[test]
    fn test_storage_script_escapes_values() {
        let script = storage_script("localStorage", "k=it's \"quoted\"").unwrap();
        assert!(script.contains(r#"window.localStorage.setItem("k", "it's \"quoted\"");"#));
        assert!(storage_script("sessionStorage", "domain=x").is_none());
    }

    #[tokio::test]
    #[ignore] // 需要本机安装 Chrome/Chromium：cargo test -- --ignored
    async fn test_browser_engine_audits_page() {
        let _ = tracing_subscriber::fmt::try_init();

        let engine = BrowserEngine::start(None).await.expect("启动浏览器失败");
        let result = engine
            .analyze("https://example.com", &AuditOptions::default())
            .await
            .expect("分析失败");
        engine.shutdown().await;

        assert!(result.tools_results.contains_key("browserTiming"));
        assert!(result.tools_results.contains_key("domAnalysis"));
    }
}
