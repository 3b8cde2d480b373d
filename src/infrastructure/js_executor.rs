//! JS 执行器 - 基础设施层
//!
//! 持有单个审计页面，只暴露"导航 / 执行 JS / 截图"的能力

use crate::error::EngineError;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 等待选择器出现的轮询次数与间隔
const SELECTOR_POLL_ATTEMPTS: usize = 60;
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// JS 执行器
///
/// 职责：
/// - 持有一个 Page 资源，审计结束后关闭
/// - 暴露 eval() 能力
/// - 不认识 AuditResult / 报告格式
pub struct JsExecutor {
    page: Page,
    url: String,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, url: impl Into<String>) -> Self {
        Self {
            page,
            url: url.into(),
        }
    }

    /// 设置 User-Agent
    pub async fn set_user_agent(&self, user_agent: &str) -> Result<(), EngineError> {
        self.page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| EngineError::script_failed(&self.url, e))?;
        Ok(())
    }

    /// 为后续所有请求附加额外的请求头
    pub async fn set_extra_headers(&self, headers: JsonValue) -> Result<(), EngineError> {
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
            .await
            .map_err(|e| EngineError::script_failed(&self.url, e))?;
        Ok(())
    }

    /// 导航到目标 URL 并等待加载完成
    pub async fn navigate(&self) -> Result<(), EngineError> {
        self.page
            .goto(self.url.as_str())
            .await
            .map_err(|e| EngineError::navigation_failed(&self.url, e))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| EngineError::navigation_failed(&self.url, e))?;
        Ok(())
    }

    /// 重新加载当前页面
    pub async fn reload(&self) -> Result<(), EngineError> {
        self.page
            .reload()
            .await
            .map_err(|e| EngineError::navigation_failed(&self.url, e))?;
        Ok(())
    }

    /// 等待 CSS 选择器匹配到元素
    pub async fn wait_for_selector(&self, selector: &str) -> Result<(), EngineError> {
        for attempt in 1..=SELECTOR_POLL_ATTEMPTS {
            if self.page.find_element(selector).await.is_ok() {
                debug!("选择器 {} 在第 {} 次检查时出现", selector, attempt);
                return Ok(());
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
        Err(EngineError::SelectorTimeout {
            url: self.url.clone(),
            selector: selector.to_string(),
        })
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, EngineError> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| EngineError::script_failed(&self.url, e))?;
        result
            .into_value()
            .map_err(|e| EngineError::script_failed(&self.url, e))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T, EngineError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| EngineError::MalformedResult {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }

    /// 整页截图并保存到指定路径
    pub async fn save_screenshot(&self, path: &str) -> Result<(), EngineError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| EngineError::script_failed(&self.url, e))?;
        Ok(())
    }

    /// 关闭页面，释放资源
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("关闭页面失败 ({}): {}", self.url, e);
        }
    }
}
