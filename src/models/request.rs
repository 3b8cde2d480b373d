//! 审计请求与选项

use crate::error::{AppError, AppResult, FileError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 未指定设备时使用的设备类型
pub const DEFAULT_DEVICE: &str = "mobile";

/// 支持的设备类型
pub const KNOWN_DEVICES: &[&str] = &["phone", "mobile", "tablet", "desktop", "desktop-hd"];

/// 单次审计的选项
///
/// 所有可选字段序列化时都会输出（未设置为 `null`），下游可以依赖键一定存在。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditOptions {
    /// 模拟设备：phone / mobile / tablet / desktop / desktop-hd
    pub device: Option<String>,
    /// 截图输出路径（必须以 .png 结尾）
    pub screenshot: Option<String>,
    /// 页面加载后等待匹配的 CSS 选择器
    pub wait_for_selector: Option<String>,
    /// HTTP 代理 "host:port"
    pub proxy: Option<String>,
    /// 主域名上附加的 cookie
    pub cookie: Option<String>,
    pub auth_user: Option<String>,
    pub auth_pass: Option<String>,
    /// 禁止请求的域名（逗号分隔）
    pub block_domain: Option<String>,
    /// 只允许请求的域名（逗号分隔）
    pub allow_domain: Option<String>,
    /// 屏蔽主域名以外的所有域名
    pub no_externals: Option<bool>,
    /// 注入的 localStorage，例如 "bar=foo;domain=url"
    pub local_storage: Option<String>,
    /// 注入的 sessionStorage
    pub session_storage: Option<String>,
}

impl AuditOptions {
    /// 以 `self` 为全局默认值，叠加请求级覆盖项（请求级优先）
    pub fn merged_with(&self, overrides: &AuditOptions) -> AuditOptions {
        AuditOptions {
            device: overrides.device.clone().or_else(|| self.device.clone()),
            screenshot: overrides.screenshot.clone().or_else(|| self.screenshot.clone()),
            wait_for_selector: overrides
                .wait_for_selector
                .clone()
                .or_else(|| self.wait_for_selector.clone()),
            proxy: overrides.proxy.clone().or_else(|| self.proxy.clone()),
            cookie: overrides.cookie.clone().or_else(|| self.cookie.clone()),
            auth_user: overrides.auth_user.clone().or_else(|| self.auth_user.clone()),
            auth_pass: overrides.auth_pass.clone().or_else(|| self.auth_pass.clone()),
            block_domain: overrides
                .block_domain
                .clone()
                .or_else(|| self.block_domain.clone()),
            allow_domain: overrides
                .allow_domain
                .clone()
                .or_else(|| self.allow_domain.clone()),
            no_externals: overrides.no_externals.or(self.no_externals),
            local_storage: overrides
                .local_storage
                .clone()
                .or_else(|| self.local_storage.clone()),
            session_storage: overrides
                .session_storage
                .clone()
                .or_else(|| self.session_storage.clone()),
        }
    }

    /// 实际生效的设备类型
    pub fn effective_device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// 校验设备类型，并规范化截图路径
    ///
    /// 全局选项和批量文件中的每个条目都要经过这里。
    pub fn validate(&mut self) -> AppResult<()> {
        if let Some(device) = &self.device {
            if !KNOWN_DEVICES.contains(&device.as_str()) {
                return Err(AppError::invalid_parameter(
                    "device",
                    format!("未知设备 \"{}\"，可选 {}", device, KNOWN_DEVICES.join(" / ")),
                ));
            }
        }
        self.normalize_screenshot()
    }

    /// 校验并规范化截图路径
    pub fn normalize_screenshot(&mut self) -> AppResult<()> {
        if let Some(path) = self.screenshot.take() {
            self.screenshot = Some(resolve_screenshot_path(&path)?);
        }
        Ok(())
    }
}

/// 截图路径必须以 ".png" 结尾；相对路径基于当前工作目录
pub fn resolve_screenshot_path(path: &str) -> AppResult<String> {
    if !path.to_lowercase().ends_with(".png") {
        return Err(AppError::invalid_parameter(
            "screenshot",
            "截图路径必须以 \".png\" 结尾",
        ));
    }

    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Ok(path.to_string());
    }

    let cwd = std::env::current_dir()
        .map_err(|source| AppError::File(FileError::WorkingDirUnavailable { source }))?;
    Ok(cwd.join(candidate).to_string_lossy().to_string())
}

/// 一个待审计的 URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRequest {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    /// 请求级覆盖项，运行时叠加到全局选项之上
    #[serde(flatten)]
    pub options: AuditOptions,
}

impl AuditRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            options: AuditOptions::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }
}
