use crate::error::{AppError, AppResult, FileError};
use crate::models::request::AuditRequest;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// TOML 批量文件：每个 `[[audit]]` 表是一个请求
#[derive(Debug, Deserialize)]
struct TomlBatch {
    #[serde(default)]
    audit: Vec<AuditRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchFormat {
    Yaml,
    Toml,
}

fn detect_format(input: &str) -> Option<BatchFormat> {
    let lower = input.to_lowercase();
    if lower.ends_with(".yml") || lower.ends_with(".yaml") {
        Some(BatchFormat::Yaml)
    } else if lower.ends_with(".toml") {
        Some(BatchFormat::Toml)
    } else {
        None
    }
}

/// 输入是否为批量文件（按扩展名判断）
pub fn is_batch_file(input: &str) -> bool {
    detect_format(input).is_some()
}

/// 从 YAML / TOML 批量文件加载审计请求
///
/// 条目中为 `null` 的选项视为未设置，不会覆盖全局选项。
pub async fn load_batch_file(path: &Path) -> AppResult<Vec<AuditRequest>> {
    let path_str = path.display().to_string();
    let format = detect_format(&path_str).ok_or_else(|| {
        AppError::File(FileError::UnsupportedFormat {
            path: path_str.clone(),
        })
    })?;

    if !path.exists() {
        return Err(AppError::File(FileError::NotFound { path: path_str }));
    }

    let content = fs::read_to_string(path).await.map_err(|e| {
        AppError::File(FileError::ReadFailed {
            path: path_str.clone(),
            source: Box::new(e),
        })
    })?;

    let mut requests = match format {
        BatchFormat::Yaml => serde_yaml::from_str::<Vec<AuditRequest>>(&content)
            .map_err(|e| AppError::file_parse_failed(&path_str, e))?,
        BatchFormat::Toml => {
            toml::from_str::<TomlBatch>(&content)
                .map_err(|e| AppError::file_parse_failed(&path_str, e))?
                .audit
        }
    };

    for request in requests.iter_mut() {
        request.options.validate()?;
    }

    tracing::info!("从 {} 加载了 {} 个 URL", path_str, requests.len());
    Ok(requests)
}

/// 将命令行输入转换为请求列表：批量文件展开，其余视为单个 URL
pub async fn requests_from_input(input: &str) -> AppResult<Vec<AuditRequest>> {
    if is_batch_file(input) {
        load_batch_file(Path::new(input)).await
    } else {
        Ok(vec![AuditRequest::new(input)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_yaml_batch_keeps_order_and_drops_nulls() {
        let file = write_temp(
            ".yml",
            r#"
- url: https://a.com
  name: home
  device: desktop
  proxy: ~
- url: https://b.com
  noExternals: true
"#,
        );

        let requests = load_batch_file(file.path()).await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://a.com");
        assert_eq!(requests[0].name.as_deref(), Some("home"));
        assert_eq!(requests[0].options.device.as_deref(), Some("desktop"));
        assert_eq!(requests[0].options.proxy, None);
        assert_eq!(requests[1].url, "https://b.com");
        assert_eq!(requests[1].options.no_externals, Some(true));
        assert_eq!(requests[1].options.device, None);
    }

    #[tokio::test]
    async fn test_load_toml_batch() {
        let file = write_temp(
            ".toml",
            r##"
[[audit]]
url = "https://a.com"
name = "home"

[[audit]]
url = "https://b.com"
waitForSelector = "#main"
"##,
        );

        let requests = load_batch_file(file.path()).await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].options.wait_for_selector.as_deref(), Some("#main"));
    }

    #[tokio::test]
    async fn test_invalid_screenshot_in_entry_is_rejected() {
        let file = write_temp(".yaml", "- url: https://a.com\n  screenshot: shot.jpg\n");
        let err = load_batch_file(file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_unknown_device_in_entry_is_rejected() {
        let file = write_temp(".yml", "- url: https://a.com\n  device: desktop\n- url: https://b.com\n  device: watch\n");
        let err = load_batch_file(file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("watch"));
    }

    #[tokio::test]
    async fn test_plain_url_becomes_single_request() {
        let requests = requests_from_input("https://example.com").await.unwrap();
        assert_eq!(requests, vec![AuditRequest::new("https://example.com")]);
    }

    #[tokio::test]
    async fn test_missing_batch_file() {
        let err = requests_from_input("/definitely/not/here.yml").await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }
}
