use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::InfluxSettings;
use crate::models::AuditOptions;
pub use crate::models::request::KNOWN_DEVICES;
use crate::reporters::Reporter;
use crate::services::DEFAULT_ARCHIVE_PATH;
use std::path::PathBuf;
use std::str::FromStr;

/// 程序配置
///
/// 先从环境变量加载，再由命令行参数覆盖，最后调用 `validate()`。
#[derive(Clone, Debug)]
pub struct Config {
    /// 报告格式
    pub reporter: Reporter,
    /// 全局审计选项，批量文件中的请求级选项会覆盖它
    pub options: AuditOptions,
    /// 浏览器调试端口，未设置时启动无头浏览器
    pub browser_debug_port: Option<u16>,
    // --- InfluxDB 配置 ---
    pub influxdb_hostname: String,
    pub influxdb_port: u16,
    pub influxdb_org: Option<String>,
    pub influxdb_token: Option<String>,
    pub influxdb_bucket: Option<String>,
    // --- 归档配置 ---
    /// 写入 InfluxDB 成功后是否归档 offenders
    pub archive: bool,
    pub archive_path: PathBuf,
    /// 额外强制按字符串写入的指标名
    pub string_fields: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reporter: Reporter::Json,
            options: AuditOptions::default(),
            browser_debug_port: None,
            influxdb_hostname: "influxdb".to_string(),
            influxdb_port: 8086,
            influxdb_org: None,
            influxdb_token: None,
            influxdb_bucket: None,
            archive: false,
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            string_fields: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源加载（便于测试）
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let default = Self::default();

        let options = AuditOptions {
            device: get("YLT_DEVICE"),
            ..AuditOptions::default()
        };

        Ok(Self {
            reporter: parse_var(&get, "YLT_REPORTER", "json | xml | influxdb")?.unwrap_or(default.reporter),
            options,
            browser_debug_port: parse_var(&get, "YLT_BROWSER_DEBUG_PORT", "u16")?,
            influxdb_hostname: get("YLT_INFLUXDB_HOSTNAME").unwrap_or(default.influxdb_hostname),
            influxdb_port: parse_var(&get, "YLT_INFLUXDB_PORT", "u16")?.unwrap_or(default.influxdb_port),
            influxdb_org: get("YLT_INFLUXDB_ORG"),
            influxdb_token: get("YLT_INFLUXDB_TOKEN"),
            influxdb_bucket: get("YLT_INFLUXDB_BUCKET"),
            archive: parse_var(&get, "YLT_ARCHIVE", "bool")?.unwrap_or(default.archive),
            archive_path: get("YLT_ARCHIVE_PATH").map(PathBuf::from).unwrap_or(default.archive_path),
            string_fields: get("YLT_STRING_FIELDS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// 校验配置并规范化截图路径
    pub fn validate(&mut self) -> AppResult<()> {
        self.options.validate()?;

        if self.reporter == Reporter::InfluxDb {
            self.influx_settings()?;
        }
        Ok(())
    }

    /// InfluxDB 连接参数，org / token / bucket 必填
    pub fn influx_settings(&self) -> AppResult<InfluxSettings> {
        let required = |value: &Option<String>, name: &str| {
            value.clone().ok_or_else(|| AppError::missing_parameter(name))
        };
        Ok(InfluxSettings {
            hostname: self.influxdb_hostname.clone(),
            port: self.influxdb_port,
            org: required(&self.influxdb_org, "influxdb-org")?,
            token: required(&self.influxdb_token, "influxdb-token")?,
            bucket: required(&self.influxdb_bucket, "influxdb-bucket")?,
        })
    }
}

fn parse_var<T, G>(get: &G, name: &str, expected: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: expected.to_string(),
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.reporter, Reporter::Json);
        assert_eq!(config.influxdb_hostname, "influxdb");
        assert_eq!(config.influxdb_port, 8086);
        assert_eq!(config.options.effective_device(), "mobile");
        assert!(!config.archive);
        assert_eq!(config.archive_path, PathBuf::from("ylt-archive/offenders.json"));
    }

    #[test]
    fn test_env_values() {
        let config = Config::from_lookup(lookup(&[
            ("YLT_REPORTER", "influxdb"),
            ("YLT_DEVICE", "desktop"),
            ("YLT_INFLUXDB_PORT", "9999"),
            ("YLT_INFLUXDB_ORG", "acme"),
            ("YLT_ARCHIVE", "true"),
            ("YLT_STRING_FIELDS", "cssVersion, ,fontVersion"),
            ("YLT_BROWSER_DEBUG_PORT", ""),
        ]))
        .unwrap();
        assert_eq!(config.reporter, Reporter::InfluxDb);
        assert_eq!(config.options.device.as_deref(), Some("desktop"));
        assert_eq!(config.influxdb_port, 9999);
        assert_eq!(config.influxdb_org.as_deref(), Some("acme"));
        assert!(config.archive);
        assert_eq!(config.string_fields, vec!["cssVersion", "fontVersion"]);
        assert_eq!(config.browser_debug_port, None);
    }

    #[test]
    fn test_bad_env_value() {
        let err = Config::from_lookup(lookup(&[("YLT_INFLUXDB_PORT", "eighty")])).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { ref var_name, .. }) if var_name == "YLT_INFLUXDB_PORT"
        ));
    }

    #[test]
    fn test_influxdb_requires_org_token_bucket() {
        let mut config = Config {
            reporter: Reporter::InfluxDb,
            influxdb_org: Some("acme".to_string()),
            influxdb_token: Some("secret".to_string()),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("influxdb-bucket"));

        config.influxdb_bucket = Some("ylt".to_string());
        config.validate().unwrap();
        assert_eq!(config.influx_settings().unwrap().base_url(), "http://influxdb:8086");
    }

    #[test]
    fn test_validate_device_and_screenshot() {
        let mut config = Config::default();
        config.options.device = Some("watch".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.options.screenshot = Some("shot.jpg".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.options.screenshot = Some("shot.png".to_string());
        config.validate().unwrap();
        assert!(PathBuf::from(config.options.screenshot.unwrap()).is_absolute());
    }
}
