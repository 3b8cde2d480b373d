//! 命令行参数
//!
//! 命令行参数覆盖环境变量中的配置。

use crate::config::Config;
use crate::reporters::Reporter;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ylt-batch")]
#[command(about = "批量审计网页质量，输出 JSON / XML 报告或写入 InfluxDB", long_about = None)]
#[command(version)]
pub struct Cli {
    /// 单个 URL，或批量文件（.yml / .yaml / .toml）
    pub input: String,

    /// 模拟设备：phone、mobile（默认）、tablet、desktop、desktop-hd
    #[arg(long)]
    pub device: Option<String>,

    /// 截图输出路径，必须以 ".png" 结尾
    #[arg(long)]
    pub screenshot: Option<String>,

    /// 页面加载后等待该 CSS 选择器匹配到元素
    #[arg(long)]
    pub wait_for_selector: Option<String>,

    /// HTTP 代理，格式 "host:port"
    #[arg(long)]
    pub proxy: Option<String>,

    /// 在主域名上附加 cookie
    #[arg(long)]
    pub cookie: Option<String>,

    /// HTTP Basic 认证用户名
    #[arg(long)]
    pub auth_user: Option<String>,

    /// HTTP Basic 认证密码
    #[arg(long)]
    pub auth_pass: Option<String>,

    /// 禁止请求的域名（逗号分隔）
    #[arg(long)]
    pub block_domain: Option<String>,

    /// 只允许请求的域名（逗号分隔）
    #[arg(long)]
    pub allow_domain: Option<String>,

    /// 屏蔽主域名以外的所有域名
    #[arg(long)]
    pub no_externals: bool,

    /// 注入 localStorage，例如 "bar=foo;domain=url"
    #[arg(long)]
    pub local_storage: Option<String>,

    /// 注入 sessionStorage，例如 "bar=foo;domain=url"
    #[arg(long)]
    pub session_storage: Option<String>,

    /// 输出格式：json（默认）、xml、influxdb
    #[arg(long)]
    pub reporter: Option<Reporter>,

    #[arg(long)]
    pub influxdb_hostname: Option<String>,

    #[arg(long)]
    pub influxdb_port: Option<u16>,

    #[arg(long)]
    pub influxdb_org: Option<String>,

    #[arg(long)]
    pub influxdb_token: Option<String>,

    #[arg(long)]
    pub influxdb_bucket: Option<String>,

    /// 写入 InfluxDB 成功后归档 offenders
    #[arg(long)]
    pub archive: bool,

    /// 归档文件路径
    #[arg(long)]
    pub archive_path: Option<PathBuf>,

    /// 连接已打开的浏览器调试端口，不指定则启动无头浏览器
    #[arg(long)]
    pub browser_debug_port: Option<u16>,

    /// 额外强制按字符串写入 InfluxDB 的指标（可重复）
    #[arg(long = "string-field")]
    pub string_fields: Vec<String>,
}

impl Cli {
    /// 把命令行中显式给出的参数叠加到配置上
    pub fn apply_to(&self, config: &mut Config) {
        let options = &mut config.options;
        override_with(&mut options.device, &self.device);
        override_with(&mut options.screenshot, &self.screenshot);
        override_with(&mut options.wait_for_selector, &self.wait_for_selector);
        override_with(&mut options.proxy, &self.proxy);
        override_with(&mut options.cookie, &self.cookie);
        override_with(&mut options.auth_user, &self.auth_user);
        override_with(&mut options.auth_pass, &self.auth_pass);
        override_with(&mut options.block_domain, &self.block_domain);
        override_with(&mut options.allow_domain, &self.allow_domain);
        override_with(&mut options.local_storage, &self.local_storage);
        override_with(&mut options.session_storage, &self.session_storage);
        if self.no_externals {
            options.no_externals = Some(true);
        }

        if let Some(reporter) = self.reporter {
            config.reporter = reporter;
        }
        if let Some(hostname) = &self.influxdb_hostname {
            config.influxdb_hostname = hostname.clone();
        }
        if let Some(port) = self.influxdb_port {
            config.influxdb_port = port;
        }
        override_with(&mut config.influxdb_org, &self.influxdb_org);
        override_with(&mut config.influxdb_token, &self.influxdb_token);
        override_with(&mut config.influxdb_bucket, &self.influxdb_bucket);

        if self.archive {
            config.archive = true;
        }
        if let Some(path) = &self.archive_path {
            config.archive_path = path.clone();
        }
        if self.browser_debug_port.is_some() {
            config.browser_debug_port = self.browser_debug_port;
        }
        config.string_fields.extend(self.string_fields.iter().cloned());
    }
}

fn override_with<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "ylt-batch",
            "https://a.com",
            "--device",
            "tablet",
            "--no-externals",
            "--reporter",
            "influxdb",
            "--influxdb-bucket",
            "ylt",
            "--archive",
            "--string-field",
            "cssVersion",
            "--string-field",
            "fontVersion",
        ]);
        let mut config = Config {
            influxdb_org: Some("acme".to_string()),
            ..Config::default()
        };
        config.options.device = Some("desktop".to_string());
        config.options.proxy = Some("env-proxy:3128".to_string());

        cli.apply_to(&mut config);

        assert_eq!(cli.input, "https://a.com");
        assert_eq!(config.options.device.as_deref(), Some("tablet"));
        assert_eq!(config.options.proxy.as_deref(), Some("env-proxy:3128"));
        assert_eq!(config.options.no_externals, Some(true));
        assert_eq!(config.reporter, Reporter::InfluxDb);
        assert_eq!(config.influxdb_org.as_deref(), Some("acme"));
        assert_eq!(config.influxdb_bucket.as_deref(), Some("ylt"));
        assert!(config.archive);
        assert_eq!(config.string_fields, vec!["cssVersion", "fontVersion"]);
    }

    #[test]
    fn test_unknown_reporter_rejected() {
        assert!(Cli::try_parse_from(["ylt-batch", "https://a.com", "--reporter", "csv"]).is_err());
    }
}
