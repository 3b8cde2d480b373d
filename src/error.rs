use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 分析引擎错误
    #[error("分析引擎错误: {0}")]
    Engine(#[from] EngineError),
    /// 批量运行中断
    #[error("批量运行中断: {0}")]
    Batch(#[from] BatchError),
    /// 时序数据库写入错误
    #[error("时序数据库错误: {0}")]
    Sink(#[from] SinkError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 分析引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 启动或连接浏览器失败
    #[error("无法启动浏览器: {source}")]
    BrowserUnavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行采集脚本失败
    #[error("执行采集脚本失败 ({url}): {source}")]
    ScriptFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 等待的选择器始终没有出现
    #[error("等待选择器 {selector} 超时 ({url})")]
    SelectorTimeout { url: String, selector: String },
    /// 引擎返回的结果无法解析
    #[error("分析结果格式错误 ({url}): {message}")]
    MalformedResult { url: String, message: String },
}

/// 单个 URL 失败导致整批中止
#[derive(Debug, Error)]
#[error("第 {index} 个 URL ({url}) 分析失败: {source}")]
pub struct BatchError {
    /// 请求在批次中的位置（从 1 开始）
    pub index: usize,
    pub url: String,
    #[source]
    pub source: EngineError,
}

/// 时序数据库写入错误
#[derive(Debug, Error)]
pub enum SinkError {
    /// 401：bucket 不存在或 token 无权写入
    #[error("InfluxDB bucket {bucket} 不存在或无权写入 (HTTP 401)")]
    Unauthorized { bucket: String, body: String },
    /// 其他非 2xx 响应
    #[error("InfluxDB 拒绝写入 (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    /// 网络层失败
    #[error("无法连接 InfluxDB ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SinkError {
    /// 是否属于"目标不存在"一类
    pub fn is_missing_destination(&self) -> bool {
        matches!(self, SinkError::Unauthorized { .. })
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 批量文件解析失败
    #[error("批量文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 不支持的批量文件格式
    #[error("不支持的批量文件格式: {path}")]
    UnsupportedFormat { path: String },
    /// 无法获取当前工作目录（解析相对路径时需要）
    #[error("无法获取当前工作目录: {source}")]
    WorkingDirUnavailable {
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少必填参数
    #[error("缺少参数: {name}")]
    MissingParameter { name: String },
    /// 参数取值不合法
    #[error("参数 {name} 不合法: {reason}")]
    InvalidParameter { name: String, reason: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON 处理失败: {}", err))
    }
}

impl From<std::fmt::Error> for AppError {
    fn from(err: std::fmt::Error) -> Self {
        AppError::Other(format!("报告输出失败: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Other(format!("YAML 解析失败: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Other(format!("TOML 解析失败: {}", err))
    }
}

impl From<chromiumoxide::error::CdpError> for EngineError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        EngineError::BrowserUnavailable {
            source: Box::new(err),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件解析错误
    pub fn file_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建缺少参数错误
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingParameter { name: name.into() })
    }

    /// 创建参数不合法错误
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        })
    }
}

impl EngineError {
    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        EngineError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// 创建脚本执行失败错误
    pub fn script_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        EngineError::ScriptFailed {
            url: url.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
