use crate::error::{AppError, AppResult, ConfigError};
use crate::orchestrator::BatchOptions;
use crate::workflow::RetryPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 远端服务配置 ---
    /// SOAP 服务地址
    pub endpoint_url: String,
    /// 操作员处的机构编码（codigoPrestadorNaOperadora）
    pub provider_code: String,
    /// 登录名
    pub login: String,
    /// 密码（明文或 32 位 MD5）
    pub password: String,
    /// ANS 注册号
    pub ans_registry: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 提交策略 ---
    /// 每个指南的最大尝试次数
    pub max_attempts: u32,
    /// 重试前等待（秒），固定间隔
    pub retry_backoff_secs: u64,
    /// 两次提交之间的间隔（秒）
    pub request_pause_secs: u64,
    /// naturezaGuia
    pub guide_nature: String,
    /// tipoDocumento
    pub document_type: String,
    // --- 本地文件 ---
    /// XML 与 PDF 存放目录
    pub input_folder: String,
    /// JSON 结果报告（可选）
    pub report_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: "https://tiss-documentos.orizon.com.br/Service.asmx".to_string(),
            provider_code: String::new(),
            login: String::new(),
            password: String::new(),
            ans_registry: "005711".to_string(),
            request_timeout_secs: 120,
            max_attempts: 3,
            retry_backoff_secs: 2,
            request_pause_secs: 1,
            guide_nature: "2".to_string(),
            document_type: "01".to_string(),
            input_folder: "input".to_string(),
            report_file: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

/// 配置文件内容，所有键均可省略
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    endpoint_url: Option<String>,
    provider_code: Option<String>,
    login: Option<String>,
    password: Option<String>,
    ans_registry: Option<String>,
    request_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    retry_backoff_secs: Option<u64>,
    request_pause_secs: Option<u64>,
    guide_nature: Option<String>,
    document_type: Option<String>,
    input_folder: Option<String>,
    report_file: Option<String>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，再叠加环境变量
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    /// 解析 TOML 文本，缺失的键使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let d = Self::default();
        Ok(Self {
            endpoint_url: file.endpoint_url.unwrap_or(d.endpoint_url),
            provider_code: file.provider_code.unwrap_or(d.provider_code),
            login: file.login.unwrap_or(d.login),
            password: file.password.unwrap_or(d.password),
            ans_registry: file.ans_registry.unwrap_or(d.ans_registry),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(d.request_timeout_secs),
            max_attempts: file.max_attempts.unwrap_or(d.max_attempts),
            retry_backoff_secs: file.retry_backoff_secs.unwrap_or(d.retry_backoff_secs),
            request_pause_secs: file.request_pause_secs.unwrap_or(d.request_pause_secs),
            guide_nature: file.guide_nature.unwrap_or(d.guide_nature),
            document_type: file.document_type.unwrap_or(d.document_type),
            input_folder: file.input_folder.unwrap_or(d.input_folder),
            report_file: file.report_file.or(d.report_file),
            verbose_logging: file.verbose_logging.unwrap_or(d.verbose_logging),
            output_log_file: file.output_log_file.unwrap_or(d.output_log_file),
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            endpoint_url: std::env::var("ORIZON_ENDPOINT_URL").unwrap_or(self.endpoint_url),
            provider_code: std::env::var("ORIZON_CODIGO_PRESTADOR").unwrap_or(self.provider_code),
            login: std::env::var("ORIZON_LOGIN").unwrap_or(self.login),
            password: std::env::var("ORIZON_SENHA").unwrap_or(self.password),
            ans_registry: std::env::var("ORIZON_REGISTRO_ANS").unwrap_or(self.ans_registry),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_attempts),
            retry_backoff_secs: std::env::var("RETRY_BACKOFF_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.retry_backoff_secs),
            request_pause_secs: std::env::var("REQUEST_PAUSE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_pause_secs),
            guide_nature: std::env::var("GUIDE_NATURE").unwrap_or(self.guide_nature),
            document_type: std::env::var("DOCUMENT_TYPE").unwrap_or(self.document_type),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(self.input_folder),
            report_file: std::env::var("REPORT_FILE").ok().or(self.report_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.max_attempts == 0 {
            return Err(AppError::invalid_config(
                "max_attempts",
                "0",
                "至少需要一次尝试",
            ));
        }
        if self.endpoint_url.trim().is_empty() {
            return Err(AppError::invalid_config("endpoint_url", "", "不能为空"));
        }
        Ok(())
    }

    /// 单个指南的重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_secs(self.retry_backoff_secs),
        }
    }

    /// 批次级别的提交节奏
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            retry: self.retry_policy(),
            request_pause: Duration::from_secs(self.request_pause_secs),
        }
    }
}
