//! 程序配置

use crate::error::{AppError, AppResult, ConfigError, FileError};
use serde::Deserialize;
use std::path::Path;

/// 重新生成 / 删除题目的次数上限
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuotaLimits {
    /// 每个测验允许重新生成的题目数
    pub max_regenerations: u32,
    /// 每个测验允许删除的题目数
    pub max_deletions: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_regenerations: 5,
            max_deletions: 1,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 后端 API 配置 ---
    pub api_base_url: String,
    /// 为空时不发送 Authorization 头
    pub api_token: String,
    pub request_timeout_secs: u64,
    /// 429 限流时的最大重试次数
    pub max_retries: usize,
    /// 未返回 Retry-After 时的等待时间
    pub retry_delay_ms: u64,
    // --- 任务配置 ---
    /// 同时处理的任务数量
    pub max_concurrent_jobs: usize,
    /// 单个任务内同时上传的文件数量
    pub max_concurrent_uploads: usize,
    /// 任务 TOML 文件存放目录
    pub jobs_folder: String,
    /// 失败任务记录文件
    pub warn_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 成绩统计 ---
    /// 及格线（百分比）
    pub pass_mark_percent: f64,
    /// 运行结束后需要输出成绩报告的测验
    pub report_quiz_ids: Vec<String>,
    pub quota: QuotaLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            api_token: String::new(),
            request_timeout_secs: 60,
            max_retries: 5,
            retry_delay_ms: 2000,
            max_concurrent_jobs: 4,
            max_concurrent_uploads: 3,
            jobs_folder: "quiz_jobs".to_string(),
            warn_file: "warn.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            pass_mark_percent: 60.0,
            report_quiz_ids: Vec::new(),
            quota: QuotaLimits::default(),
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// 读取 TOML 配置文件，缺省字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::File(FileError::TomlParseFailed { source, .. }) => {
                AppError::File(FileError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
            path: String::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 配置文件（可选）+ 环境变量，环境变量优先
    pub fn load(config_path: Option<&Path>) -> AppResult<Self> {
        let base = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// 用 `lookup` 提供的值覆盖配置项
    pub fn with_env_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("QUIZ_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = get("QUIZ_API_TOKEN") {
            self.api_token = v;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", v, "u64")?;
        }
        if let Some(v) = get("MAX_RETRIES") {
            self.max_retries = parse_env("MAX_RETRIES", v, "usize")?;
        }
        if let Some(v) = get("RETRY_DELAY_MS") {
            self.retry_delay_ms = parse_env("RETRY_DELAY_MS", v, "u64")?;
        }
        if let Some(v) = get("MAX_CONCURRENT_JOBS") {
            self.max_concurrent_jobs = parse_env("MAX_CONCURRENT_JOBS", v, "usize")?;
        }
        if let Some(v) = get("MAX_CONCURRENT_UPLOADS") {
            self.max_concurrent_uploads = parse_env("MAX_CONCURRENT_UPLOADS", v, "usize")?;
        }
        if let Some(v) = get("JOBS_FOLDER") {
            self.jobs_folder = v;
        }
        if let Some(v) = get("WARN_FILE") {
            self.warn_file = v;
        }
        if let Some(v) = get("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        if let Some(v) = get("VERBOSE_LOGGING") {
            self.verbose_logging = parse_env("VERBOSE_LOGGING", v, "bool")?;
        }
        if let Some(v) = get("PASS_MARK_PERCENT") {
            self.pass_mark_percent = parse_env("PASS_MARK_PERCENT", v, "f64")?;
        }
        if let Some(v) = get("REPORT_QUIZ_IDS") {
            self.report_quiz_ids = v
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
        }
        if let Some(v) = get("MAX_REGENERATIONS") {
            self.quota.max_regenerations = parse_env("MAX_REGENERATIONS", v, "u32")?;
        }
        if let Some(v) = get("MAX_DELETIONS") {
            self.quota.max_deletions = parse_env("MAX_DELETIONS", v, "u32")?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_jobs == 0 {
            return Err(invalid("max_concurrent_jobs", "必须大于 0"));
        }
        if self.max_concurrent_uploads == 0 {
            return Err(invalid("max_concurrent_uploads", "必须大于 0"));
        }
        if !(0.0..=100.0).contains(&self.pass_mark_percent) {
            return Err(invalid("pass_mark_percent", "必须在 0 到 100 之间"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(invalid("api_base_url", "必须以 http:// 或 https:// 开头"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str, value: String, expected_type: &str) -> AppResult<T> {
    value.parse::<T>().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        })
    })
}

fn invalid(field: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}
