use thiserror::Error;

use crate::validation::PageRangeError;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 输入校验错误（用户可修正）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 重新生成 / 删除次数用尽
    #[error("配额错误: {0}")]
    Quota(#[from] QuotaError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 请求频率限制，重试次数用尽
    #[error("API请求频率限制 ({endpoint}), 已重试 {attempts} 次")]
    RateLimited { endpoint: String, attempts: usize },
    /// 响应缺少必要字段
    #[error("API响应缺少字段 ({endpoint}): {field}")]
    MissingField { endpoint: String, field: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 输入校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 页码范围无效
    #[error("文件 {filename} 的页码范围无效: {source}")]
    PageRange {
        filename: String,
        #[source]
        source: PageRangeError,
    },
    /// 不支持的文件类型
    #[error("不支持的文件类型: {filename}")]
    UnsupportedDocument { filename: String },
    /// 题目不存在
    #[error("题目不存在: {id}")]
    UnknownQuestion { id: String },
    /// 题目内容不合法
    #[error("题目内容不合法: {reason}")]
    InvalidQuestion { reason: String },
    /// 任务没有任何文档
    #[error("任务《{title}》没有任何文档")]
    NoDocuments { title: String },
    /// 试卷没有题目，无法发布
    #[error("测验 {quiz_id} 没有题目，无法发布")]
    EmptyQuiz { quiz_id: String },
}

/// 配额错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("重新生成次数已用完 (上限 {limit})")]
    RegenerationsExhausted { limit: u32 },
    #[error("删除次数已用完 (上限 {limit})")]
    DeletionsExhausted { limit: u32 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值不合法
    #[error("配置项 {field} 取值不合法: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建响应缺少字段错误
    pub fn missing_field(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        AppError::Api(ApiError::MissingField {
            endpoint: endpoint.into(),
            field: field.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建题目内容不合法错误
    pub fn invalid_question(reason: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::InvalidQuestion {
            reason: reason.into(),
        })
    }

    /// 是否为用户可修正的输入错误
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::Quota(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
