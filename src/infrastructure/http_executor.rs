//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"发请求拿 JSON"的能力

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::utils::clip_for_log;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// multipart 上传的单个文件
///
/// `Form` 不能 clone，重试时需要重新构建
#[derive(Debug, Clone)]
pub struct MultipartFile {
    pub field: String,
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl MultipartFile {
    fn to_form(&self) -> Form {
        let part = || Part::bytes(self.bytes.clone()).file_name(self.filename.clone());
        let part = part().mime_str(self.mime).unwrap_or_else(|_| part());
        Form::new().part(self.field.clone(), part)
    }
}

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 reqwest::Client
/// - 拼接地址、附加认证头
/// - 处理 429 限流重试
/// - 不认识 Quiz / Question
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_retries: usize,
    retry_delay: Duration,
}

impl HttpExecutor {
    /// 根据配置创建执行器
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::api_request_failed("client builder", e))?;

        let token = Some(config.api_token.trim().to_string()).filter(|t| !t.is_empty());

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 拼接完整地址
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> AppResult<JsonValue> {
        self.send(Method::GET, path, |request| request).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> AppResult<JsonValue> {
        self.send(Method::POST, path, |request| request.json(body)).await
    }

    /// 无请求体的 POST
    pub async fn post_empty(&self, path: &str) -> AppResult<JsonValue> {
        self.send(Method::POST, path, |request| request).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> AppResult<JsonValue> {
        self.send(Method::PUT, path, |request| request.json(body)).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<JsonValue> {
        self.send(Method::DELETE, path, |request| request).await
    }

    pub async fn post_multipart(&self, path: &str, file: &MultipartFile) -> AppResult<JsonValue> {
        self.send(Method::POST, path, |request| request.multipart(file.to_form()))
            .await
    }

    /// 发送请求并解析 JSON
    ///
    /// 429 时按 Retry-After（或默认间隔）等待后重试
    async fn send<F>(&self, method: Method, path: &str, build: F) -> AppResult<JsonValue>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);
        let endpoint = format!("{} {}", method, path);

        for attempt in 0..=self.max_retries {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header(ACCEPT, "application/json");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            debug!("→ {} (尝试 {})", endpoint, attempt + 1);

            let response = build(request)
                .send()
                .await
                .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt == self.max_retries {
                    break;
                }
                let wait = retry_after(&response).unwrap_or(self.retry_delay);
                warn!(
                    "API 请求频繁限制 (尝试 {}/{}), 等待 {:?} 后重试...",
                    attempt + 1,
                    self.max_retries + 1,
                    wait
                );
                sleep(wait).await;
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

            debug!("← {} {}", endpoint, status);

            if !status.is_success() {
                return Err(ApiError::BadResponse {
                    endpoint,
                    status: status.as_u16(),
                    message: error_message(&body),
                }
                .into());
            }

            if body.trim().is_empty() {
                return Ok(JsonValue::Null);
            }
            return Ok(serde_json::from_str(&body)?);
        }

        Err(ApiError::RateLimited {
            endpoint,
            attempts: self.max_retries + 1,
        }
        .into())
    }
}

/// Retry-After 只支持秒数写法
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// 从错误响应体中提取提示信息
fn error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<JsonValue>(body) {
        Ok(json) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| json.get(*key).filter(|v| !v.is_null()))
            .map(|v| match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .or_else(|| Some(clip_for_log(body, 200).into_owned())),
        Err(_) => Some(clip_for_log(body.trim(), 200).into_owned()),
    }
}
