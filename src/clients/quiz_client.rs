//! 测验后端 API 客户端
//!
//! 封装所有与测验后端相关的调用，响应统一经过归一化服务解析

use crate::error::{AppError, AppResult, FileError};
use crate::infrastructure::{HttpExecutor, MultipartFile};
use crate::models::{
    Attempt, DocumentUpload, GenerateRequest, NewQuiz, Quiz, QuizSummary, QuizUpdate,
    QuotaUsage, RegenerateOutcome, UploadReceipt,
};
use crate::services::normalizer;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info};

/// 测验 API 客户端
///
/// 内部共享同一个 HttpExecutor，clone 开销很小
#[derive(Clone)]
pub struct QuizClient {
    executor: Arc<HttpExecutor>,
}

impl QuizClient {
    pub fn new(executor: HttpExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    pub fn executor(&self) -> &HttpExecutor {
        &self.executor
    }

    /// 测验列表
    pub async fn list_quizzes(&self) -> AppResult<Vec<QuizSummary>> {
        let result = self.executor.get("/api/quizzes").await?;
        Ok(normalizer::normalize_quiz_summaries(&result))
    }

    /// 创建测验
    pub async fn create_quiz(&self, new_quiz: &NewQuiz) -> AppResult<Quiz> {
        let endpoint = "POST /api/quizzes";
        debug!("创建测验 Payload: {}", serde_json::to_string(new_quiz)?);

        let result = self.executor.post_json("/api/quizzes", new_quiz).await?;
        normalizer::normalize_quiz(endpoint, &result)
    }

    /// 上传文档（只上传文件本身，页码范围随生成请求发送）
    pub async fn upload_document(
        &self,
        quiz_id: &str,
        document: &DocumentUpload,
    ) -> AppResult<UploadReceipt> {
        let path_display = document.path.display().to_string();
        let bytes = tokio::fs::read(&document.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::File(FileError::NotFound {
                path: path_display.clone(),
            }),
            _ => AppError::file_read_failed(path_display.clone(), e),
        })?;

        info!("📤 上传 {} ({} 字节)", document.filename, bytes.len());

        let file = MultipartFile {
            field: "file".to_string(),
            filename: document.filename.clone(),
            mime: document.kind.mime_type(),
            bytes,
        };
        let path = format!("/api/quizzes/{}/documents", quiz_id);
        let result = self.executor.post_multipart(&path, &file).await?;

        let body = normalizer::unwrap_envelope(&result);
        Ok(UploadReceipt {
            filename: body
                .get("filename")
                .and_then(JsonValue::as_str)
                .unwrap_or(&document.filename)
                .to_string(),
            document_id: body
                .get("document_id")
                .or_else(|| body.get("id"))
                .and_then(normalizer::id_of),
        })
    }

    /// 根据已上传的文档生成题目
    pub async fn generate_questions(
        &self,
        quiz_id: &str,
        request: &GenerateRequest,
    ) -> AppResult<Quiz> {
        let path = format!("/api/quizzes/{}/generate", quiz_id);
        debug!("生成题目 Payload: {}", serde_json::to_string(request)?);

        let result = self.executor.post_json(&path, request).await?;
        self.quiz_or_refetch(quiz_id, &format!("POST {}", path), &result)
            .await
    }

    /// 获取测验详情
    pub async fn fetch_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        let path = format!("/api/quizzes/{}", quiz_id);
        let result = self.executor.get(&path).await?;
        normalizer::normalize_quiz(&format!("GET {}", path), &result)
    }

    /// 更新测验
    pub async fn update_quiz(&self, quiz_id: &str, update: &QuizUpdate) -> AppResult<Quiz> {
        let path = format!("/api/quizzes/{}", quiz_id);
        debug!("更新测验 Payload: {}", serde_json::to_string(update)?);

        let result = self.executor.put_json(&path, update).await?;
        self.quiz_or_refetch(quiz_id, &format!("PUT {}", path), &result)
            .await
    }

    /// 发布测验
    pub async fn publish_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        let path = format!("/api/quizzes/{}/publish", quiz_id);
        let result = self.executor.post_empty(&path).await?;
        self.quiz_or_refetch(quiz_id, &format!("POST {}", path), &result)
            .await
    }

    /// 重新生成一道题目
    pub async fn regenerate_question(
        &self,
        quiz_id: &str,
        question_id: &str,
    ) -> AppResult<RegenerateOutcome> {
        let path = format!("/api/quizzes/{}/questions/{}/regenerate", quiz_id, question_id);
        let endpoint = format!("POST {}", path);
        let result = self.executor.post_empty(&path).await?;

        let body = normalizer::unwrap_envelope(&result);
        let question = body
            .get("question")
            .filter(|q| q.is_object())
            .or(Some(body))
            .and_then(normalizer::normalize_question)
            .ok_or_else(|| AppError::missing_field(&endpoint, "question"))?;

        let quota = match normalizer::normalize_quota_opt(body) {
            Some(quota) => quota,
            None => self.fetch_quiz(quiz_id).await?.quota,
        };

        Ok(RegenerateOutcome { question, quota })
    }

    /// 删除一道题目，返回服务端记录的配额使用量
    pub async fn delete_question(&self, quiz_id: &str, question_id: &str) -> AppResult<QuotaUsage> {
        let path = format!("/api/quizzes/{}/questions/{}", quiz_id, question_id);
        let result = self.executor.delete(&path).await?;

        // 204 无响应体或响应不含计数时，重新读取测验记录
        match normalizer::normalize_quota_opt(&result) {
            Some(quota) => Ok(quota),
            None => Ok(self.fetch_quiz(quiz_id).await?.quota),
        }
    }

    /// 获取所有作答记录
    pub async fn fetch_attempts(&self, quiz_id: &str) -> AppResult<Vec<Attempt>> {
        let path = format!("/api/quizzes/{}/attempts", quiz_id);
        let result = self.executor.get(&path).await?;
        Ok(normalizer::normalize_attempts(&result))
    }

    /// 有的接口只返回 `{"success": true}`，此时重新获取测验
    async fn quiz_or_refetch(&self, quiz_id: &str, endpoint: &str, result: &JsonValue) -> AppResult<Quiz> {
        match normalizer::normalize_quiz(endpoint, result) {
            Ok(quiz) => Ok(quiz),
            Err(_) => {
                debug!("{} 未返回测验详情，重新获取", endpoint);
                self.fetch_quiz(quiz_id).await
            }
        }
    }
}
