use crate::models::question::Question;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// 测验状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    Draft,
    Published,
}

impl QuizStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" | "active" | "live" => QuizStatus::Published,
            _ => QuizStatus::Draft,
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizStatus::Draft => write!(f, "草稿"),
            QuizStatus::Published => write!(f, "已发布"),
        }
    }
}

/// 服务端记录的配额使用量
///
/// 只能来自服务端响应，客户端不自行累加
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub regenerations_used: u32,
    pub deletions_used: u32,
}

/// 测验详情
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: QuizStatus,
    pub questions: Vec<Question>,
    pub quota: QuotaUsage,
    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn is_published(&self) -> bool {
        self.status == QuizStatus::Published
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id.as_deref() == Some(id))
    }
}

/// 测验列表项
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub status: QuizStatus,
    pub question_count: usize,
}

/// 创建测验请求
#[derive(Debug, Clone, Serialize)]
pub struct NewQuiz {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub num_questions: u32,
}

/// 与文件名关联的页码范围，原样发送用户输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRangeEntry {
    pub filename: String,
    pub page_range: String,
}

/// 生成题目请求
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub documents: Vec<PageRangeEntry>,
    pub num_questions: u32,
}

/// 更新测验请求
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuizUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<PageRangeEntry>,
}

/// 文件上传回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: String,
    pub document_id: Option<String>,
}

/// 重新生成结果
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerateOutcome {
    pub question: Question,
    pub quota: QuotaUsage,
}
