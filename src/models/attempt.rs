use chrono::{DateTime, Utc};

/// 学生的一次作答
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub id: Option<String>,
    /// 学生姓名（缺失时用邮箱）
    pub student: String,
    pub score: f64,
    pub max_score: f64,
    pub submitted_at: Option<DateTime<Utc>>,
    pub answers: Vec<AttemptAnswer>,
}

impl Attempt {
    /// 得分百分比，满分为 0 时记 0
    pub fn percent(&self) -> f64 {
        if self.max_score <= 0.0 {
            0.0
        } else {
            self.score / self.max_score * 100.0
        }
    }
}

/// 单题作答结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptAnswer {
    pub question_id: String,
    pub is_correct: bool,
}
