//! 任务处理上下文
//!
//! 封装"我正在处理第几个任务、对应哪个测验"这一信息

use std::fmt::Display;

/// 任务处理上下文
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 任务索引（从1开始，仅用于日志显示）
    pub job_index: usize,

    /// 任务名称（TOML 文件名）
    pub job_name: String,

    /// 创建成功后的测验ID
    pub quiz_id: Option<String>,
}

impl JobCtx {
    pub fn new(job_index: usize, job_name: impl Into<String>) -> Self {
        Self {
            job_index,
            job_name: job_name.into(),
            quiz_id: None,
        }
    }

    pub fn with_quiz_id(mut self, quiz_id: impl Into<String>) -> Self {
        self.quiz_id = Some(quiz_id.into());
        self
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.quiz_id {
            Some(quiz_id) => write!(f, "[任务 {} 测验#{}]", self.job_index, quiz_id),
            None => write!(f, "[任务 {}]", self.job_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = JobCtx::new(3, "biology.toml");
        assert_eq!(ctx.to_string(), "[任务 3]");
        assert_eq!(ctx.with_quiz_id("q-9").to_string(), "[任务 3 测验#q-9]");
    }
}
