use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 单选题
    MultipleChoice,
    /// 判断题
    TrueFalse,
    /// 简答题
    ShortAnswer,
}

impl QuestionType {
    /// 从后端的各种写法解析题型
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcq" | "multiple_choice" | "multiple-choice" | "single_choice" | "choice" => {
                Some(QuestionType::MultipleChoice)
            }
            "true_false" | "true-false" | "tf" | "boolean" | "bool" => Some(QuestionType::TrueFalse),
            "short_answer" | "short-answer" | "open" | "text" | "open_ended" => {
                Some(QuestionType::ShortAnswer)
            }
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "单选题",
            QuestionType::TrueFalse => "判断题",
            QuestionType::ShortAnswer => "简答题",
        }
    }
}

/// 一道题目
///
/// 序列化格式即发送给后端的更新格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 新增且尚未保存的题目没有 id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// 题目来源页码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<u32>,
}

impl Question {
    /// 创建一道单选题
    pub fn multiple_choice(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            text: text.into(),
            question_type: QuestionType::MultipleChoice,
            options,
            correct_answer: Some(correct_answer.into()),
            explanation: None,
            source_page: None,
        }
    }

    /// 创建一道简答题
    pub fn short_answer(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            question_type: QuestionType::ShortAnswer,
            options: Vec::new(),
            correct_answer: None,
            explanation: None,
            source_page: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 检查题目能否提交
    pub fn validate(&self) -> AppResult<()> {
        if self.text.trim().is_empty() {
            return Err(AppError::invalid_question("题干不能为空"));
        }

        match self.question_type {
            QuestionType::MultipleChoice => {
                if self.options.len() < 2 {
                    return Err(AppError::invalid_question(format!(
                        "单选题至少需要 2 个选项，实际 {} 个",
                        self.options.len()
                    )));
                }
                if self.options.iter().any(|o| o.trim().is_empty()) {
                    return Err(AppError::invalid_question("选项不能为空"));
                }
                match &self.correct_answer {
                    Some(answer) if self.options.contains(answer) => {}
                    Some(answer) => {
                        return Err(AppError::invalid_question(format!(
                            "正确答案 '{}' 不在选项中",
                            answer
                        )))
                    }
                    None => return Err(AppError::invalid_question("单选题必须设置正确答案")),
                }
            }
            QuestionType::TrueFalse => {
                if let Some(answer) = &self.correct_answer {
                    if answer != "true" && answer != "false" {
                        return Err(AppError::invalid_question(format!(
                            "判断题答案必须为 true 或 false，实际为 '{}'",
                            answer
                        )));
                    }
                }
            }
            QuestionType::ShortAnswer => {}
        }

        Ok(())
    }
}

/// 对题目的局部修改，`None` 表示不改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

impl QuestionPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 应用到题目副本上
    pub fn apply_to(&self, question: &Question) -> Question {
        let mut updated = question.clone();
        if let Some(text) = &self.text {
            updated.text = text.clone();
        }
        if let Some(question_type) = self.question_type {
            updated.question_type = question_type;
        }
        if let Some(options) = &self.options {
            updated.options = options.clone();
        }
        if let Some(answer) = &self.correct_answer {
            updated.correct_answer = Some(answer.clone());
        }
        if let Some(explanation) = &self.explanation {
            updated.explanation = Some(explanation.clone());
        }
        updated
    }
}
