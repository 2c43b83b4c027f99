//! 响应归一化服务 - 业务能力层
//!
//! 后端不同接口返回的 JSON 结构不统一（有无 `data` 包裹、字段名不同），
//! 所有页面共用这一份解析逻辑。

use crate::error::{AppError, AppResult};
use crate::models::{
    Attempt, AttemptAnswer, Question, QuestionType, Quiz, QuizStatus, QuizSummary, QuotaUsage,
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

const QUESTION_LIST_KEYS: &[&str] = &["questions", "items"];
const QUESTION_TEXT_KEYS: &[&str] = &["question", "question_text", "text", "prompt"];
const OPTION_KEYS: &[&str] = &["options", "choices"];
const OPTION_TEXT_KEYS: &[&str] = &["text", "label", "value"];
const ANSWER_KEYS: &[&str] = &["correct_answer", "answer", "correct_option"];
const TYPE_KEYS: &[&str] = &["type", "question_type"];

/// 去掉 `{"data": ...}` 包裹
pub fn unwrap_envelope(value: &JsonValue) -> &JsonValue {
    match value.get("data") {
        Some(data) if !data.is_null() => data,
        _ => value,
    }
}

/// 字符串或数字形式的 id
pub fn id_of(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_str<'a>(obj: &'a JsonValue, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| obj.get(*key).and_then(JsonValue::as_str))
}

fn first_value<'a>(obj: &'a JsonValue, keys: &[&str]) -> Option<&'a JsonValue> {
    keys.iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

fn first_u32(obj: &JsonValue, keys: &[&str]) -> u32 {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(JsonValue::as_u64))
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

fn first_f64(obj: &JsonValue, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn parse_time(obj: &JsonValue, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = first_str(obj, keys)?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            debug!("无法解析时间 '{}': {}", raw, e);
            None
        }
    }
}

/// 找到题目数组
fn question_list(value: &JsonValue) -> Option<&Vec<JsonValue>> {
    let body = unwrap_envelope(value);
    if let Some(array) = body.as_array() {
        return Some(array);
    }
    if let Some(array) = QUESTION_LIST_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(JsonValue::as_array))
    {
        return Some(array);
    }
    body.get("quiz")
        .and_then(|quiz| quiz.get("questions"))
        .and_then(JsonValue::as_array)
}

/// 解析题目列表，缺少题干的条目会被丢弃
pub fn normalize_questions(value: &JsonValue) -> Vec<Question> {
    let Some(items) = question_list(value) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let question = normalize_question(item);
            if question.is_none() {
                warn!("⚠️ 第 {} 道题目缺少题干，已忽略: {}", index + 1, item);
            }
            question
        })
        .collect()
}

/// 解析单道题目
pub fn normalize_question(item: &JsonValue) -> Option<Question> {
    let text = first_str(item, QUESTION_TEXT_KEYS)?.trim().to_string();
    if text.is_empty() {
        return None;
    }

    let options = normalize_options(item);
    let declared_type = first_str(item, TYPE_KEYS).and_then(QuestionType::parse);
    let question_type = declared_type.unwrap_or(if options.is_empty() {
        QuestionType::ShortAnswer
    } else {
        QuestionType::MultipleChoice
    });

    let correct_answer = first_value(item, ANSWER_KEYS)
        .and_then(|answer| normalize_answer(answer, &options, question_type));

    Some(Question {
        id: item.get("id").and_then(id_of),
        text,
        question_type,
        options,
        correct_answer,
        explanation: item
            .get("explanation")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        source_page: item
            .get("source_page")
            .or_else(|| item.get("page"))
            .and_then(JsonValue::as_u64)
            .map(|p| p as u32),
    })
}

fn normalize_options(item: &JsonValue) -> Vec<String> {
    let Some(raw) = first_value(item, OPTION_KEYS).and_then(JsonValue::as_array) else {
        return Vec::new();
    };

    raw.iter()
        .filter_map(|option| match option {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Object(_) => first_str(option, OPTION_TEXT_KEYS).map(str::to_string),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// 答案可能是文本、从 0 开始的选项下标，或 `"A"`/`"b"` 这样的选项字母
///
/// 判断题的答案统一为小写 `true`/`false`
fn normalize_answer(
    answer: &JsonValue,
    options: &[String],
    question_type: QuestionType,
) -> Option<String> {
    let text = match answer {
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => {
            let index = n.as_u64()? as usize;
            match options.get(index) {
                Some(option) => option.clone(),
                None => {
                    warn!("⚠️ 答案下标 {} 超出选项范围 [0, {})", index, options.len());
                    return None;
                }
            }
        }
        JsonValue::String(s) => option_by_letter(s, options).unwrap_or_else(|| s.clone()),
        _ => return None,
    };

    if question_type == QuestionType::TrueFalse {
        Some(text.trim().to_ascii_lowercase())
    } else {
        Some(text)
    }
}

/// 单个字母且本身不是选项时，按 A=0、B=1 映射到选项
fn option_by_letter(answer: &str, options: &[String]) -> Option<String> {
    if options.iter().any(|option| option == answer) {
        return None;
    }
    let mut chars = answer.trim().chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    if chars.next().is_some() {
        return None;
    }
    let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
    options.get(index).cloned()
}

const REGENERATION_KEYS: &[&str] = &["regenerations_used", "regenerate_count"];
const DELETION_KEYS: &[&str] = &["deletions_used", "delete_count"];

/// 解析配额使用量，缺失字段记为 0
pub fn normalize_quota(value: &JsonValue) -> QuotaUsage {
    normalize_quota_opt(value).unwrap_or_default()
}

/// 响应里完全没有计数字段时返回 `None`，调用方应重新读取测验记录
pub fn normalize_quota_opt(value: &JsonValue) -> Option<QuotaUsage> {
    let body = unwrap_envelope(value);
    let source = body.get("quota").filter(|q| q.is_object()).unwrap_or(body);
    let present = REGENERATION_KEYS
        .iter()
        .chain(DELETION_KEYS)
        .any(|key| source.get(*key).is_some_and(JsonValue::is_u64));
    if !present {
        return None;
    }
    Some(QuotaUsage {
        regenerations_used: first_u32(source, REGENERATION_KEYS),
        deletions_used: first_u32(source, DELETION_KEYS),
    })
}

/// 解析测验详情
pub fn normalize_quiz(endpoint: &str, value: &JsonValue) -> AppResult<Quiz> {
    let body = unwrap_envelope(value);
    let quiz = body.get("quiz").filter(|q| q.is_object()).unwrap_or(body);

    let id = quiz
        .get("id")
        .or_else(|| quiz.get("quiz_id"))
        .and_then(id_of)
        .ok_or_else(|| AppError::missing_field(endpoint, "id"))?;

    Ok(Quiz {
        id,
        title: first_str(quiz, &["title", "name"]).unwrap_or_default().to_string(),
        description: first_str(quiz, &["description"]).map(str::to_string),
        status: first_str(quiz, &["status"])
            .map(QuizStatus::parse)
            .unwrap_or(if quiz.get("published").and_then(JsonValue::as_bool) == Some(true) {
                QuizStatus::Published
            } else {
                QuizStatus::Draft
            }),
        questions: normalize_questions(body),
        quota: normalize_quota(quiz),
        created_at: parse_time(quiz, &["created_at"]),
    })
}

/// 解析测验列表
pub fn normalize_quiz_summaries(value: &JsonValue) -> Vec<QuizSummary> {
    let body = unwrap_envelope(value);
    let items = body
        .as_array()
        .or_else(|| body.get("quizzes").and_then(JsonValue::as_array));

    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(id_of)?;
            let question_count = item
                .get("question_count")
                .and_then(JsonValue::as_u64)
                .map(|n| n as usize)
                .unwrap_or_else(|| normalize_questions(item).len());
            Some(QuizSummary {
                id,
                title: first_str(item, &["title", "name"]).unwrap_or_default().to_string(),
                status: first_str(item, &["status"])
                    .map(QuizStatus::parse)
                    .unwrap_or(QuizStatus::Draft),
                question_count,
            })
        })
        .collect()
}

/// 解析作答记录
pub fn normalize_attempts(value: &JsonValue) -> Vec<Attempt> {
    let body = unwrap_envelope(value);
    let items = body
        .as_array()
        .or_else(|| body.get("attempts").and_then(JsonValue::as_array));

    let Some(items) = items else {
        return Vec::new();
    };

    items.iter().map(normalize_attempt).collect()
}

fn normalize_attempt(item: &JsonValue) -> Attempt {
    let student = first_str(item, &["student_name"])
        .or_else(|| item.get("student").and_then(|s| s.get("name")).and_then(JsonValue::as_str))
        .or_else(|| item.get("student").and_then(JsonValue::as_str))
        .or_else(|| item.get("user").and_then(|u| u.get("name")).and_then(JsonValue::as_str))
        .or_else(|| first_str(item, &["student_email"]))
        .unwrap_or("未知学生")
        .to_string();

    let answers = item
        .get("answers")
        .and_then(JsonValue::as_array)
        .map(|answers| {
            answers
                .iter()
                .filter_map(|answer| {
                    Some(AttemptAnswer {
                        question_id: answer.get("question_id").and_then(id_of)?,
                        is_correct: answer
                            .get("is_correct")
                            .or_else(|| answer.get("correct"))
                            .and_then(JsonValue::as_bool)
                            .unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Attempt {
        id: item.get("id").and_then(id_of),
        student,
        score: first_f64(item, &["score"]).unwrap_or(0.0),
        max_score: first_f64(item, &["max_score", "total"]).unwrap_or(0.0),
        submitted_at: parse_time(item, &["submitted_at", "completed_at"]),
        answers,
    }
}
