//! 成绩统计服务 - 业务能力层
//!
//! 只负责把作答记录汇总为整体 / 单题 / 单个学生的统计

use crate::models::{Attempt, Quiz};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// 单题统计
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStat {
    pub question_id: String,
    pub answered: usize,
    pub correct: usize,
}

impl QuestionStat {
    /// 正确率（百分比）
    pub fn correct_rate(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.answered as f64 * 100.0
        }
    }
}

/// 单个学生统计
#[derive(Debug, Clone, PartialEq)]
pub struct StudentResult {
    pub student: String,
    pub attempts: usize,
    pub best_percent: f64,
    pub latest_submitted_at: Option<DateTime<Utc>>,
}

/// 测验成绩汇总
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultsSummary {
    pub total_attempts: usize,
    pub unique_students: usize,
    pub average_percent: f64,
    pub highest_percent: f64,
    pub lowest_percent: f64,
    /// 达到及格线的作答占比
    pub pass_rate: f64,
    pub questions: Vec<QuestionStat>,
    pub students: Vec<StudentResult>,
}

/// 汇总作答记录
///
/// 提供 `quiz` 时单题统计按测验题目顺序排列（含无人作答的题目），
/// 否则按首次出现顺序。
pub fn summarize(attempts: &[Attempt], quiz: Option<&Quiz>, pass_mark_percent: f64) -> ResultsSummary {
    if attempts.is_empty() {
        return ResultsSummary {
            questions: question_stats(attempts, quiz),
            ..Default::default()
        };
    }

    let percents: Vec<f64> = attempts.iter().map(Attempt::percent).collect();
    let total = percents.len() as f64;
    let average_percent = percents.iter().sum::<f64>() / total;
    let highest_percent = percents.iter().copied().fold(f64::MIN, f64::max);
    let lowest_percent = percents.iter().copied().fold(f64::MAX, f64::min);
    let passed = percents.iter().filter(|p| **p >= pass_mark_percent).count();

    ResultsSummary {
        total_attempts: attempts.len(),
        unique_students: attempts
            .iter()
            .map(|a| a.student.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len(),
        average_percent,
        highest_percent,
        lowest_percent,
        pass_rate: passed as f64 / total * 100.0,
        questions: question_stats(attempts, quiz),
        students: student_results(attempts),
    }
}

fn question_order(quiz: &Quiz) -> Vec<String> {
    quiz.questions.iter().filter_map(|q| q.id.clone()).collect()
}

fn question_stats(attempts: &[Attempt], quiz: Option<&Quiz>) -> Vec<QuestionStat> {
    let mut order: Vec<String> = quiz.map(question_order).unwrap_or_default();
    let mut stats: HashMap<String, (usize, usize)> = HashMap::new();

    for answer in attempts.iter().flat_map(|a| &a.answers) {
        let entry = stats.entry(answer.question_id.clone()).or_insert_with(|| {
            if !order.contains(&answer.question_id) {
                order.push(answer.question_id.clone());
            }
            (0, 0)
        });
        entry.0 += 1;
        if answer.is_correct {
            entry.1 += 1;
        }
    }

    order
        .into_iter()
        .map(|question_id| {
            let (answered, correct) = stats.get(&question_id).copied().unwrap_or((0, 0));
            QuestionStat {
                question_id,
                answered,
                correct,
            }
        })
        .collect()
}

fn student_results(attempts: &[Attempt]) -> Vec<StudentResult> {
    let mut by_student: BTreeMap<&str, StudentResult> = BTreeMap::new();

    for attempt in attempts {
        let percent = attempt.percent();
        let entry = by_student
            .entry(attempt.student.as_str())
            .or_insert_with(|| StudentResult {
                student: attempt.student.clone(),
                attempts: 0,
                best_percent: percent,
                latest_submitted_at: None,
            });
        entry.attempts += 1;
        entry.best_percent = entry.best_percent.max(percent);
        entry.latest_submitted_at = entry.latest_submitted_at.max(attempt.submitted_at);
    }

    by_student.into_values().collect()
}

/// 输出成绩报告
pub fn log_summary(quiz_id: &str, summary: &ResultsSummary) {
    info!("{}", "=".repeat(60));
    info!("📊 测验 {} 成绩报告", quiz_id);
    info!("{}", "=".repeat(60));
    if summary.total_attempts == 0 {
        info!("暂无作答记录");
        return;
    }
    info!(
        "作答次数: {}，学生人数: {}",
        summary.total_attempts, summary.unique_students
    );
    info!(
        "平均分: {:.1}%，最高: {:.1}%，最低: {:.1}%，及格率: {:.1}%",
        summary.average_percent, summary.highest_percent, summary.lowest_percent, summary.pass_rate
    );
    for (i, stat) in summary.questions.iter().enumerate() {
        info!(
            "  第 {} 题 (id {}): 正确 {}/{} ({:.1}%)",
            i + 1,
            stat.question_id,
            stat.correct,
            stat.answered,
            stat.correct_rate()
        );
    }
    for student in &summary.students {
        info!(
            "  {}: 作答 {} 次，最好成绩 {:.1}%",
            student.student, student.attempts, student.best_percent
        );
    }
}
