//! 测验编辑会话 - 流程层
//!
//! 维护一份本地工作副本：改题、加题、改标题只在本地生效，
//! 删除和重新生成会立即发到服务端并以服务端结果为准，
//! `save()` 一次性提交合并后的完整题目列表。

use crate::clients::QuizClient;
use crate::config::QuotaLimits;
use crate::error::{AppResult, ValidationError};
use crate::models::{Question, QuestionPatch, Quiz, QuizUpdate};
use crate::services::QuotaTracker;
use tracing::{debug, info};

/// 测验编辑会话
pub struct EditSession {
    client: QuizClient,
    /// 服务端最近一次确认的测验
    baseline: Quiz,
    questions: Vec<Question>,
    title: Option<String>,
    description: Option<String>,
    quota: QuotaTracker,
    dirty: bool,
}

impl EditSession {
    /// 以已获取的测验为基线创建会话
    pub fn new(client: QuizClient, quiz: Quiz, limits: QuotaLimits) -> Self {
        let quota = QuotaTracker::from_quiz(limits, &quiz);
        Self {
            client,
            questions: quiz.questions.clone(),
            baseline: quiz,
            title: None,
            description: None,
            quota,
            dirty: false,
        }
    }

    /// 从服务端读取测验后创建会话
    pub async fn open(client: QuizClient, quiz_id: &str, limits: QuotaLimits) -> AppResult<Self> {
        let quiz = client.fetch_quiz(quiz_id).await?;
        info!(
            "📝 打开测验 {} 《{}》: {} 道题目",
            quiz.id,
            quiz.title,
            quiz.questions.len()
        );
        Ok(Self::new(client, quiz, limits))
    }

    pub fn quiz_id(&self) -> &str {
        &self.baseline.id
    }

    /// 服务端最近一次确认的测验
    pub fn baseline(&self) -> &Quiz {
        &self.baseline
    }

    /// 当前工作副本中的题目
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
        self.dirty = true;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
        self.dirty = true;
    }

    /// 修改一道题目，修改后的题目必须仍然合法
    pub fn edit_question(&mut self, question_id: &str, patch: &QuestionPatch) -> AppResult<()> {
        let index = self.position(question_id)?;
        if patch.is_empty() {
            return Ok(());
        }

        let updated = patch.apply_to(&self.questions[index]);
        updated.validate()?;

        self.questions[index] = updated;
        self.dirty = true;
        Ok(())
    }

    /// 新增一道题目，保存时由服务端分配 id
    pub fn add_question(&mut self, question: Question) -> AppResult<()> {
        question.validate()?;
        self.questions.push(question);
        self.dirty = true;
        Ok(())
    }

    /// 删除一道题目
    ///
    /// 先在本地检查配额，再由服务端执行，计数以服务端返回为准
    pub async fn delete_question(&mut self, question_id: &str) -> AppResult<()> {
        self.position(question_id)?;
        self.quota.check_delete()?;

        let usage = self.client.delete_question(self.quiz_id(), question_id).await?;
        self.quota.sync(usage);

        let keep = |q: &Question| q.id.as_deref() != Some(question_id);
        self.questions.retain(keep);
        self.baseline.questions.retain(keep);
        self.baseline.quota = usage;

        info!(
            "🗑️ 已删除题目 {} (删除次数 {}/{})",
            question_id,
            self.quota.usage().deletions_used,
            self.quota.limits().max_deletions
        );
        Ok(())
    }

    /// 重新生成一道题目，返回新题目
    ///
    /// 该题目未保存的本地修改会被新题目覆盖
    pub async fn regenerate_question(&mut self, question_id: &str) -> AppResult<&Question> {
        let index = self.position(question_id)?;
        self.quota.check_regenerate()?;

        let outcome = self
            .client
            .regenerate_question(self.quiz_id(), question_id)
            .await?;
        self.quota.sync(outcome.quota);
        self.baseline.quota = outcome.quota;

        let mut question = outcome.question;
        if question.id.is_none() {
            question.id = Some(question_id.to_string());
        }

        if let Some(slot) = self
            .baseline
            .questions
            .iter_mut()
            .find(|q| q.id.as_deref() == Some(question_id))
        {
            *slot = question.clone();
        }
        self.questions[index] = question;

        info!(
            "🔄 已重新生成题目 {} (重新生成次数 {}/{})",
            question_id,
            self.quota.usage().regenerations_used,
            self.quota.limits().max_regenerations
        );
        Ok(&self.questions[index])
    }

    /// 待提交的更新内容
    pub fn pending_update(&self) -> QuizUpdate {
        QuizUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            questions: self.questions.clone(),
            documents: Vec::new(),
        }
    }

    /// 保存本地修改，返回是否真的发送了请求
    pub async fn save(&mut self) -> AppResult<bool> {
        if !self.dirty {
            debug!("测验 {} 没有未保存的修改", self.quiz_id());
            return Ok(false);
        }

        for question in self.changed_questions() {
            question.validate()?;
        }

        let update = self.pending_update();
        let quiz = self.client.update_quiz(self.quiz_id(), &update).await?;
        info!("💾 测验 {} 已保存: {} 道题目", quiz.id, quiz.questions.len());

        self.reset_to(quiz);
        Ok(true)
    }

    /// 保存后发布
    pub async fn publish(&mut self) -> AppResult<Quiz> {
        self.save().await?;

        if self.questions.is_empty() {
            return Err(ValidationError::EmptyQuiz {
                quiz_id: self.quiz_id().to_string(),
            }
            .into());
        }

        let quiz = self.client.publish_quiz(self.quiz_id()).await?;
        info!("📢 测验 {} 已发布 (状态: {})", quiz.id, quiz.status);

        self.reset_to(quiz.clone());
        Ok(quiz)
    }

    /// 本地新增或改动过的题目
    ///
    /// 服务端生成且未被改动的题目原样提交，不在本地重新校验
    fn changed_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |question| match question.id.as_deref() {
            Some(id) => self.baseline.question(id) != Some(*question),
            None => true,
        })
    }

    fn position(&self, question_id: &str) -> AppResult<usize> {
        self.questions
            .iter()
            .position(|q| q.id.as_deref() == Some(question_id))
            .ok_or_else(|| {
                ValidationError::UnknownQuestion {
                    id: question_id.to_string(),
                }
                .into()
            })
    }

    fn reset_to(&mut self, quiz: Quiz) {
        self.quota.sync(quiz.quota);
        self.questions = quiz.questions.clone();
        self.baseline = quiz;
        self.title = None;
        self.description = None;
        self.dirty = false;
    }
}
