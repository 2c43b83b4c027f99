//! 测验创建流程 - 流程层
//!
//! 核心职责：定义"一个任务"的完整处理流程
//!
//! 流程顺序：
//! 1. 校验所有页码范围（任一不合法则不发出任何请求）
//! 2. 创建测验 → 上传文档 → 生成题目
//! 3. 读取测验确认题目数量
//! 4. 按任务要求发布

use crate::clients::QuizClient;
use crate::config::{Config, QuotaLimits};
use crate::error::{AppResult, ValidationError};
use crate::models::{DocumentUpload, GenerateRequest, NewQuiz, Quiz, QuizJob};
use crate::services::{page_range_entries, UploadService};
use crate::workflow::edit_session::EditSession;
use crate::workflow::job_ctx::JobCtx;
use tracing::{info, warn};

/// 任务处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
    pub quiz: Quiz,
    pub uploaded: usize,
    pub published: bool,
}

/// 测验创建流程
///
/// - 编排 创建/上传/生成/发布 的顺序
/// - 只依赖客户端和业务能力（services）
pub struct QuizFlow {
    client: QuizClient,
    upload_service: UploadService,
    quota_limits: QuotaLimits,
    verbose_logging: bool,
}

impl QuizFlow {
    pub fn new(client: QuizClient, config: &Config) -> Self {
        Self {
            upload_service: UploadService::new(client.clone(), config.max_concurrent_uploads),
            client,
            quota_limits: config.quota,
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, job: &QuizJob, ctx: &JobCtx) -> AppResult<FlowOutcome> {
        // ========== 步骤 1: 本地校验 ==========
        let documents = self.prepare_documents(job, ctx)?;

        // ========== 步骤 2: 创建测验 ==========
        let new_quiz = NewQuiz {
            title: job.title.clone(),
            description: job.description.clone(),
            num_questions: job.num_questions,
        };
        let created = self.client.create_quiz(&new_quiz).await?;
        let ctx = ctx.clone().with_quiz_id(&created.id);
        info!("{} ✓ 测验已创建: 《{}》", ctx, created.title);

        // ========== 步骤 3: 上传文档 ==========
        let receipts = self.upload_service.upload_all(&created.id, &documents).await?;
        info!("{} ✓ {} 个文档上传完成", ctx, receipts.len());

        // ========== 步骤 4: 生成题目 ==========
        let request = GenerateRequest {
            documents: page_range_entries(&documents),
            num_questions: job.num_questions,
        };
        info!(
            "{} 🧠 请求生成 {} 道题目 ({} 个文档指定了页码)",
            ctx,
            request.num_questions,
            request.documents.len()
        );
        self.client.generate_questions(&created.id, &request).await?;

        // ========== 步骤 5: 确认结果 ==========
        let quiz = self.client.fetch_quiz(&created.id).await?;
        self.log_generated(&ctx, &quiz, &documents, job.num_questions);

        // ========== 步骤 6: 发布 ==========
        if !job.publish {
            return Ok(FlowOutcome {
                quiz,
                uploaded: receipts.len(),
                published: false,
            });
        }

        let mut session = EditSession::new(self.client.clone(), quiz, self.quota_limits);
        let quiz = session.publish().await?;
        info!("{} 📢 已发布", ctx);

        Ok(FlowOutcome {
            quiz,
            uploaded: receipts.len(),
            published: true,
        })
    }

    /// 解析并校验任务中的全部文档
    fn prepare_documents(&self, job: &QuizJob, ctx: &JobCtx) -> AppResult<Vec<DocumentUpload>> {
        if job.documents.is_empty() {
            return Err(ValidationError::NoDocuments {
                title: job.title.clone(),
            }
            .into());
        }

        let documents = job.document_uploads()?;
        for document in &documents {
            if !document.path.exists() {
                warn!("{} ⚠️ 文件不存在: {}", ctx, document.path.display());
            }
        }
        Ok(documents)
    }

    fn log_generated(&self, ctx: &JobCtx, quiz: &Quiz, documents: &[DocumentUpload], expected: u32) {
        info!(
            "{} ✓ 生成完成: {} 道题目 (请求 {} 道)",
            ctx,
            quiz.questions.len(),
            expected
        );

        for document in documents {
            if let Some(selection) = &document.page_selection {
                info!("{}   📄 {}: {}", ctx, document.filename, selection.preview());
            }
        }

        if self.verbose_logging {
            for (index, question) in quiz.questions.iter().enumerate() {
                info!(
                    "{}   {}. [{}] {}",
                    ctx,
                    index + 1,
                    question.question_type.name(),
                    crate::utils::clip_for_log(&question.text, 60)
                );
            }
        }
    }
}
