//! 单个任务处理器 - 编排层
//!
//! 负责一个任务从开始到结束的日志与兜底：
//! 委托 `QuizFlow` 执行，失败时写入 warn 文件。

use crate::models::QuizJob;
use crate::services::WarnWriter;
use crate::workflow::{FlowOutcome, JobCtx, QuizFlow};
use anyhow::Result;
use tracing::{error, info};

/// 处理单个任务
///
/// # 返回
/// 返回是否成功处理；失败原因已写入 warn 文件
pub async fn process_job(
    flow: &QuizFlow,
    warn_writer: &WarnWriter,
    job: QuizJob,
    job_index: usize,
) -> Result<bool> {
    let job_name = job
        .file_path
        .as_deref()
        .and_then(|p| std::path::Path::new(p).file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| job.title.clone());
    let ctx = JobCtx::new(job_index, job_name);

    log_job_start(&ctx, &job);

    match flow.run(&job, &ctx).await {
        Ok(outcome) => {
            log_job_complete(&ctx, &outcome);
            Ok(true)
        }
        Err(e) => {
            if e.is_user_error() {
                error!("{} ❌ 任务内容有误: {}", ctx, e);
            } else {
                error!("{} ❌ 处理过程中发生错误: {}", ctx, e);
            }
            warn_writer.write(&ctx.job_name, &e.to_string()).await?;
            Ok(false)
        }
    }
}

fn log_job_start(ctx: &JobCtx, job: &QuizJob) {
    info!("{} {}", ctx, "─".repeat(40));
    info!("{} 📝 《{}》 ({})", ctx, job.title, ctx.job_name);
    info!(
        "{} 文档 {} 个，题目 {} 道，发布: {}",
        ctx,
        job.documents.len(),
        job.num_questions,
        if job.publish { "是" } else { "否" }
    );
}

fn log_job_complete(ctx: &JobCtx, outcome: &FlowOutcome) {
    info!(
        "{} ✅ 完成: 测验 {} ({}) 共 {} 道题目，上传 {} 个文档",
        ctx,
        outcome.quiz.id,
        outcome.quiz.status,
        outcome.quiz.questions.len(),
        outcome.uploaded
    );
}
