//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量任务的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、创建 HttpExecutor 和 QuizClient
//! 2. **批量加载**：扫描并加载所有任务（`Vec<QuizJob>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量，分批处理
//! 4. **成绩报告**：为配置中的测验输出作答统计
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一创建 HTTP 客户端的模块
//! - **向下委托**：委托 job_processor 处理单个任务

use crate::clients::QuizClient;
use crate::config::Config;
use crate::infrastructure::HttpExecutor;
use crate::models::QuizJob;
use crate::orchestrator::job_processor;
use crate::services::{results, WarnWriter};
use crate::utils::logging;
use crate::workflow::QuizFlow;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    client: QuizClient,
    flow: Arc<QuizFlow>,
    warn_writer: Arc<WarnWriter>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;

        let executor = HttpExecutor::new(&config)?;
        logging::log_startup(executor.base_url(), config.max_concurrent_jobs);
        let client = QuizClient::new(executor);
        let flow = Arc::new(QuizFlow::new(client.clone(), &config));
        let warn_writer = Arc::new(WarnWriter::with_path(config.warn_file.clone()));

        Ok(Self {
            config,
            client,
            flow,
            warn_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let all_jobs = self.load_jobs().await?;

        let stats = if all_jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的任务文件");
            ProcessingStats::default()
        } else {
            logging::log_jobs_loaded(all_jobs.len(), self.config.max_concurrent_jobs);
            let stats = self.process_all_jobs(all_jobs).await?;
            logging::log_run_summary(
                stats.success,
                stats.failed,
                stats.total,
                &self.config.warn_file,
                &self.config.output_log_file,
            );
            stats
        };

        self.report_results().await;

        Ok(stats)
    }

    async fn load_jobs(&self) -> Result<Vec<QuizJob>> {
        info!("📁 正在扫描任务目录 {} ...", self.config.jobs_folder);
        crate::models::load_all_jobs(&self.config.jobs_folder).await
    }

    /// 处理所有任务
    async fn process_all_jobs(&self, all_jobs: Vec<QuizJob>) -> Result<ProcessingStats> {
        let batch_size = self.config.max_concurrent_jobs;
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_jobs = all_jobs.len();
        let total_batches = total_jobs.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total: total_jobs,
            ..Default::default()
        };

        for (batch_index, batch_jobs) in all_jobs.chunks(batch_size).enumerate() {
            let batch_start = batch_index * batch_size;
            let batch_num = batch_index + 1;

            logging::log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch_jobs.len(),
                total_jobs,
            );

            let batch_result = self
                .process_batch(batch_jobs, batch_start, semaphore.clone())
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            logging::log_batch_complete(
                batch_num,
                batch_result.success,
                batch_result.success + batch_result.failed,
            );
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_jobs: &[QuizJob],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut batch_handles = Vec::new();

        for (idx, job) in batch_jobs.iter().enumerate() {
            let job_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let flow = self.flow.clone();
            let warn_writer = self.warn_writer.clone();
            let job = job.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                job_processor::process_job(&flow, &warn_writer, job, job_index).await
            });
            batch_handles.push((job_index, handle));
        }

        let mut result = BatchResult::default();

        for (job_index, handle) in batch_handles {
            match handle.await {
                Ok(Ok(true)) => result.success += 1,
                Ok(Ok(false)) => result.failed += 1,
                Ok(Err(e)) => {
                    error!("[任务 {}] 写入警告文件失败: {}", job_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[任务 {}] 任务执行失败: {}", job_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }

    /// 输出配置中各测验的成绩统计
    async fn report_results(&self) {
        for quiz_id in &self.config.report_quiz_ids {
            if let Err(e) = self.report_quiz(quiz_id).await {
                error!("[测验 {}] ❌ 获取成绩失败: {}", quiz_id, e);
            }
        }
    }

    async fn report_quiz(&self, quiz_id: &str) -> Result<()> {
        let quiz = self.client.fetch_quiz(quiz_id).await?;
        let attempts = self.client.fetch_attempts(quiz_id).await?;
        let summary = results::summarize(&attempts, Some(&quiz), self.config.pass_mark_percent);
        results::log_summary(quiz_id, &summary);
        Ok(())
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}
