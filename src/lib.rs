//! # Quiz Admin
//!
//! 测验管理后台的命令行客户端：根据任务文件批量创建测验、上传讲义、生成并发布题目，
//! 并提供编辑会话和成绩统计。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有唯一的 HTTP 客户端，只暴露"发请求拿 JSON"能力
//! - `HttpExecutor` - 认证头、429 重试、错误响应解析
//!
//! ### ② 客户端与业务能力层（Clients / Services）
//! - `clients/` - `QuizClient`，后端接口一一对应
//! - `services/` - 响应归一化、配额跟踪、并发上传、成绩统计、写 warn 文件
//! - `validation/` - 页码范围校验
//!
//! ### ③ 流程层（Workflow）
//! - `JobCtx` - 上下文封装（任务序号 + 测验ID）
//! - `QuizFlow` - 校验 → 创建 → 上传 → 生成 → 发布
//! - `EditSession` - 本地编辑与服务端同步
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量任务处理器，管理资源和并发
//! - `orchestrator/job_processor` - 单个任务处理器

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod validation;
pub mod workflow;

// 重新导出常用类型
pub use clients::QuizClient;
pub use config::{Config, QuotaLimits};
pub use error::{AppError, AppResult};
pub use infrastructure::HttpExecutor;
pub use models::{DocumentUpload, Question, QuestionPatch, Quiz, QuizJob};
pub use orchestrator::App;
pub use validation::{parse_page_range, PageRangeError, PageSelection};
pub use workflow::{EditSession, JobCtx, QuizFlow};
