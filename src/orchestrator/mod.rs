//! 编排层
//!
//! - `batch_processor`: 应用入口，持有 HTTP 客户端，分批并发处理任务
//! - `job_processor`: 单个任务的日志与失败兜底

pub mod batch_processor;
pub mod job_processor;

pub use batch_processor::{App, ProcessingStats};
