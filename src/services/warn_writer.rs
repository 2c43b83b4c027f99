//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 警告写入服务
///
/// 职责：
/// - 将失败的任务追加写入 warn 文件
/// - 只处理单个任务的警告
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用默认文件 warn.txt
    pub fn new() -> Self {
        Self::with_path("warn.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 写入警告信息
    ///
    /// # 参数
    /// - `job_name`: 任务名称（通常是 TOML 文件名）
    /// - `reason`: 失败原因
    pub async fn write(&self, job_name: &str, reason: &str) -> Result<()> {
        debug!("写入警告: 任务 {} | 原因: {}", job_name, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .with_context(|| format!("无法打开警告文件: {}", self.warn_file_path))?;

        let warn_msg = format!(
            "[{}] 任务 {} | 原因: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            job_name,
            reason
        );

        file.write_all(warn_msg.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_appends_lines() {
        let path = std::env::temp_dir().join(format!("quiz_admin_warn_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let writer = WarnWriter::with_path(path.to_string_lossy().to_string());
        writer.write("a.toml", "页码范围无效").await.unwrap();
        writer.write("b.toml", "上传失败").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("任务 a.toml | 原因: 页码范围无效"));
        assert!(lines[1].contains("b.toml"));

        let _ = std::fs::remove_file(&path);
    }
}
