use crate::error::AppResult;
use crate::models::document::DocumentUpload;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_num_questions() -> u32 {
    10
}

/// 任务中的一个文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDocument {
    /// 相对路径以任务文件所在目录为基准
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_range: Option<String>,
}

/// 一个测验创建任务（对应一个 TOML 文件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizJob {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    /// 生成完成后直接发布
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub documents: Vec<JobDocument>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl QuizJob {
    /// 解析文档路径并校验所有页码范围
    ///
    /// 任一文档不合法时整个任务都不提交
    pub fn document_uploads(&self) -> AppResult<Vec<DocumentUpload>> {
        let base_dir = self
            .file_path
            .as_deref()
            .and_then(|p| Path::new(p).parent())
            .map(Path::to_path_buf);

        self.documents
            .iter()
            .map(|doc| {
                let path = resolve_path(base_dir.as_deref(), &doc.path);
                DocumentUpload::new(path, doc.page_range.as_deref())
            })
            .collect()
    }
}

fn resolve_path(base_dir: Option<&Path>, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}
