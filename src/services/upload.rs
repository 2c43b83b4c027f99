//! 文档上传服务 - 业务能力层
//!
//! 只负责"把一组已校验的文档传上去"，限制同时上传的数量

use crate::clients::QuizClient;
use crate::error::AppResult;
use crate::models::{DocumentUpload, PageRangeEntry, UploadReceipt};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

/// 文档上传服务
pub struct UploadService {
    client: QuizClient,
    max_concurrent: usize,
}

impl UploadService {
    pub fn new(client: QuizClient, max_concurrent: usize) -> Self {
        Self {
            client,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// 上传全部文档，回执顺序与输入一致
    ///
    /// 任一文件失败即返回错误
    pub async fn upload_all(
        &self,
        quiz_id: &str,
        documents: &[DocumentUpload],
    ) -> AppResult<Vec<UploadReceipt>> {
        info!(
            "📁 开始上传 {} 个文档 (并发 {})",
            documents.len(),
            self.max_concurrent
        );

        // 先收集 future，再交给 buffered；闭包形式的组合器在 tokio::spawn 里过不了 Send 检查
        let uploads: Vec<_> = documents
            .iter()
            .map(|document| self.client.upload_document(quiz_id, document))
            .collect();

        stream::iter(uploads)
            .buffered(self.max_concurrent)
            .try_collect()
            .await
    }
}

/// 生成请求里的页码范围列表
///
/// 只包含指定了页码的 PDF，值为用户输入的原文
pub fn page_range_entries(documents: &[DocumentUpload]) -> Vec<PageRangeEntry> {
    documents
        .iter()
        .filter_map(|document| {
            document.page_range().map(|range| PageRangeEntry {
                filename: document.filename.clone(),
                page_range: range.to_string(),
            })
        })
        .collect()
}
