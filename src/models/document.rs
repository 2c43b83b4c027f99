//! 上传文档
//!
//! 根据扩展名判断文件类型，只有 PDF 支持按页码选择

use crate::error::{AppResult, ValidationError};
use crate::validation::{parse_page_range, PageSelection};
use phf::phf_map;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Word,
    PowerPoint,
    PlainText,
    Markdown,
}

static EXTENSION_KINDS: phf::Map<&'static str, DocumentKind> = phf_map! {
    "pdf" => DocumentKind::Pdf,
    "doc" => DocumentKind::Word,
    "docx" => DocumentKind::Word,
    "ppt" => DocumentKind::PowerPoint,
    "pptx" => DocumentKind::PowerPoint,
    "txt" => DocumentKind::PlainText,
    "md" => DocumentKind::Markdown,
    "markdown" => DocumentKind::Markdown,
};

impl DocumentKind {
    /// 从文件名判断类型（扩展名不区分大小写）
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        EXTENSION_KINDS.get(ext.as_str()).copied()
    }

    /// 是否支持指定页码
    pub fn supports_page_selection(self) -> bool {
        self == DocumentKind::Pdf
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Word => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            DocumentKind::PowerPoint => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Markdown => "text/markdown",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Word => "Word",
            DocumentKind::PowerPoint => "PowerPoint",
            DocumentKind::PlainText => "文本",
            DocumentKind::Markdown => "Markdown",
        };
        f.write_str(name)
    }
}

/// 待上传的文档
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    pub path: PathBuf,
    pub filename: String,
    pub kind: DocumentKind,
    /// 只有 PDF 才会保留；已校验
    pub page_selection: Option<PageSelection>,
}

impl DocumentUpload {
    /// 构建上传项并校验页码范围
    ///
    /// 非 PDF 文件上的页码范围会被忽略
    pub fn new(path: impl Into<PathBuf>, page_range: Option<&str>) -> AppResult<Self> {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let kind = DocumentKind::from_filename(&filename).ok_or_else(|| {
            ValidationError::UnsupportedDocument {
                filename: filename.clone(),
            }
        })?;

        let raw = page_range.unwrap_or("");
        let page_selection = if kind.supports_page_selection() {
            let selection = parse_page_range(raw).map_err(|source| ValidationError::PageRange {
                filename: filename.clone(),
                source,
            })?;
            Some(selection)
        } else {
            if !raw.is_empty() {
                warn!("⚠️ {} 是 {} 文件，不支持指定页码，忽略页码范围 '{}'", filename, kind, raw);
            }
            None
        };

        Ok(Self {
            path,
            filename,
            kind,
            page_selection,
        })
    }

    /// 需要发送给后端的页码范围原文；全部页时为 `None`
    pub fn page_range(&self) -> Option<&str> {
        self.page_selection
            .as_ref()
            .filter(|selection| !selection.is_all_pages())
            .map(PageSelection::raw)
    }
}
