//! 页码范围解析与校验
//!
//! 把用户输入的 `"1-5,7,10-15"` 解析为按需展开的升序页码。
//! 纯函数，无共享状态，可在每次输入变化时调用。

use regex::Regex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// 整体语法：`term (',' term)*`，`term := INT | INT '-' INT`
static PAGE_RANGE_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(-\d+)?)(,\d+(-\d+)?)*$").expect("页码范围正则必须合法")
});

/// 超过该数量时只展示前 [`PREVIEW_HEAD`] 个页码
pub const PREVIEW_THRESHOLD: usize = 20;
/// 折叠展示时保留的页码数量
pub const PREVIEW_HEAD: usize = 10;

/// 页码范围错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRangeErrorKind {
    MalformedSpec,
    InvertedRange,
    NonPositivePage,
}

/// 页码范围校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    /// 不符合 `1-5,7` 这种格式
    #[error("格式无效 '{input}'，应为类似 1-5,7,10-15 的格式")]
    MalformedSpec { input: String },
    /// 起始页大于结束页
    #[error("起始页 {start} 大于结束页 {end}")]
    InvertedRange { start: u32, end: u32 },
    /// 页码必须大于 0
    #[error("页码必须大于 0，实际为 {page}")]
    NonPositivePage { page: u32 },
}

impl PageRangeError {
    pub fn kind(&self) -> PageRangeErrorKind {
        match self {
            PageRangeError::MalformedSpec { .. } => PageRangeErrorKind::MalformedSpec,
            PageRangeError::InvertedRange { .. } => PageRangeErrorKind::InvertedRange,
            PageRangeError::NonPositivePage { .. } => PageRangeErrorKind::NonPositivePage,
        }
    }
}

/// 单个范围项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Single(u32),
    Range(u32, u32),
}

impl Term {
    fn bounds(self) -> (u32, u32) {
        match self {
            Term::Single(page) => (page, page),
            Term::Range(start, end) => (start, end),
        }
    }
}

/// 校验通过的页码选择
///
/// `raw` 原样发送给后端。页码不预先展开，`1-4294967295` 也只占两个数字。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSelection {
    raw: String,
    terms: Vec<Term>,
}

impl PageSelection {
    /// 用户输入的原始字符串
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 展开后的页码数量（含重复）
    pub fn page_count(&self) -> u64 {
        self.terms
            .iter()
            .map(|term| {
                let (start, end) = term.bounds();
                u64::from(end - start) + 1
            })
            .sum()
    }

    /// 按升序逐个产出页码，保留重复
    pub fn iter_pages(&self) -> SortedPages {
        SortedPages::new(&self.terms)
    }

    /// 展开成列表；范围很大时请改用 [`Self::iter_pages`]
    pub fn pages(&self) -> Vec<u32> {
        self.iter_pages().collect()
    }

    /// 空输入表示不限制页码
    pub fn is_all_pages(&self) -> bool {
        self.raw.is_empty()
    }

    /// 展示用的页码摘要
    pub fn preview(&self) -> String {
        if self.is_all_pages() {
            return "全部页".to_string();
        }
        fold_preview(self.page_count(), self.iter_pages())
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview())
    }
}

/// 多个区间的有序归并
///
/// 堆里每个区间只放一个游标 `(下一页, 结束页)`，内存与范围项数量成正比
#[derive(Debug, Clone)]
pub struct SortedPages {
    heap: BinaryHeap<Reverse<(u32, u32)>>,
}

impl SortedPages {
    fn new(terms: &[Term]) -> Self {
        Self {
            heap: terms.iter().map(|term| Reverse(term.bounds())).collect(),
        }
    }
}

impl Iterator for SortedPages {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let Reverse((page, end)) = self.heap.pop()?;
        if page < end {
            self.heap.push(Reverse((page + 1, end)));
        }
        Some(page)
    }
}

/// 解析并校验页码范围
///
/// 空字符串合法，表示全部页。遇到第一个不合法的范围项即返回。
pub fn parse_page_range(input: &str) -> Result<PageSelection, PageRangeError> {
    if input.is_empty() {
        return Ok(PageSelection::default());
    }

    if !PAGE_RANGE_GRAMMAR.is_match(input) {
        return Err(PageRangeError::MalformedSpec {
            input: input.to_string(),
        });
    }

    // 逐项检查：起始页不得大于结束页，起始页必须为正
    let mut terms = Vec::new();
    for raw_term in input.split(',') {
        let term = parse_term(input, raw_term)?;
        match term {
            Term::Range(start, end) => {
                if start > end {
                    return Err(PageRangeError::InvertedRange { start, end });
                }
                if start == 0 {
                    return Err(PageRangeError::NonPositivePage { page: start });
                }
            }
            Term::Single(page) => {
                if page == 0 {
                    return Err(PageRangeError::NonPositivePage { page });
                }
            }
        }
        terms.push(term);
    }

    Ok(PageSelection {
        raw: input.to_string(),
        terms,
    })
}

/// 只判断是否合法
pub fn is_valid_page_range(input: &str) -> bool {
    parse_page_range(input).is_ok()
}

/// 折叠展示页码列表：超过 20 个时只显示前 10 个和 `+N more`
pub fn format_page_preview(pages: &[u32]) -> String {
    fold_preview(pages.len() as u64, pages.iter().copied())
}

fn fold_preview(count: u64, pages: impl Iterator<Item = u32>) -> String {
    let folded = count > PREVIEW_THRESHOLD as u64;
    let shown = if folded { PREVIEW_HEAD } else { PREVIEW_THRESHOLD };
    let head = pages
        .take(shown)
        .map(|page| page.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    if folded {
        format!("{} +{} more", head, count - PREVIEW_HEAD as u64)
    } else {
        head
    }
}

/// 语法已通过，数字仍可能超出 u32
fn parse_term(input: &str, term: &str) -> Result<Term, PageRangeError> {
    let number = |s: &str| {
        s.parse::<u32>().map_err(|_| PageRangeError::MalformedSpec {
            input: input.to_string(),
        })
    };

    match term.split_once('-') {
        Some((start, end)) => Ok(Term::Range(number(start)?, number(end)?)),
        None => Ok(Term::Single(number(term)?)),
    }
}
