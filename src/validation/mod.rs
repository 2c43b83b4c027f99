//! 输入校验
//!
//! 所有页面共用的用户输入校验逻辑

pub mod page_range;

pub use page_range::{
    format_page_preview, is_valid_page_range, parse_page_range, PageRangeError,
    PageRangeErrorKind, PageSelection, SortedPages,
};
