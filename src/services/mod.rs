pub mod normalizer;
pub mod quota;
pub mod results;
pub mod upload;
pub mod warn_writer;

pub use quota::QuotaTracker;
pub use results::{summarize, QuestionStat, ResultsSummary, StudentResult};
pub use upload::{page_range_entries, UploadService};
pub use warn_writer::WarnWriter;
