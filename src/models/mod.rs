pub mod attempt;
pub mod document;
pub mod job;
pub mod loaders;
pub mod question;
pub mod quiz;

pub use attempt::{Attempt, AttemptAnswer};
pub use document::{DocumentKind, DocumentUpload};
pub use job::{JobDocument, QuizJob};
pub use loaders::{load_all_jobs, load_job};
pub use question::{Question, QuestionPatch, QuestionType};
pub use quiz::{
    GenerateRequest, NewQuiz, PageRangeEntry, Quiz, QuizStatus, QuizSummary, QuizUpdate,
    QuotaUsage, RegenerateOutcome, UploadReceipt,
};
