pub mod edit_session;
pub mod job_ctx;
pub mod quiz_flow;

pub use edit_session::EditSession;
pub use job_ctx::JobCtx;
pub use quiz_flow::{FlowOutcome, QuizFlow};
