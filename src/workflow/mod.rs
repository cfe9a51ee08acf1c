pub mod submission_ctx;
pub mod submission_flow;

pub use submission_ctx::SubmissionCtx;
pub use submission_flow::{RetryPolicy, SubmissionFlow, CANCELLED, MAX_ERROR_CHARS};
