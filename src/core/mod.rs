//! 核心层：错误分类与退避策略

pub mod backoff;
pub mod error;

pub use backoff::{BackoffPolicy, RetryDecision, RetryState};
pub use error::{FailureKind, ResearchError};
