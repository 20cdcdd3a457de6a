//! Harness-level primitives shared by concurrent evaluation workers: the
//! append-only answer log and the per-question wall-clock budget.

pub mod results;
pub mod timeout;

pub use results::{AnswerLog, AnswerRecord};
pub use timeout::{run_with_timeout, TrialResult};
