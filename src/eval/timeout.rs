use std::future::Future;
use std::time::Duration;

/// Outcome of one question-answering unit under the harness wall-clock
/// budget. Expiry is terminal, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialResult<T> {
    Completed(T),
    TimedOut,
}

impl<T> TrialResult<T> {
    pub fn timed_out(&self) -> bool {
        matches!(self, TrialResult::TimedOut)
    }

    pub fn into_completed(self) -> Option<T> {
        match self {
            TrialResult::Completed(value) => Some(value),
            TrialResult::TimedOut => None,
        }
    }
}

pub async fn run_with_timeout<F, T>(budget: Duration, fut: F) -> TrialResult<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(value) => TrialResult::Completed(value),
        Err(_) => TrialResult::TimedOut,
    }
}
