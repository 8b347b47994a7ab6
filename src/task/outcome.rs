use thiserror::Error;

/// Lifecycle of a single invocation. `Pending` moves to exactly one terminal label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Succeeded,
    Failed,
    TimedOut,
    CancelledByUser,
}

impl Outcome {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed-out",
            Self::CancelledByUser => "cancelled-by-user",
        }
    }
}

/// What a completion callback receives on the failure side.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The operation returned an error or panicked. `message` is empty when
    /// nothing useful could be recovered from a panic payload.
    #[error("task failed: {message}")]
    Failed { message: String },
    #[error("task timed out")]
    TimedOut,
    #[error("task cancelled")]
    Cancelled,
}

impl TaskError {
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Failed { .. } => Outcome::Failed,
            Self::TimedOut => Outcome::TimedOut,
            Self::Cancelled => Outcome::CancelledByUser,
        }
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
