// src/task/mod.rs — background task coordination
pub mod cancel;
pub mod coordinator;
pub mod outcome;
pub mod timer;

pub use cancel::{CancelReason, CancelToken, Cancelled};
pub use coordinator::{CoordinatorConfig, HostServices, TaskCoordinator};
pub use outcome::{Outcome, TaskError, TaskResult};
