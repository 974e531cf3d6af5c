//! Application services for task lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    CreateTaskRequest, StatusUpdate, TERMINAL_LISTING_LIMIT, TaskLifecycleError,
    TaskLifecycleResult, TaskLifecycleService,
};
