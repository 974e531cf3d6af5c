//! Domain model for task lifecycle management.
//!
//! Tasks are handed out by a manager to an employee of the same
//! organization. Status only moves forward: `new` to `accepted`, and either
//! of those to the terminal `completed` or `rejected`.

mod error;
mod ids;
mod policy;
mod task;

pub use error::{ParseOrphanPolicyError, ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use policy::OrphanPolicy;
pub use task::{NewTask, PersistedTaskData, Task, TaskDescription, TaskStatus, TaskTitle};
