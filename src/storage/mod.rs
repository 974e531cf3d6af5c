//! Store adapters implementing the directory and task ports.
//!
//! Organization deletion and full resets cascade from users and
//! organizations into task rows, so a single store backs both ports and
//! commits each cascade in one transaction.

pub mod memory;
pub mod postgres;

use crate::directory::ports::DirectoryRepository;
use crate::task::ports::TaskRepository;

/// Store backing both the directory and the task ports.
pub trait Store: DirectoryRepository + TaskRepository {}

impl<T> Store for T where T: DirectoryRepository + TaskRepository {}

#[cfg(test)]
mod tests;
