//! Wire and storage types for users and tasks

pub mod task;
pub mod user;

pub use task::{CreateTask, Task, TaskChanges};
pub use user::{User, UserChanges, UserResponse};
