pub mod model;

pub use model::{NewTask, Priority, Task, TaskPatch, TaskStatus};
