// Infrastructure module - Background tasks, backoff timing, and callback fan-out
pub mod handlers;
pub mod task_manager;
pub mod timer;

pub use handlers::{HandlerRegistry, Subscription};
pub use task_manager::{TaskKind, TaskManager};
pub use timer::{Backoff, Timer};
