//! Application services for tasks.

mod catalog;
mod dispatch;
mod payload;

pub use catalog::{TaskRequest, TaskService, TaskServiceError, TaskServiceResult};
pub use dispatch::{
    TaskDispatchCoordinator, TaskDispatchError, TaskDispatchFailure, TaskDispatchReport,
    TaskFailureReason, TaskInvocation,
};
pub use payload::render_payload;
