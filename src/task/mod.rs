//! Task wrappers around external command-line tools.
//! A task is configured through typed setters, renders its command line,
//! and runs the tool to completion, yielding a `TaskResult`.
pub mod apply_transforms;
pub mod result;

pub use apply_transforms::{ApplyTransforms, TOOL_NAME};
pub use result::TaskResult;
