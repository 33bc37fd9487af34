//! Data models for planner entities.
//!
//! - `Task`, `Frequency`: a scheduled task and its recurrence
//! - `TaskRecord`: the backend's task JSON, converted into `Task`
//! - `TaskDraft`: a task the backend proposed from free text
//! - `Category`: read-only task categories

pub mod category;
pub mod task;

pub use category::{category_name, Category};
pub use task::{
    parse_category_ref, parse_date, parse_time, Frequency, Task, TaskDraft, TaskRecord, UNKNOWN_CATEGORY_ID,
};
