//! Data models for Toolroom

pub mod assignment;
pub mod project;
pub mod stats;
pub mod tool;
pub mod worker;

// Re-export commonly used types
pub use assignment::{
    AssignedTool, Assignment, AssignmentDetails, AssignmentStatus, AssignmentTool, ToolCondition,
};
pub use project::Project;
pub use tool::{Tool, ToolStatus};
pub use worker::Worker;
