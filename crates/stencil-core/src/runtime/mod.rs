//! External tool detection

pub mod tool;

pub use tool::{git_tool, ToolConfig, ToolProbe};
