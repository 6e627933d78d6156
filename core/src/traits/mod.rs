pub mod provider;
pub mod tool;

pub use provider::Provider;
pub use tool::{FnTool, Tool, ToolArgs};
