pub mod compiler;
pub mod loop_;
pub mod registry;
pub mod state;

pub use loop_::AgentLoop;
pub use registry::ToolRegistry;
pub use state::{Outcome, ToolExchange, Trace};
