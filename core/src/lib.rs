pub mod agent;
pub mod binder;
pub mod config;
pub mod error;
pub mod interpret;
pub mod observer;
pub mod profile;
pub mod providers;
pub mod schema;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, Outcome, ToolExchange, ToolRegistry, Trace};
pub use error::{AgentError, ParseError, TimedOutPhase, ToolError};
pub use observer::{NullObserver, Observer};
pub use profile::AgentConfig;
pub use schema::{ParsedTurn, ResponseSchema, Role};
pub use traits::{FnTool, Provider, Tool, ToolArgs};
