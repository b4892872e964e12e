mod handler;
mod registry;
pub mod validation;

pub use handler::{FnHandler, ToolHandler, TypedHandler};
pub use registry::{RegisteredTool, ToolRegistry};
